// Note - a pitched segment on a score timeline

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

const STEP_RANGE: (i64, i64) = (0, 6);
const ACCIDENTAL_RANGE: (i64, i64) = (-2, 2);
const OCTAVE_RANGE: (i64, i64) = (0, 9);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub start: f64,
    /// May equal `start` for grace notes
    pub end: f64,
    pub step: i64,
    #[serde(default)]
    pub accidental: i64,
    pub octave: i64,
    #[serde(default)]
    pub staff_index: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub comment: String,
}

impl Note {
    pub fn new(start: f64, end: f64, step: i64, octave: i64) -> Self {
        Self {
            start,
            end,
            step,
            accidental: 0,
            octave,
            staff_index: 0,
            color: None,
            comment: String::new(),
        }
    }

    /// MIDI-style pitch number, C4 = 60
    pub fn pitch(&self) -> i64 {
        const STEP_SEMITONES: [i64; 7] = [0, 2, 4, 5, 7, 9, 11];
        let step = self.step.clamp(STEP_RANGE.0, STEP_RANGE.1) as usize;
        12 * (self.octave + 1) + STEP_SEMITONES[step] + self.accidental
    }
}

fn check_span(start: f64, end: f64) -> ComponentResult<()> {
    if end < start {
        return Err(ComponentError::invalid(
            Field::End,
            format!("end {} is before start {}", end, start),
        ));
    }
    Ok(())
}

impl ComponentFields for Note {
    const KIND: ComponentKind = ComponentKind::Note;
    const FIELDS: &'static [Field] = &[
        Field::Start,
        Field::End,
        Field::Step,
        Field::Accidental,
        Field::Octave,
        Field::StaffIndex,
        Field::Color,
        Field::Comment,
    ];
    const ORDERING: &'static [Field] = &[Field::Start];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Start => Some(FieldValue::Float(self.start)),
            Field::End => Some(FieldValue::Float(self.end)),
            Field::Step => Some(FieldValue::Int(self.step)),
            Field::Accidental => Some(FieldValue::Int(self.accidental)),
            Field::Octave => Some(FieldValue::Int(self.octave)),
            Field::StaffIndex => Some(FieldValue::Int(self.staff_index)),
            Field::Color => Some(FieldValue::Color(self.color.clone())),
            Field::Comment => Some(FieldValue::Text(self.comment.clone())),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Start => {
                let start = validate::time(field, value)?;
                check_span(start, self.end)?;
                self.start = start;
            }
            Field::End => {
                let end = validate::time(field, value)?;
                check_span(self.start, end)?;
                self.end = end;
            }
            Field::Step => {
                self.step = validate::int_in_range(field, value, STEP_RANGE.0, STEP_RANGE.1)?
            }
            Field::Accidental => {
                self.accidental = validate::int_in_range(
                    field,
                    value,
                    ACCIDENTAL_RANGE.0,
                    ACCIDENTAL_RANGE.1,
                )?
            }
            Field::Octave => {
                self.octave =
                    validate::int_in_range(field, value, OCTAVE_RANGE.0, OCTAVE_RANGE.1)?
            }
            Field::StaffIndex => {
                self.staff_index = validate::int_in_range(field, value, 0, i64::MAX)?
            }
            Field::Color => self.color = validate::color(field, value)?,
            Field::Comment => self.comment = validate::text(field, value)?,
            _ => {
                return Err(ComponentError::NoSuchAttribute {
                    kind: Self::KIND,
                    field,
                });
            }
        }
        Ok(())
    }

    fn check(&self) -> ComponentResult<()> {
        validate::time_value(self.start)?;
        validate::time_value(self.end)?;
        check_span(self.start, self.end)?;
        validate::int_value_in_range(Field::Step, self.step, STEP_RANGE.0, STEP_RANGE.1)?;
        validate::int_value_in_range(
            Field::Accidental,
            self.accidental,
            ACCIDENTAL_RANGE.0,
            ACCIDENTAL_RANGE.1,
        )?;
        validate::int_value_in_range(Field::Octave, self.octave, OCTAVE_RANGE.0, OCTAVE_RANGE.1)?;
        validate::int_value_in_range(Field::StaffIndex, self.staff_index, 0, i64::MAX)?;
        if let Some(color) = &self.color {
            validate::color_value(Field::Color, color)?;
        }
        Ok(())
    }

    fn extent(&self) -> Extent {
        Extent::Span {
            start: self.start,
            end: self.end,
        }
    }

    fn scale(&mut self, factor: f64) {
        self.start *= factor;
        self.end *= factor;
    }

    fn truncate(&mut self, end: f64) {
        if end >= self.start && end < self.end {
            self.end = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_pitch() {
        // C4
        assert_eq!(Note::new(0.0, 1.0, 0, 4).pitch(), 60);
        // A4
        assert_eq!(Note::new(0.0, 1.0, 5, 4).pitch(), 69);
        let mut note = Note::new(0.0, 1.0, 3, 4);
        note.accidental = 1;
        // F#4
        assert_eq!(note.pitch(), 66);
    }

    #[test]
    fn test_note_allows_zero_length() {
        assert!(Note::new(2.0, 2.0, 0, 4).check().is_ok());
        assert!(Note::new(2.0, 1.0, 0, 4).check().is_err());
    }
}
