// Harmony and Mode - roman-numeral or chord-symbol analysis at a point in time

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

/// Chord qualities accepted by `Harmony::quality`
pub const QUALITIES: &[&str] = &[
    "major",
    "minor",
    "augmented",
    "diminished",
    "dominant-seventh",
    "major-seventh",
    "minor-seventh",
    "half-diminished",
    "diminished-seventh",
    "suspended-fourth",
    "suspended-second",
    "power",
];

pub const DISPLAY_MODES: &[&str] = &["roman", "chord"];

pub const MODE_TYPES: &[&str] = &["major", "minor"];

/// Scale degree, 0 = C ... 6 = B
const STEP_RANGE: (i64, i64) = (0, 6);
/// Flats are negative, sharps positive
const ACCIDENTAL_RANGE: (i64, i64) = (-2, 2);
const INVERSION_RANGE: (i64, i64) = (0, 3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harmony {
    pub time: f64,
    pub step: i64,
    #[serde(default)]
    pub accidental: i64,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default)]
    pub inversion: i64,
    /// Degree of a secondary function, e.g. V/V
    #[serde(default)]
    pub applied_to: i64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_display_mode")]
    pub display_mode: String,
    #[serde(default)]
    pub custom_text: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_quality() -> String {
    "major".to_string()
}

fn default_level() -> u32 {
    1
}

fn default_display_mode() -> String {
    "roman".to_string()
}

fn default_mode_type() -> String {
    "major".to_string()
}

impl Harmony {
    pub fn new(time: f64, step: i64, quality: impl Into<String>) -> Self {
        Self {
            time,
            step,
            accidental: 0,
            quality: quality.into(),
            inversion: 0,
            applied_to: 0,
            level: default_level(),
            display_mode: default_display_mode(),
            custom_text: String::new(),
            comment: String::new(),
            color: None,
        }
    }
}

impl ComponentFields for Harmony {
    const KIND: ComponentKind = ComponentKind::Harmony;
    const FIELDS: &'static [Field] = &[
        Field::Time,
        Field::Step,
        Field::Accidental,
        Field::Quality,
        Field::Inversion,
        Field::AppliedTo,
        Field::Level,
        Field::DisplayMode,
        Field::CustomText,
        Field::Comment,
        Field::Color,
    ];
    const ORDERING: &'static [Field] = &[Field::Level, Field::Time];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Time => Some(FieldValue::Float(self.time)),
            Field::Step => Some(FieldValue::Int(self.step)),
            Field::Accidental => Some(FieldValue::Int(self.accidental)),
            Field::Quality => Some(FieldValue::Text(self.quality.clone())),
            Field::Inversion => Some(FieldValue::Int(self.inversion)),
            Field::AppliedTo => Some(FieldValue::Int(self.applied_to)),
            Field::Level => Some(FieldValue::Int(self.level as i64)),
            Field::DisplayMode => Some(FieldValue::Text(self.display_mode.clone())),
            Field::CustomText => Some(FieldValue::Text(self.custom_text.clone())),
            Field::Comment => Some(FieldValue::Text(self.comment.clone())),
            Field::Color => Some(FieldValue::Color(self.color.clone())),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Time => self.time = validate::time(field, value)?,
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
            Field::Quality => self.quality = validate::choice(field, value, QUALITIES)?,
            Field::Inversion => {
                self.inversion =
                    validate::int_in_range(field, value, INVERSION_RANGE.0, INVERSION_RANGE.1)?
            }
            Field::AppliedTo => {
                self.applied_to =
                    validate::int_in_range(field, value, STEP_RANGE.0, STEP_RANGE.1)?
            }
            Field::Level => {
                self.level = validate::int_in_range(field, value, 1, u32::MAX as i64)? as u32
            }
            Field::DisplayMode => {
                self.display_mode = validate::choice(field, value, DISPLAY_MODES)?
            }
            Field::CustomText => self.custom_text = validate::text(field, value)?,
            Field::Comment => self.comment = validate::text(field, value)?,
            Field::Color => self.color = validate::color(field, value)?,
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
        validate::time_value(self.time)?;
        validate::int_value_in_range(Field::Step, self.step, STEP_RANGE.0, STEP_RANGE.1)?;
        validate::int_value_in_range(
            Field::Accidental,
            self.accidental,
            ACCIDENTAL_RANGE.0,
            ACCIDENTAL_RANGE.1,
        )?;
        validate::choice_value(Field::Quality, &self.quality, QUALITIES)?;
        validate::int_value_in_range(
            Field::Inversion,
            self.inversion,
            INVERSION_RANGE.0,
            INVERSION_RANGE.1,
        )?;
        validate::int_value_in_range(Field::AppliedTo, self.applied_to, STEP_RANGE.0, STEP_RANGE.1)?;
        if self.level < 1 {
            return Err(ComponentError::invalid(Field::Level, "level must be at least 1"));
        }
        validate::choice_value(Field::DisplayMode, &self.display_mode, DISPLAY_MODES)?;
        if let Some(color) = &self.color {
            validate::color_value(Field::Color, color)?;
        }
        Ok(())
    }

    fn extent(&self) -> Extent {
        Extent::Point(self.time)
    }

    fn scale(&mut self, factor: f64) {
        self.time *= factor;
    }
}

/// Key/mode change; shares the harmony timeline with Harmony components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    pub time: f64,
    pub step: i64,
    #[serde(default)]
    pub accidental: i64,
    #[serde(default = "default_mode_type")]
    pub mode_type: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub comment: String,
}

impl Mode {
    pub fn new(time: f64, step: i64, mode_type: impl Into<String>) -> Self {
        Self {
            time,
            step,
            accidental: 0,
            mode_type: mode_type.into(),
            level: default_level(),
            comment: String::new(),
        }
    }
}

impl ComponentFields for Mode {
    const KIND: ComponentKind = ComponentKind::Mode;
    const FIELDS: &'static [Field] = &[
        Field::Time,
        Field::Step,
        Field::Accidental,
        Field::ModeType,
        Field::Level,
        Field::Comment,
    ];
    const ORDERING: &'static [Field] = &[Field::Level, Field::Time];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Time => Some(FieldValue::Float(self.time)),
            Field::Step => Some(FieldValue::Int(self.step)),
            Field::Accidental => Some(FieldValue::Int(self.accidental)),
            Field::ModeType => Some(FieldValue::Text(self.mode_type.clone())),
            Field::Level => Some(FieldValue::Int(self.level as i64)),
            Field::Comment => Some(FieldValue::Text(self.comment.clone())),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Time => self.time = validate::time(field, value)?,
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
            Field::ModeType => self.mode_type = validate::choice(field, value, MODE_TYPES)?,
            Field::Level => {
                self.level = validate::int_in_range(field, value, 1, u32::MAX as i64)? as u32
            }
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
        validate::time_value(self.time)?;
        validate::int_value_in_range(Field::Step, self.step, STEP_RANGE.0, STEP_RANGE.1)?;
        validate::int_value_in_range(
            Field::Accidental,
            self.accidental,
            ACCIDENTAL_RANGE.0,
            ACCIDENTAL_RANGE.1,
        )?;
        validate::choice_value(Field::ModeType, &self.mode_type, MODE_TYPES)?;
        if self.level < 1 {
            return Err(ComponentError::invalid(Field::Level, "level must be at least 1"));
        }
        Ok(())
    }

    fn extent(&self) -> Extent {
        Extent::Point(self.time)
    }

    fn scale(&mut self, factor: f64) {
        self.time *= factor;
    }
}
