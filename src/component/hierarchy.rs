// Hierarchy - a labelled segment on one level of a nested analysis
//
// Hierarchies reference each other by id (parent and children). Those
// references are remapped when a component set is deserialized, since ids
// are reassigned on load.

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentId, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds, strictly after `start`
    pub end: f64,
    /// Nesting level, 1 is the lowest
    pub level: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent: Option<ComponentId>,
    #[serde(default)]
    pub children: Vec<ComponentId>,
}

impl Hierarchy {
    pub fn new(start: f64, end: f64, level: u32) -> Self {
        Self {
            start,
            end,
            level,
            label: String::new(),
            comment: String::new(),
            color: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_label(start: f64, end: f64, level: u32, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::new(start, end, level)
        }
    }

    pub fn contains_span(&self, start: f64, end: f64) -> bool {
        self.start <= start && end <= self.end
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && start < self.end
    }
}

fn check_span(start: f64, end: f64) -> ComponentResult<()> {
    if start >= end {
        return Err(ComponentError::invalid(
            Field::End,
            format!("end {} must be after start {}", end, start),
        ));
    }
    Ok(())
}

impl ComponentFields for Hierarchy {
    const KIND: ComponentKind = ComponentKind::Hierarchy;
    const FIELDS: &'static [Field] = &[
        Field::Start,
        Field::End,
        Field::Level,
        Field::Label,
        Field::Comment,
        Field::Color,
        Field::Parent,
        Field::Children,
    ];
    const ORDERING: &'static [Field] = &[Field::Level, Field::Start];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Start => Some(FieldValue::Float(self.start)),
            Field::End => Some(FieldValue::Float(self.end)),
            Field::Level => Some(FieldValue::Int(self.level as i64)),
            Field::Label => Some(FieldValue::Text(self.label.clone())),
            Field::Comment => Some(FieldValue::Text(self.comment.clone())),
            Field::Color => Some(FieldValue::Color(self.color.clone())),
            Field::Parent => Some(FieldValue::Id(self.parent)),
            Field::Children => Some(FieldValue::Ids(self.children.clone())),
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
            Field::Level => {
                self.level = validate::int_in_range(field, value, 1, u32::MAX as i64)? as u32;
            }
            Field::Label => self.label = validate::text(field, value)?,
            Field::Comment => self.comment = validate::text(field, value)?,
            Field::Color => self.color = validate::color(field, value)?,
            Field::Parent => self.parent = validate::id(field, value)?,
            Field::Children => self.children = validate::ids(field, value)?,
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
        if self.level < 1 {
            return Err(ComponentError::invalid(Field::Level, "level must be at least 1"));
        }
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
        if end > self.start && end < self.end {
            self.end = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_span_validation() {
        let mut h = Hierarchy::new(0.0, 4.0, 1);
        assert!(h.set(Field::End, &FieldValue::Float(0.0)).is_err());
        assert!(h.set(Field::Start, &FieldValue::Float(5.0)).is_err());
        assert_eq!((h.start, h.end), (0.0, 4.0));

        h.set(Field::End, &FieldValue::Float(6.0)).unwrap();
        assert_eq!(h.end, 6.0);
    }

    #[test]
    fn test_hierarchy_level_must_be_positive() {
        let mut h = Hierarchy::new(0.0, 1.0, 2);
        assert!(h.set(Field::Level, &FieldValue::Int(0)).is_err());
        assert_eq!(h.level, 2);
        assert!(Hierarchy::new(0.0, 1.0, 0).check().is_err());
    }

    #[test]
    fn test_hierarchy_truncate() {
        let mut h = Hierarchy::new(2.0, 8.0, 1);
        h.truncate(5.0);
        assert_eq!(h.end, 5.0);
        // A bound before the start would invert the span and is ignored
        h.truncate(1.0);
        assert_eq!(h.end, 5.0);
    }
}
