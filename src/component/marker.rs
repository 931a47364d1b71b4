// Marker - a labelled point in time

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

/// A point-like annotation with a label and free-form comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Time in seconds
    pub time: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
    /// Optional `#rrggbb` override of the timeline color
    #[serde(default)]
    pub color: Option<String>,
}

impl Marker {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            label: String::new(),
            comment: String::new(),
            color: None,
        }
    }

    pub fn with_label(time: f64, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::new(time)
        }
    }
}

impl ComponentFields for Marker {
    const KIND: ComponentKind = ComponentKind::Marker;
    const FIELDS: &'static [Field] = &[Field::Time, Field::Label, Field::Comment, Field::Color];
    const ORDERING: &'static [Field] = &[Field::Time];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Time => Some(FieldValue::Float(self.time)),
            Field::Label => Some(FieldValue::Text(self.label.clone())),
            Field::Comment => Some(FieldValue::Text(self.comment.clone())),
            Field::Color => Some(FieldValue::Color(self.color.clone())),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Time => self.time = validate::time(field, value)?,
            Field::Label => self.label = validate::text(field, value)?,
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
