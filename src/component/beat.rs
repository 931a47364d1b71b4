// Beat - one musical pulse on a beat timeline
// Measure membership is not stored on the beat; it is derived by the beat
// timeline from the position of the beat in the sorted sequence.

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Time in seconds
    pub time: f64,
}

impl Beat {
    pub fn new(time: f64) -> Self {
        Self { time }
    }
}

impl ComponentFields for Beat {
    const KIND: ComponentKind = ComponentKind::Beat;
    const FIELDS: &'static [Field] = &[Field::Time];
    const ORDERING: &'static [Field] = &[Field::Time];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Time => Some(FieldValue::Float(self.time)),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Time => self.time = validate::time(field, value)?,
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
        validate::time_value(self.time).map(|_| ())
    }

    fn extent(&self) -> Extent {
        Extent::Point(self.time)
    }

    fn scale(&mut self, factor: f64) {
        self.time *= factor;
    }
}
