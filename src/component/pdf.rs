// PdfMarker - turns a score PDF to a given page at a point in time

use serde::{Deserialize, Serialize};

use crate::component::value::validate;
use crate::component::{ComponentFields, ComponentKind, Extent, Field, FieldValue};
use crate::error::{ComponentError, ComponentResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfMarker {
    pub time: f64,
    /// 1-based page number; the upper bound is the timeline's page total
    pub page_number: u32,
}

impl PdfMarker {
    pub fn new(time: f64, page_number: u32) -> Self {
        Self { time, page_number }
    }
}

impl ComponentFields for PdfMarker {
    const KIND: ComponentKind = ComponentKind::PdfMarker;
    const FIELDS: &'static [Field] = &[Field::Time, Field::PageNumber];
    const ORDERING: &'static [Field] = &[Field::Time];

    fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Time => Some(FieldValue::Float(self.time)),
            Field::PageNumber => Some(FieldValue::Int(self.page_number as i64)),
            _ => None,
        }
    }

    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        match field {
            Field::Time => self.time = validate::time(field, value)?,
            Field::PageNumber => {
                self.page_number = validate::int_in_range(field, value, 1, u32::MAX as i64)? as u32
            }
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
        if self.page_number < 1 {
            return Err(ComponentError::invalid(
                Field::PageNumber,
                "page numbers start at 1",
            ));
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
