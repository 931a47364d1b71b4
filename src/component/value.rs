// Field names, field values and the validators shared by component kinds

use std::fmt;

use crate::component::ComponentId;
use crate::error::{ComponentError, ComponentResult};

/// Attribute names across all component kinds
///
/// Each kind accepts the subset listed in its `FIELDS` table; any other field
/// is reported as `NoSuchAttribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Time,
    Start,
    End,
    Level,
    Label,
    Comment,
    Color,
    Parent,
    Children,
    PageNumber,
    Step,
    Accidental,
    Quality,
    Inversion,
    AppliedTo,
    DisplayMode,
    CustomText,
    ModeType,
    Octave,
    StaffIndex,
}

impl Field {
    /// Name used in serialized state
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Time => "time",
            Field::Start => "start",
            Field::End => "end",
            Field::Level => "level",
            Field::Label => "label",
            Field::Comment => "comment",
            Field::Color => "color",
            Field::Parent => "parent",
            Field::Children => "children",
            Field::PageNumber => "page_number",
            Field::Step => "step",
            Field::Accidental => "accidental",
            Field::Quality => "quality",
            Field::Inversion => "inversion",
            Field::AppliedTo => "applied_to",
            Field::DisplayMode => "display_mode",
            Field::CustomText => "custom_text",
            Field::ModeType => "mode_type",
            Field::Octave => "octave",
            Field::StaffIndex => "staff_index",
        }
    }

    /// Whether the field holds an absolute time in seconds
    pub fn is_time(&self) -> bool {
        matches!(self, Field::Time | Field::Start | Field::End)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Text(String),
    Color(Option<String>),
    Id(Option<ComponentId>),
    Ids(Vec<ComponentId>),
}

impl FieldValue {
    /// Numeric view of the value, used for ordering keys
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{:?}", v),
            FieldValue::Color(Some(c)) => write!(f, "{}", c),
            FieldValue::Color(None) => write!(f, "none"),
            FieldValue::Id(Some(id)) => write!(f, "#{}", id),
            FieldValue::Id(None) => write!(f, "none"),
            FieldValue::Ids(ids) => write!(f, "{:?}", ids),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// Field validators
///
/// Each returns the typed value on success, so a setter can validate and
/// convert in one step and only write once everything has passed.
pub mod validate {
    use super::*;

    pub fn float(field: Field, value: &FieldValue) -> ComponentResult<f64> {
        match value {
            FieldValue::Float(v) if v.is_finite() => Ok(*v),
            FieldValue::Int(v) => Ok(*v as f64),
            FieldValue::Float(v) => Err(ComponentError::invalid(
                field,
                format!("{} is not a finite number", v),
            )),
            other => Err(ComponentError::invalid(
                field,
                format!("expected a number, got {}", other),
            )),
        }
    }

    /// Absolute time in seconds; the upper bound is checked by the manager
    /// against the current media duration
    pub fn time(field: Field, value: &FieldValue) -> ComponentResult<f64> {
        let time = float(field, value)?;
        time_value(time)
    }

    pub fn time_value(time: f64) -> ComponentResult<f64> {
        if !time.is_finite() {
            return Err(ComponentError::InvalidValue {
                field: Field::Time,
                reason: format!("{} is not a finite time", time),
            });
        }
        if time < 0.0 {
            return Err(ComponentError::NegativeTime(time));
        }
        Ok(time)
    }

    pub fn int(field: Field, value: &FieldValue) -> ComponentResult<i64> {
        match value {
            FieldValue::Int(v) => Ok(*v),
            FieldValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
            other => Err(ComponentError::invalid(
                field,
                format!("expected an integer, got {}", other),
            )),
        }
    }

    pub fn int_in_range(
        field: Field,
        value: &FieldValue,
        min: i64,
        max: i64,
    ) -> ComponentResult<i64> {
        let v = int(field, value)?;
        int_value_in_range(field, v, min, max)
    }

    pub fn int_value_in_range(field: Field, v: i64, min: i64, max: i64) -> ComponentResult<i64> {
        if v < min || v > max {
            return Err(ComponentError::invalid(
                field,
                format!("{} is not between {} and {}", v, min, max),
            ));
        }
        Ok(v)
    }

    pub fn text(field: Field, value: &FieldValue) -> ComponentResult<String> {
        match value {
            FieldValue::Text(v) => Ok(v.clone()),
            other => Err(ComponentError::invalid(
                field,
                format!("expected text, got {}", other),
            )),
        }
    }

    /// Text restricted to a closed list of options
    pub fn choice(field: Field, value: &FieldValue, options: &[&str]) -> ComponentResult<String> {
        let v = text(field, value)?;
        choice_value(field, &v, options)?;
        Ok(v)
    }

    pub fn choice_value(field: Field, v: &str, options: &[&str]) -> ComponentResult<()> {
        if options.contains(&v) {
            Ok(())
        } else {
            Err(ComponentError::invalid(
                field,
                format!("'{}' is not one of {:?}", v, options),
            ))
        }
    }

    /// Optional `#rrggbb` color
    pub fn color(field: Field, value: &FieldValue) -> ComponentResult<Option<String>> {
        let color = match value {
            FieldValue::Color(c) => c.clone(),
            FieldValue::Text(t) if t.is_empty() => None,
            FieldValue::Text(t) => Some(t.clone()),
            other => {
                return Err(ComponentError::invalid(
                    field,
                    format!("expected a color, got {}", other),
                ));
            }
        };
        if let Some(c) = &color {
            color_value(field, c)?;
        }
        Ok(color)
    }

    pub fn color_value(field: Field, c: &str) -> ComponentResult<()> {
        let is_hex = c.len() == 7
            && c.starts_with('#')
            && c[1..].chars().all(|ch| ch.is_ascii_hexdigit());
        if is_hex {
            Ok(())
        } else {
            Err(ComponentError::invalid(
                field,
                format!("'{}' is not a #rrggbb color", c),
            ))
        }
    }

    pub fn id(field: Field, value: &FieldValue) -> ComponentResult<Option<ComponentId>> {
        match value {
            FieldValue::Id(id) => Ok(*id),
            other => Err(ComponentError::invalid(
                field,
                format!("expected a component id, got {}", other),
            )),
        }
    }

    pub fn ids(field: Field, value: &FieldValue) -> ComponentResult<Vec<ComponentId>> {
        match value {
            FieldValue::Ids(ids) => Ok(ids.clone()),
            other => Err(ComponentError::invalid(
                field,
                format!("expected a list of component ids, got {}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate;
    use super::*;

    #[test]
    fn test_time_validator() {
        assert_eq!(validate::time(Field::Time, &FieldValue::Float(1.5)), Ok(1.5));
        assert_eq!(validate::time(Field::Time, &FieldValue::Int(2)), Ok(2.0));
        assert_eq!(
            validate::time(Field::Time, &FieldValue::Float(-1.0)),
            Err(ComponentError::NegativeTime(-1.0))
        );
        assert!(validate::time(Field::Time, &FieldValue::Float(f64::NAN)).is_err());
        assert!(validate::time(Field::Time, &FieldValue::Text("1".into())).is_err());
    }

    #[test]
    fn test_color_validator() {
        assert_eq!(
            validate::color(Field::Color, &FieldValue::Text("#ff00aa".into())),
            Ok(Some("#ff00aa".to_string()))
        );
        assert_eq!(
            validate::color(Field::Color, &FieldValue::Text(String::new())),
            Ok(None)
        );
        assert!(validate::color(Field::Color, &FieldValue::Text("red".into())).is_err());
    }

    #[test]
    fn test_int_range_validator() {
        assert_eq!(
            validate::int_in_range(Field::Step, &FieldValue::Int(6), 0, 6),
            Ok(6)
        );
        assert!(validate::int_in_range(Field::Step, &FieldValue::Int(7), 0, 6).is_err());
        assert_eq!(
            validate::int_in_range(Field::Step, &FieldValue::Float(3.0), 0, 6),
            Ok(3)
        );
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::PageNumber.to_string(), "page_number");
        assert!(Field::Start.is_time());
        assert!(!Field::Level.is_time());
    }
}
