// Components - typed, validated annotation records owned by one timeline
//
// Each component kind is a plain struct with compile-time fields. The
// ComponentFields trait wires per-field validation, the ordering key and
// time extent for each kind; ComponentData is the closed sum over all kinds
// and is what a ComponentManager stores.

pub mod beat;
pub mod harmony;
pub mod hierarchy;
pub mod manager;
pub mod marker;
pub mod note;
pub mod pdf;
pub mod value;

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{ComponentError, ComponentResult};

pub use beat::Beat;
pub use harmony::{Harmony, Mode};
pub use hierarchy::Hierarchy;
pub use manager::ComponentManager;
pub use marker::Marker;
pub use note::Note;
pub use pdf::PdfMarker;
pub use value::{Field, FieldValue};

/// Unique identifier for components, assigned by an IdProvider
pub type ComponentId = u64;

/// Closed set of component kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Marker,
    Hierarchy,
    Beat,
    Harmony,
    Mode,
    PdfMarker,
    Note,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Marker => "marker",
            ComponentKind::Hierarchy => "hierarchy",
            ComponentKind::Beat => "beat",
            ComponentKind::Harmony => "harmony",
            ComponentKind::Mode => "mode",
            ComponentKind::PdfMarker => "pdf_marker",
            ComponentKind::Note => "note",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a component sits in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// Point-like component anchored at a single time
    Point(f64),
    /// Segment-like component spanning `[start, end]`
    Span { start: f64, end: f64 },
}

impl Extent {
    pub fn start(&self) -> f64 {
        match self {
            Extent::Point(t) => *t,
            Extent::Span { start, .. } => *start,
        }
    }
}

/// Ordering key: a tuple of numeric field values compared lexicographically
///
/// Comparison uses `f64::total_cmp`, so the order is total even for values
/// that compare unequal under `PartialOrd`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingKey(pub Vec<f64>);

impl Eq for OrderingKey {}

impl PartialOrd for OrderingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

/// Per-kind field table and validation
pub trait ComponentFields {
    const KIND: ComponentKind;

    /// Fields that round-trip through serialization
    const FIELDS: &'static [Field];

    /// Fields forming the ordering key, in comparison order
    const ORDERING: &'static [Field];

    /// Current value of a declared field, `None` for undeclared ones
    fn get(&self, field: Field) -> Option<FieldValue>;

    /// Validate `value` for `field` and write it; no write on failure
    fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()>;

    /// Validate every current field value, used before creation
    fn check(&self) -> ComponentResult<()>;

    fn extent(&self) -> Extent;

    /// Multiply every time field by `factor`
    fn scale(&mut self, factor: f64);

    /// Move the end of a segment-like component back to `end`
    fn truncate(&mut self, _end: f64) {}
}

/// Data of one component, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentData {
    Marker(Marker),
    Hierarchy(Hierarchy),
    Beat(Beat),
    Harmony(Harmony),
    Mode(Mode),
    PdfMarker(PdfMarker),
    Note(Note),
}

macro_rules! dispatch {
    ($data:expr, $inner:ident => $body:expr) => {
        match $data {
            ComponentData::Marker($inner) => $body,
            ComponentData::Hierarchy($inner) => $body,
            ComponentData::Beat($inner) => $body,
            ComponentData::Harmony($inner) => $body,
            ComponentData::Mode($inner) => $body,
            ComponentData::PdfMarker($inner) => $body,
            ComponentData::Note($inner) => $body,
        }
    };
}

fn fields_of<T: ComponentFields>(_: &T) -> &'static [Field] {
    T::FIELDS
}

fn ordering_of<T: ComponentFields>(_: &T) -> &'static [Field] {
    T::ORDERING
}

fn kind_of<T: ComponentFields>(_: &T) -> ComponentKind {
    T::KIND
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        dispatch!(self, c => kind_of(c))
    }

    pub fn fields(&self) -> &'static [Field] {
        dispatch!(self, c => fields_of(c))
    }

    pub fn ordering_fields(&self) -> &'static [Field] {
        dispatch!(self, c => ordering_of(c))
    }

    pub fn get(&self, field: Field) -> Option<FieldValue> {
        dispatch!(self, c => c.get(field))
    }

    pub fn set(&mut self, field: Field, value: &FieldValue) -> ComponentResult<()> {
        let kind = self.kind();
        if !self.fields().contains(&field) {
            return Err(ComponentError::NoSuchAttribute { kind, field });
        }
        dispatch!(self, c => c.set(field, value))
    }

    pub fn check(&self) -> ComponentResult<()> {
        dispatch!(self, c => c.check())
    }

    pub fn extent(&self) -> Extent {
        dispatch!(self, c => c.extent())
    }

    pub fn scale(&mut self, factor: f64) {
        dispatch!(self, c => c.scale(factor))
    }

    pub fn truncate(&mut self, end: f64) {
        dispatch!(self, c => c.truncate(end))
    }

    pub fn ordering_key(&self) -> OrderingKey {
        OrderingKey(
            self.ordering_fields()
                .iter()
                .filter_map(|f| self.get(*f).and_then(|v| v.as_f64()))
                .collect(),
        )
    }

    /// Every time-valued field currently set
    pub fn times(&self) -> Vec<(Field, f64)> {
        self.fields()
            .iter()
            .filter(|f| f.is_time())
            .filter_map(|f| self.get(*f).and_then(|v| v.as_f64()).map(|t| (*f, t)))
            .collect()
    }
}

/// A component: an id plus its kind-specific data
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: ComponentId,
    data: ComponentData,
}

impl Component {
    pub(crate) fn new(id: ComponentId, data: ComponentData) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    /// Read one attribute
    pub fn get_data(&self, field: Field) -> ComponentResult<FieldValue> {
        self.data
            .get(field)
            .ok_or(ComponentError::NoSuchAttribute {
                kind: self.kind(),
                field,
            })
    }

    /// Validate and set one attribute on this component alone
    ///
    /// Returns the new value. Cross-component rules (duplicate times,
    /// level bounds) and reordering are the manager's job, see
    /// `ComponentManager::set_component_data`.
    pub(crate) fn set_data(&mut self, field: Field, value: FieldValue) -> ComponentResult<FieldValue> {
        self.data.set(field, &value)?;
        Ok(value)
    }

    pub fn ordering_key(&self) -> OrderingKey {
        self.data.ordering_key()
    }

    pub fn extent(&self) -> Extent {
        self.data.extent()
    }

    /// Start time for spans, time for points
    pub fn time(&self) -> f64 {
        self.data.extent().start()
    }

    /// Serialized form: declared fields, kind tag and content hash
    pub fn serialize(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(&self.data)?;
        let hash = content_hash(&value);
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("hash".to_string(), serde_json::Value::String(hash));
        }
        Ok(value)
    }
}

/// Hex XxHash64 of the canonical JSON form, used for change detection
pub fn content_hash(value: &serde_json::Value) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(value.to_string().as_bytes());
    format!("{:016x}", hasher.finish())
}
