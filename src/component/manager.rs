// ComponentManager - owns the components of one timeline
//
// Components live in a map keyed by id (the backing set and O(1) index in
// one structure) plus an id list kept in canonical order. Both always hold
// exactly the same ids.

use std::collections::{BTreeMap, HashMap};

use crate::component::{
    Component, ComponentData, ComponentId, ComponentKind, Extent, Field, FieldValue,
};
use crate::error::{ComponentError, ComponentResult, LoadReport, TimelineError, TimelineResult};
use crate::services::Services;
use crate::timeline::TimelineKind;

/// Serialized component map: id -> field object with `kind` and `hash`
pub type SerializedComponents = BTreeMap<ComponentId, serde_json::Value>;

/// Cross-component rules checked on creation and on every mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationPolicy {
    /// Only bound-check times against the media duration
    BoundsOnly,
    /// No two components of the same kind at the same time
    UniqueTimePerKind,
    /// Unique times, and page numbers within the document's page total
    /// (0 means the total is not known yet)
    Pages { page_total: u32 },
    /// Unique times, and levels no higher than the timeline's level count
    Levels { level_count: u32 },
}

impl ValidationPolicy {
    pub fn for_timeline(kind: TimelineKind) -> Self {
        match kind {
            TimelineKind::Beat => ValidationPolicy::UniqueTimePerKind,
            TimelineKind::Harmony => ValidationPolicy::Levels { level_count: 1 },
            TimelineKind::Pdf => ValidationPolicy::Pages { page_total: 0 },
            TimelineKind::Marker
            | TimelineKind::Hierarchy
            | TimelineKind::Score
            | TimelineKind::Slider => ValidationPolicy::BoundsOnly,
        }
    }
}

pub struct ComponentManager {
    timeline_kind: TimelineKind,
    policy: ValidationPolicy,
    services: Services,
    components: HashMap<ComponentId, Component>,
    /// Ids sorted by (ordering key, id)
    order: Vec<ComponentId>,
}

impl ComponentManager {
    pub fn new(timeline_kind: TimelineKind, services: Services) -> Self {
        Self {
            timeline_kind,
            policy: ValidationPolicy::for_timeline(timeline_kind),
            services,
            components: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn timeline_kind(&self) -> TimelineKind {
        self.timeline_kind
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ValidationPolicy) {
        self.policy = policy;
    }

    pub fn permitted_kinds(&self) -> &'static [ComponentKind] {
        self.timeline_kind.component_kinds()
    }

    /// Validate and add a component, returning its fresh id
    ///
    /// Atomic: on any rejection nothing is added and the reason is returned.
    pub fn create_component(&mut self, data: ComponentData) -> ComponentResult<ComponentId> {
        let kind = data.kind();
        if !self.permitted_kinds().contains(&kind) {
            return Err(ComponentError::KindNotPermitted {
                component: kind,
                timeline: self.timeline_kind,
            });
        }
        data.check()?;
        self.validate(&data, None)?;

        let id = self.services.next_id();
        self.components.insert(id, Component::new(id, data));
        self.insert_ordered(id);
        log::debug!("Created {} {} in {} timeline", kind, id, self.timeline_kind);
        Ok(id)
    }

    /// Time bounds plus the cross-component policy
    fn validate(&self, data: &ComponentData, exclude: Option<ComponentId>) -> ComponentResult<()> {
        let duration = self.services.media_duration();
        for (_, time) in data.times() {
            if time < 0.0 {
                return Err(ComponentError::NegativeTime(time));
            }
            if time > duration {
                return Err(ComponentError::TimeExceedsDuration { time, duration });
            }
        }

        match self.policy {
            ValidationPolicy::BoundsOnly => Ok(()),
            ValidationPolicy::UniqueTimePerKind => self.check_unique_time(data, exclude),
            ValidationPolicy::Pages { page_total } => {
                if let ComponentData::PdfMarker(marker) = data
                    && page_total > 0
                    && marker.page_number > page_total
                {
                    return Err(ComponentError::invalid(
                        Field::PageNumber,
                        format!(
                            "page {} exceeds page total {}",
                            marker.page_number, page_total
                        ),
                    ));
                }
                self.check_unique_time(data, exclude)
            }
            ValidationPolicy::Levels { level_count } => {
                let level = match data {
                    ComponentData::Harmony(harmony) => Some(harmony.level),
                    ComponentData::Mode(mode) => Some(mode.level),
                    _ => None,
                };
                if let Some(level) = level
                    && level > level_count
                {
                    return Err(ComponentError::invalid(
                        Field::Level,
                        format!("level {} exceeds level count {}", level, level_count),
                    ));
                }
                self.check_unique_time(data, exclude)
            }
        }
    }

    fn check_unique_time(
        &self,
        data: &ComponentData,
        exclude: Option<ComponentId>,
    ) -> ComponentResult<()> {
        let kind = data.kind();
        let time = data.extent().start();
        let taken = self.components.values().any(|c| {
            Some(c.id()) != exclude && c.kind() == kind && c.time() == time
        });
        if taken {
            return Err(ComponentError::DuplicateTime { kind, time });
        }
        Ok(())
    }

    /// Lookup by id; absence is an ownership bug upstream
    pub fn get_component(&self, id: ComponentId) -> TimelineResult<&Component> {
        self.components
            .get(&id)
            .ok_or(TimelineError::ComponentNotFound(id))
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn get_components_by_attribute(
        &self,
        field: Field,
        value: &FieldValue,
        kind: ComponentKind,
    ) -> Vec<&Component> {
        self.get_components_by_condition(
            |c| c.data().get(field).as_ref() == Some(value),
            kind,
        )
    }

    pub fn get_components_by_condition<F>(&self, predicate: F, kind: ComponentKind) -> Vec<&Component>
    where
        F: Fn(&Component) -> bool,
    {
        self.iter()
            .filter(|c| c.kind() == kind && predicate(c))
            .collect()
    }

    /// Validate and apply one attribute change
    ///
    /// The change is tried on a copy first, so a rejection leaves the
    /// component untouched. Returns the new value.
    pub fn set_component_data(
        &mut self,
        id: ComponentId,
        field: Field,
        value: FieldValue,
    ) -> TimelineResult<FieldValue> {
        let component = self.get_component(id)?;
        let mut candidate = component.clone();
        let value = candidate.set_data(field, value)?;
        self.validate(candidate.data(), Some(id))?;

        let reorder = candidate.data().ordering_fields().contains(&field);
        self.components.insert(id, candidate);
        if reorder {
            self.reposition(id);
        }
        Ok(value)
    }

    /// Mutate a component without running validators
    ///
    /// For internal operations that preserve validity by construction
    /// (scaling, cropping, redistributing beats).
    pub(crate) fn update_in_place<F>(&mut self, id: ComponentId, f: F) -> TimelineResult<()>
    where
        F: FnOnce(&mut ComponentData),
    {
        let component = self
            .components
            .get_mut(&id)
            .ok_or(TimelineError::ComponentNotFound(id))?;
        f(component.data_mut());
        self.reposition(id);
        Ok(())
    }

    /// Remove a component; deleting an unknown id is an invariant violation
    pub fn delete_component(&mut self, id: ComponentId) -> TimelineResult<Component> {
        let component = self
            .components
            .remove(&id)
            .ok_or(TimelineError::ComponentNotFound(id))?;
        self.order.retain(|other| *other != id);
        log::debug!("Deleted {} {} from {} timeline", component.kind(), id, self.timeline_kind);
        Ok(component)
    }

    /// Delete every component, returning the removed ids in canonical order
    pub fn clear(&mut self) -> Vec<ComponentId> {
        let ids = std::mem::take(&mut self.order);
        self.components.clear();
        ids
    }

    /// Multiply every time field by `factor`; order is preserved for factor > 0
    pub fn scale(&mut self, factor: f64) {
        for component in self.components.values_mut() {
            component.data_mut().scale(factor);
        }
    }

    /// Components past `length` are deleted, spans straddling it truncated
    ///
    /// Returns the deleted components in canonical order.
    pub fn crop(&mut self, length: f64) -> Vec<Component> {
        let mut deleted = Vec::new();
        for id in self.order.clone() {
            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            match component.extent() {
                Extent::Point(time) if time > length => deleted.push(id),
                Extent::Span { start, .. } if start >= length => deleted.push(id),
                Extent::Span { end, .. } if end > length => component.data_mut().truncate(length),
                _ => {}
            }
        }
        self.order.retain(|id| !deleted.contains(id));
        deleted
            .iter()
            .filter_map(|id| self.components.remove(id))
            .collect()
    }

    /// Id -> serialized fields (plus kind tag and content hash)
    pub fn serialize_components(&self) -> serde_json::Result<SerializedComponents> {
        self.iter()
            .map(|c| Ok((c.id(), c.serialize()?)))
            .collect()
    }

    /// Recreate components from serialized form
    ///
    /// New ids are assigned; id-valued fields are remapped through the
    /// old -> new table built during this call. One failing entry never
    /// stops the others. Returns the report and the id table.
    pub fn deserialize_components(
        &mut self,
        data: &SerializedComponents,
    ) -> (LoadReport, HashMap<ComponentId, ComponentId>) {
        let mut report = LoadReport::new();
        let mut id_map = HashMap::new();
        let mut references: Vec<(ComponentId, ComponentId, Vec<(Field, FieldValue)>)> = Vec::new();

        for (old_id, value) in data {
            let mut component_data: ComponentData = match serde_json::from_value(value.clone()) {
                Ok(data) => data,
                Err(e) => {
                    report.push_error(format!("Component {}: {}", old_id, e));
                    continue;
                }
            };

            // Id-valued fields are resolved once every component exists
            let refs = match detach_references(&mut component_data) {
                Ok(refs) => refs,
                Err(e) => {
                    report.push_error(format!("Component {}: {}", old_id, e));
                    continue;
                }
            };

            match self.create_component(component_data) {
                Ok(new_id) => {
                    id_map.insert(*old_id, new_id);
                    report.created += 1;
                    if !refs.is_empty() {
                        references.push((*old_id, new_id, refs));
                    }
                }
                Err(e) => report.push_error(format!("Component {}: {}", old_id, e)),
            }
        }

        for (old_id, new_id, refs) in references {
            for (field, value) in refs {
                let mapped = match value {
                    FieldValue::Id(Some(old_ref)) => match id_map.get(&old_ref) {
                        Some(new_ref) => FieldValue::Id(Some(*new_ref)),
                        None => {
                            report.push_error(format!(
                                "Component {}: {} references missing component {}",
                                old_id, field, old_ref
                            ));
                            continue;
                        }
                    },
                    FieldValue::Ids(old_refs) => {
                        let mut new_refs = Vec::with_capacity(old_refs.len());
                        for old_ref in old_refs {
                            match id_map.get(&old_ref) {
                                Some(new_ref) => new_refs.push(*new_ref),
                                None => report.push_error(format!(
                                    "Component {}: {} references missing component {}",
                                    old_id, field, old_ref
                                )),
                            }
                        }
                        FieldValue::Ids(new_refs)
                    }
                    other => other,
                };
                if let Some(component) = self.components.get_mut(&new_id)
                    && let Err(e) = component.data_mut().set(field, &mapped)
                {
                    report.push_error(format!("Component {}: {}", old_id, e));
                }
            }
        }

        for error in &report.errors {
            log::warn!("{} timeline load: {}", self.timeline_kind, error);
        }
        (report, id_map)
    }

    /// Components in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.order.iter().filter_map(|id| self.components.get(id))
    }

    pub fn ids(&self) -> Vec<ComponentId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Position of a component in canonical order
    pub fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Component> {
        self.order.get(index).and_then(|id| self.components.get(id))
    }

    pub fn first(&self) -> Option<&Component> {
        self.get_by_index(0)
    }

    pub fn last(&self) -> Option<&Component> {
        self.order.last().and_then(|id| self.components.get(id))
    }

    fn sort_key(&self, id: ComponentId) -> Option<(crate::component::OrderingKey, ComponentId)> {
        self.components.get(&id).map(|c| (c.ordering_key(), id))
    }

    fn insert_ordered(&mut self, id: ComponentId) {
        let Some(key) = self.sort_key(id) else {
            return;
        };
        let position = self
            .order
            .partition_point(|other| self.sort_key(*other).is_some_and(|k| k < key));
        self.order.insert(position, id);
    }

    fn reposition(&mut self, id: ComponentId) {
        self.order.retain(|other| *other != id);
        self.insert_ordered(id);
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.order.len() == self.components.len()
            && self.order.iter().all(|id| {
                self.components.get(id).map(|c| c.id()) == Some(*id)
            })
            && self
                .order
                .windows(2)
                .all(|w| self.sort_key(w[0]) <= self.sort_key(w[1]))
    }
}

/// Clear id-valued fields, returning the cleared values for later remapping
fn detach_references(data: &mut ComponentData) -> ComponentResult<Vec<(Field, FieldValue)>> {
    let mut refs = Vec::new();
    for field in data.fields() {
        match data.get(*field) {
            Some(FieldValue::Id(Some(id))) => {
                data.set(*field, &FieldValue::Id(None))?;
                refs.push((*field, FieldValue::Id(Some(id))));
            }
            Some(FieldValue::Ids(ids)) if !ids.is_empty() => {
                data.set(*field, &FieldValue::Ids(Vec::new()))?;
                refs.push((*field, FieldValue::Ids(ids)));
            }
            _ => {}
        }
    }
    Ok(refs)
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentManager")
            .field("timeline_kind", &self.timeline_kind)
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Beat, Harmony, Hierarchy, Marker, Mode, PdfMarker};

    fn manager(kind: TimelineKind) -> ComponentManager {
        ComponentManager::new(kind, Services::with_duration(100.0))
    }

    #[test]
    fn test_create_and_lookup() {
        let mut manager = manager(TimelineKind::Marker);
        let id = manager
            .create_component(ComponentData::Marker(Marker::with_label(5.0, "A")))
            .unwrap();

        let component = manager.get_component(id).unwrap();
        assert_eq!(component.id(), id);
        assert_eq!(component.get_data(Field::Label), Ok(FieldValue::Text("A".into())));
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_kind_not_permitted() {
        let mut manager = manager(TimelineKind::Marker);
        let result = manager.create_component(ComponentData::Beat(Beat::new(1.0)));
        assert!(matches!(result, Err(ComponentError::KindNotPermitted { .. })));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_time_bounds() {
        let mut manager = manager(TimelineKind::Marker);
        assert_eq!(
            manager.create_component(ComponentData::Marker(Marker::new(101.0))),
            Err(ComponentError::TimeExceedsDuration {
                time: 101.0,
                duration: 100.0
            })
        );
        assert_eq!(
            manager.create_component(ComponentData::Marker(Marker::new(-1.0))),
            Err(ComponentError::NegativeTime(-1.0))
        );
        // Markers may share a time
        manager
            .create_component(ComponentData::Marker(Marker::new(3.0)))
            .unwrap();
        manager
            .create_component(ComponentData::Marker(Marker::new(3.0)))
            .unwrap();
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_beat_duplicate_time_rejected() {
        let mut manager = manager(TimelineKind::Beat);
        manager
            .create_component(ComponentData::Beat(Beat::new(2.0)))
            .unwrap();
        let result = manager.create_component(ComponentData::Beat(Beat::new(2.0)));
        assert_eq!(
            result,
            Err(ComponentError::DuplicateTime {
                kind: ComponentKind::Beat,
                time: 2.0
            })
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_harmony_and_mode_may_share_time() {
        let mut manager = manager(TimelineKind::Harmony);
        manager
            .create_component(ComponentData::Harmony(Harmony::new(1.0, 0, "major")))
            .unwrap();
        manager
            .create_component(ComponentData::Mode(Mode::new(1.0, 0, "major")))
            .unwrap();
        assert!(manager
            .create_component(ComponentData::Harmony(Harmony::new(1.0, 4, "major")))
            .is_err());
        assert!(manager
            .create_component(ComponentData::Mode(Mode::new(1.0, 2, "minor")))
            .is_err());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_pdf_page_total() {
        let mut manager = manager(TimelineKind::Pdf);
        manager.set_policy(ValidationPolicy::Pages { page_total: 3 });
        assert!(manager
            .create_component(ComponentData::PdfMarker(PdfMarker::new(0.0, 4)))
            .is_err());
        manager
            .create_component(ComponentData::PdfMarker(PdfMarker::new(0.0, 3)))
            .unwrap();
    }

    #[test]
    fn test_hierarchies_may_overlap_on_a_level() {
        let mut manager = manager(TimelineKind::Hierarchy);
        assert_eq!(manager.policy(), ValidationPolicy::BoundsOnly);
        let first = manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(0.0, 10.0, 1)))
            .unwrap();
        let overlapping = manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(5.0, 15.0, 1)))
            .unwrap();
        manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(0.0, 15.0, 2)))
            .unwrap();
        assert_eq!(manager.len(), 3);

        // Moving one span onto the other is accepted as well
        manager
            .set_component_data(overlapping, Field::Start, FieldValue::Float(0.0))
            .unwrap();
        manager
            .set_component_data(overlapping, Field::End, FieldValue::Float(10.0))
            .unwrap();
        assert_eq!(
            manager.get_component(overlapping).unwrap().extent(),
            manager.get_component(first).unwrap().extent()
        );
        // Still bound-checked
        assert!(manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(90.0, 110.0, 1)))
            .is_err());
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_harmony_level_bound_covers_every_path() {
        let mut manager = manager(TimelineKind::Harmony);
        let mut upper = Harmony::new(2.0, 0, "minor");
        upper.level = 2;
        assert!(matches!(
            manager.create_component(ComponentData::Harmony(upper.clone())),
            Err(ComponentError::InvalidValue { field: Field::Level, .. })
        ));

        let id = manager
            .create_component(ComponentData::Mode(Mode::new(1.0, 0, "major")))
            .unwrap();
        assert!(manager
            .set_component_data(id, Field::Level, FieldValue::Int(7))
            .is_err());
        assert_eq!(
            manager.get_component(id).unwrap().get_data(Field::Level),
            Ok(FieldValue::Int(1))
        );

        let mut serialized = SerializedComponents::new();
        serialized.insert(1, serde_json::to_value(ComponentData::Harmony(upper.clone())).unwrap());
        let (report, _) = manager.deserialize_components(&serialized);
        assert_eq!(report.created, 0);
        assert!(report.errors[0].contains("exceeds level count 1"));

        manager.set_policy(ValidationPolicy::Levels { level_count: 2 });
        manager
            .create_component(ComponentData::Harmony(upper))
            .unwrap();
        manager
            .set_component_data(id, Field::Level, FieldValue::Int(2))
            .unwrap();
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_ordering_follows_set_data() {
        let mut manager = manager(TimelineKind::Marker);
        let a = manager
            .create_component(ComponentData::Marker(Marker::new(1.0)))
            .unwrap();
        let b = manager
            .create_component(ComponentData::Marker(Marker::new(2.0)))
            .unwrap();
        let c = manager
            .create_component(ComponentData::Marker(Marker::new(3.0)))
            .unwrap();
        assert_eq!(manager.ids(), vec![a, b, c]);

        manager
            .set_component_data(a, Field::Time, FieldValue::Float(2.5))
            .unwrap();
        assert_eq!(manager.ids(), vec![b, a, c]);
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_set_data_rejected_by_policy_is_a_no_op() {
        let mut manager = manager(TimelineKind::Beat);
        let a = manager
            .create_component(ComponentData::Beat(Beat::new(1.0)))
            .unwrap();
        manager
            .create_component(ComponentData::Beat(Beat::new(2.0)))
            .unwrap();
        let result = manager.set_component_data(a, Field::Time, FieldValue::Float(2.0));
        assert!(result.is_err());
        assert_eq!(manager.get_component(a).unwrap().time(), 1.0);
    }

    #[test]
    fn test_delete_missing_component_fails() {
        let mut manager = manager(TimelineKind::Marker);
        let id = manager
            .create_component(ComponentData::Marker(Marker::new(1.0)))
            .unwrap();
        manager.delete_component(id).unwrap();
        assert!(matches!(
            manager.delete_component(id),
            Err(TimelineError::ComponentNotFound(_))
        ));
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_get_components_by_attribute() {
        let mut manager = manager(TimelineKind::Marker);
        manager
            .create_component(ComponentData::Marker(Marker::with_label(1.0, "A")))
            .unwrap();
        manager
            .create_component(ComponentData::Marker(Marker::with_label(2.0, "B")))
            .unwrap();
        manager
            .create_component(ComponentData::Marker(Marker::with_label(3.0, "A")))
            .unwrap();

        let found = manager.get_components_by_attribute(
            Field::Label,
            &FieldValue::Text("A".into()),
            ComponentKind::Marker,
        );
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.time() != 2.0));

        let late = manager.get_components_by_condition(|c| c.time() > 1.5, ComponentKind::Marker);
        assert_eq!(late.len(), 2);
    }

    #[test]
    fn test_round_trip_with_id_remapping() {
        let mut source = manager(TimelineKind::Hierarchy);
        let parent = source
            .create_component(ComponentData::Hierarchy(Hierarchy::with_label(0.0, 10.0, 2, "P")))
            .unwrap();
        let child = source
            .create_component(ComponentData::Hierarchy(Hierarchy::with_label(0.0, 5.0, 1, "C")))
            .unwrap();
        source
            .set_component_data(child, Field::Parent, FieldValue::Id(Some(parent)))
            .unwrap();
        source
            .set_component_data(parent, Field::Children, FieldValue::Ids(vec![child]))
            .unwrap();

        let serialized = source.serialize_components().unwrap();
        let mut target = manager(TimelineKind::Hierarchy);
        let (report, id_map) = target.deserialize_components(&serialized);
        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(report.created, 2);

        let new_parent = id_map[&parent];
        let new_child = id_map[&child];
        assert_ne!(new_parent, parent);
        assert_eq!(
            target.get_component(new_child).unwrap().get_data(Field::Parent),
            Ok(FieldValue::Id(Some(new_parent)))
        );
        assert_eq!(
            target.get_component(new_parent).unwrap().get_data(Field::Children),
            Ok(FieldValue::Ids(vec![new_child]))
        );
        assert_eq!(
            target.get_component(new_parent).unwrap().get_data(Field::Label),
            Ok(FieldValue::Text("P".into()))
        );
    }

    #[test]
    fn test_deserialize_collects_errors_and_continues() {
        let mut serialized = SerializedComponents::new();
        serialized.insert(1, serde_json::json!({ "kind": "beat", "time": 1.0 }));
        serialized.insert(2, serde_json::json!({ "kind": "beat" }));
        serialized.insert(3, serde_json::json!({ "kind": "spaceship", "time": 2.0 }));
        serialized.insert(4, serde_json::json!({ "kind": "beat", "time": 500.0 }));
        serialized.insert(5, serde_json::json!({ "kind": "beat", "time": 3.0 }));

        let mut target = manager(TimelineKind::Beat);
        let (report, _) = target.deserialize_components(&serialized);
        assert_eq!(report.created, 2);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].starts_with("Component 2"));
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_dangling_reference_reported() {
        let mut serialized = SerializedComponents::new();
        serialized.insert(
            10,
            serde_json::json!({ "kind": "hierarchy", "start": 0.0, "end": 1.0, "level": 1, "parent": 99 }),
        );
        let mut target = manager(TimelineKind::Hierarchy);
        let (report, _) = target.deserialize_components(&serialized);
        assert_eq!(report.created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("missing component 99"));
    }

    #[test]
    fn test_detach_references_clears_links() {
        let mut hierarchy = Hierarchy::new(0.0, 1.0, 1);
        hierarchy.parent = Some(7);
        hierarchy.children = vec![8, 9];
        let mut data = ComponentData::Hierarchy(hierarchy);

        let refs = detach_references(&mut data).unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.contains(&(Field::Parent, FieldValue::Id(Some(7)))));
        assert!(refs.contains(&(Field::Children, FieldValue::Ids(vec![8, 9]))));
        assert_eq!(data.get(Field::Parent), Some(FieldValue::Id(None)));
        assert_eq!(data.get(Field::Children), Some(FieldValue::Ids(Vec::new())));

        let mut marker = ComponentData::Marker(Marker::new(1.0));
        assert!(detach_references(&mut marker).unwrap().is_empty());
    }

    #[test]
    fn test_crop_points_and_spans() {
        let mut manager = manager(TimelineKind::Hierarchy);
        let inside = manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(0.0, 4.0, 1)))
            .unwrap();
        let straddle = manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(4.0, 8.0, 1)))
            .unwrap();
        let past = manager
            .create_component(ComponentData::Hierarchy(Hierarchy::new(8.0, 12.0, 1)))
            .unwrap();

        let deleted = manager.crop(6.0);
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id(), past);
        assert!(manager.contains(inside));
        assert_eq!(
            manager.get_component(straddle).unwrap().extent(),
            Extent::Span { start: 4.0, end: 6.0 }
        );
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_clear() {
        let mut manager = manager(TimelineKind::Marker);
        for t in [3.0, 1.0, 2.0] {
            manager
                .create_component(ComponentData::Marker(Marker::new(t)))
                .unwrap();
        }
        let removed = manager.clear();
        assert_eq!(removed.len(), 3);
        assert!(manager.is_empty());
        assert!(manager.is_consistent());
    }
}
