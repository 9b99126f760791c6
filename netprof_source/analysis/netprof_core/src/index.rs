use ahash::{AHashMap, AHashSet};
use netprof_ids::{ComponentID, ObjectID};
use netprof_reflect::SceneSource;
use std::sync::Arc;

use crate::classifier::{Classifier, ComponentFamily, ProgramSource, VariableDescriptor};
use crate::sync_mode::{SyncCategory, SyncMode};

/// One attached component as seen by a single scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentRecord {
    /// Back-reference to the live instance. Only meaningful against the host that
    /// produced the scan.
    pub component: ComponentID,
    pub type_name: Arc<str>,
    pub family: ComponentFamily,
    pub mode: SyncMode,
    pub variables: Vec<VariableDescriptor>,
    pub program_source: Option<ProgramSource>,
}

impl ComponentRecord {
    pub fn unclassified(component: ComponentID, type_name: Arc<str>, family: ComponentFamily) -> Self {
        Self {
            component,
            type_name,
            family,
            mode: SyncMode::unknown(),
            variables: Vec::new(),
            program_source: None,
        }
    }

    #[inline]
    pub fn synced_variable_count(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn category(&self) -> SyncCategory {
        self.mode.category()
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.family == ComponentFamily::Primary
    }

    pub fn program_source_path(&self) -> Option<&str> {
        self.program_source.as_ref()?.path.as_deref()
    }
}

/// One scene object with the components discovered on it, in discovery order.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObjectNode {
    pub id: ObjectID,
    pub name: String,
    /// Slash-joined ancestor chain, root first.
    pub path: String,
    pub components: Vec<ComponentRecord>,
}

/// Objects in first-seen order plus an id lookup. Rebuilt wholesale on every scan.
#[derive(Clone, Debug, Default)]
pub struct ObjectIndex {
    objects: Vec<SceneObjectNode>,
    by_id: AHashMap<ObjectID, usize>,
}

impl ObjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            by_id: AHashMap::with_capacity(capacity),
        }
    }

    /// Node for `id`, created from the host's current name and hierarchy on first use.
    pub fn get_or_insert(
        &mut self,
        source: &dyn SceneSource,
        id: ObjectID,
    ) -> &mut SceneObjectNode {
        let i = match self.by_id.get(&id) {
            Some(&i) => i,
            None => {
                let i = self.objects.len();
                self.objects.push(SceneObjectNode {
                    id,
                    name: source.object_name(id).unwrap_or_default(),
                    path: hierarchy_path(source, id),
                    components: Vec::new(),
                });
                self.by_id.insert(id, i);
                i
            }
        };
        &mut self.objects[i]
    }

    pub fn get(&self, id: ObjectID) -> Option<&SceneObjectNode> {
        let &i = self.by_id.get(&id)?;
        self.objects.get(i)
    }

    #[inline]
    pub fn objects(&self) -> &[SceneObjectNode] {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [SceneObjectNode] {
        &mut self.objects
    }

    pub fn components(&self) -> impl Iterator<Item = (&SceneObjectNode, &ComponentRecord)> {
        self.objects
            .iter()
            .flat_map(|object| object.components.iter().map(move |c| (object, c)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.objects.iter().map(|o| o.components.len()).sum()
    }
}

/// Root-to-leaf names joined with `/`. Stops if the host reports a parent cycle.
pub fn hierarchy_path(source: &dyn SceneSource, object: ObjectID) -> String {
    let mut parts = Vec::new();
    let mut seen = AHashSet::new();
    let mut current = Some(object);
    while let Some(id) = current {
        if !seen.insert(id) {
            log::warn!("object {object}: parent cycle at {id}, hierarchy path truncated");
            break;
        }
        parts.push(source.object_name(id).unwrap_or_default());
        current = source.parent(id);
    }
    parts.reverse();
    parts.join("/")
}

/// Groups components by owning object, preserving discovery order. Components the
/// host can no longer describe, and unrelated component types, are skipped.
/// Records come back unclassified.
pub fn index_objects(
    source: &dyn SceneSource,
    classifier: &Classifier,
    components: &[ComponentID],
) -> ObjectIndex {
    let mut index = ObjectIndex::with_capacity(components.len());
    for &component in components {
        let Some(ty) = source.component_type(component) else {
            continue;
        };
        let Some(owner) = source.owner(component) else {
            continue;
        };
        let family = classifier.family(&ty);
        if family == ComponentFamily::Unrelated {
            continue;
        }
        index
            .get_or_insert(source, owner)
            .components
            .push(ComponentRecord::unclassified(component, ty.name.clone(), family));
    }
    index
}

#[cfg(test)]
mod tests {
    use netprof_project::ClassifierConfig;
    use netprof_reflect::TypeInfo;
    use netprof_snapshot::{ComponentEntry, SceneSnapshot};

    use super::*;
    use crate::test_scenes::{behaviour, host, small_world};

    /// Two objects that claim each other as parent.
    struct Loop;

    impl SceneSource for Loop {
        fn list_components(&self) -> Vec<ComponentID> {
            Vec::new()
        }
        fn component_type(&self, _: ComponentID) -> Option<TypeInfo> {
            None
        }
        fn owner(&self, _: ComponentID) -> Option<ObjectID> {
            None
        }
        fn is_live(&self, _: ComponentID) -> bool {
            false
        }
        fn object_name(&self, object: ObjectID) -> Option<String> {
            Some(format!("o{}", object.index()))
        }
        fn parent(&self, object: ObjectID) -> Option<ObjectID> {
            Some(ObjectID::from_u32(3 - object.index()))
        }
    }

    fn index(snapshot: SceneSnapshot) -> ObjectIndex {
        let h = host(snapshot);
        let classifier = Classifier::new(&ClassifierConfig::default());
        index_objects(&h, &classifier, &h.list_components())
    }

    #[test]
    fn groups_by_owner_in_first_seen_order() {
        let idx = index(
            SceneSnapshot::new("s")
                .object(1, "Root", None)
                .object(2, "Child", Some(1))
                .component(behaviour(10, 2, 0))
                .component(behaviour(11, 1, 0))
                .component(behaviour(12, 2, 1)),
        );
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.component_count(), 3);

        let names: Vec<_> = idx.objects().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Child", "Root"]);

        let child = idx.get(ObjectID::from_u32(2)).unwrap();
        assert_eq!(child.path, "Root/Child");
        let ids: Vec<_> = child.components.iter().map(|c| c.component.index()).collect();
        assert_eq!(ids, [10, 12]);
        assert!(child.components.iter().all(|c| c.mode == SyncMode::unknown()));
    }

    #[test]
    fn unrelated_components_are_not_indexed() {
        let idx = index(small_world());
        let types: Vec<_> = idx.components().map(|(_, c)| c.type_name.to_string()).collect();
        assert_eq!(types, ["UdonBehaviour", "UdonBehaviour", "VRCPickup"]);
        assert_eq!(idx.get(ObjectID::from_u32(4)).unwrap().components.len(), 1);
    }

    #[test]
    fn object_with_only_unrelated_components_is_absent() {
        let idx = index(
            SceneSnapshot::new("s")
                .object(1, "Light", None)
                .component(ComponentEntry::new(1, 1, "Light")),
        );
        assert!(idx.is_empty());
        assert!(idx.get(ObjectID::from_u32(1)).is_none());
    }

    #[test]
    fn stale_handles_are_skipped() {
        let h = host(small_world());
        let classifier = Classifier::new(&ClassifierConfig::default());
        let idx = index_objects(
            &h,
            &classifier,
            &[ComponentID::from_u32(999), ComponentID::from_u32(10)],
        );
        assert_eq!(idx.component_count(), 1);
    }

    #[test]
    fn hierarchy_path_stops_on_cycle() {
        assert_eq!(hierarchy_path(&Loop, ObjectID::from_u32(1)), "o2/o1");
    }
}
