use ahash::{AHashMap, AHashSet};
use netprof_ids::{AssetID, ComponentID, ObjectID};
use netprof_reflect::{
    AssetInfo, ComponentReflector, ComponentWriter, EditHistory, Property, PropertyKind,
    ReflectError, SceneSource, TaggedField, TypeInfo,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::format::{ComponentEntry, ObjectEntry, PropertyEntry, SceneSnapshot, ValueEntry};

/// One undoable step: the component's properties as they were before it.
#[derive(Debug, Clone)]
struct EditRecord {
    description: String,
    component: usize,
    before: Vec<PropertyEntry>,
}

/// In-memory editor host over a [`SceneSnapshot`].
///
/// Handles are generation 0 and index = the id stored in the file. Enum writes are
/// staged by `set_enum_index` and only land on `commit`.
#[derive(Debug)]
pub struct SnapshotHost {
    snapshot: SceneSnapshot,
    path: Option<PathBuf>,

    objects: AHashMap<u32, usize>,
    components: AHashMap<u32, usize>,
    assets: AHashMap<u32, usize>,

    staged: Vec<(usize, String, usize)>,
    undo_stack: Vec<EditRecord>,
    dirty: bool,
}

impl SnapshotHost {
    /// Validates ids and references, then indexes the snapshot.
    pub fn new(snapshot: SceneSnapshot) -> Result<Self, SnapshotError> {
        let objects = index_ids("object", snapshot.objects.iter().map(|o| o.id))?;
        let components = index_ids("component", snapshot.components.iter().map(|c| c.id))?;
        let assets = index_ids("asset", snapshot.assets.iter().map(|a| a.id))?;

        for object in &snapshot.objects {
            if let Some(parent) = object.parent {
                if !objects.contains_key(&parent) {
                    return Err(SnapshotError::DanglingReference {
                        kind: "object",
                        id: object.id,
                        target_kind: "object",
                        target: parent,
                    });
                }
            }
        }
        for component in &snapshot.components {
            if !objects.contains_key(&component.object) {
                return Err(SnapshotError::DanglingReference {
                    kind: "component",
                    id: component.id,
                    target_kind: "object",
                    target: component.object,
                });
            }
        }
        check_parent_cycles(&snapshot, &objects)?;

        Ok(Self {
            snapshot,
            path: None,
            objects,
            components,
            assets,
            staged: Vec::new(),
            undo_stack: Vec::new(),
            dirty: false,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut host = Self::from_json(&json)?;
        host.path = Some(path.to_path_buf());
        log::debug!(
            "opened snapshot `{}` from {} ({} objects, {} components)",
            host.snapshot.scene,
            path.display(),
            host.snapshot.objects.len(),
            host.snapshot.components.len()
        );
        Ok(host)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.snapshot)?)
    }

    /// Writes back to the file it was opened from and clears the dirty flag.
    pub fn save(&mut self) -> Result<(), SnapshotError> {
        let path = self.path.clone().ok_or(SnapshotError::NoPath)?;
        self.save_as(path)
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    #[inline]
    pub fn snapshot(&self) -> &SceneSnapshot {
        &self.snapshot
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once a reversible edit changed something since the last save.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Reverts the most recent reversible edit. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        let record = self.undo_stack.pop()?;
        self.snapshot.components[record.component].properties = record.before;
        self.dirty = true;
        Some(record.description)
    }

    pub fn component(&self, component: ComponentID) -> Option<&ComponentEntry> {
        let &slot = self.component_slot(component)?;
        self.snapshot.components.get(slot)
    }

    /// Enum label currently selected on `property`, for inspection.
    pub fn selected_label(&self, component: ComponentID, property: &str) -> Option<&str> {
        match &self.component(component)?.find_property(property)?.value {
            ValueEntry::Enum { labels, selected } => {
                usize::try_from(*selected).ok().and_then(|i| labels.get(i)).map(String::as_str)
            }
            _ => None,
        }
    }

    fn component_slot(&self, component: ComponentID) -> Option<&usize> {
        if component.generation() != 0 {
            return None;
        }
        self.components.get(&component.index())
    }

    fn object_entry(&self, object: ObjectID) -> Option<&ObjectEntry> {
        if object.generation() != 0 {
            return None;
        }
        let &slot = self.objects.get(&object.index())?;
        self.snapshot.objects.get(slot)
    }

    fn readable(&self, component: ComponentID) -> netprof_reflect::Result<&ComponentEntry> {
        let entry = self
            .component(component)
            .ok_or(ReflectError::MissingComponent(component))?;
        if entry.unreadable {
            return Err(ReflectError::Host(format!(
                "serialized state of component {component} could not be read"
            )));
        }
        Ok(entry)
    }

    fn commit_slot(&mut self, slot: usize) {
        let mut i = 0;
        while i < self.staged.len() {
            if self.staged[i].0 != slot {
                i += 1;
                continue;
            }
            let (_, property, index) = self.staged.remove(i);
            let entry = &mut self.snapshot.components[slot];
            if let Some(PropertyEntry {
                value: ValueEntry::Enum { selected, .. },
                ..
            }) = entry.properties.iter_mut().find(|p| p.name == property)
            {
                *selected = index as i32;
            }
        }
    }
}

fn index_ids(
    kind: &'static str,
    ids: impl Iterator<Item = u32>,
) -> Result<AHashMap<u32, usize>, SnapshotError> {
    let mut map = AHashMap::new();
    for (slot, id) in ids.enumerate() {
        if map.insert(id, slot).is_some() {
            return Err(SnapshotError::DuplicateId { kind, id });
        }
    }
    Ok(map)
}

fn check_parent_cycles(
    snapshot: &SceneSnapshot,
    objects: &AHashMap<u32, usize>,
) -> Result<(), SnapshotError> {
    for object in &snapshot.objects {
        let mut seen = AHashSet::new();
        let mut current = Some(object.id);
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(SnapshotError::ParentCycle(object.id));
            }
            current = objects
                .get(&id)
                .and_then(|&slot| snapshot.objects[slot].parent);
        }
    }
    Ok(())
}

impl SceneSource for SnapshotHost {
    /// Live, editable, visible components, and only while the scene is loaded.
    fn list_components(&self) -> Vec<ComponentID> {
        if !self.snapshot.loaded {
            return Vec::new();
        }
        self.snapshot
            .components
            .iter()
            .filter(|c| c.live && c.editable && !c.hidden)
            .map(|c| ComponentID::from_u32(c.id))
            .collect()
    }

    fn component_type(&self, component: ComponentID) -> Option<TypeInfo> {
        let entry = self.component(component)?;
        Some(TypeInfo::new(&entry.ty, entry.namespace.as_deref()))
    }

    fn owner(&self, component: ComponentID) -> Option<ObjectID> {
        Some(ObjectID::from_u32(self.component(component)?.object))
    }

    fn is_live(&self, component: ComponentID) -> bool {
        self.component(component).is_some_and(|c| c.live)
    }

    fn object_name(&self, object: ObjectID) -> Option<String> {
        Some(self.object_entry(object)?.name.clone())
    }

    fn parent(&self, object: ObjectID) -> Option<ObjectID> {
        self.object_entry(object)?.parent.map(ObjectID::from_u32)
    }
}

impl ComponentReflector for SnapshotHost {
    fn property(
        &self,
        component: ComponentID,
        name: &str,
    ) -> netprof_reflect::Result<Option<Property>> {
        Ok(self
            .readable(component)?
            .find_property(name)
            .map(|p| Property::new(&p.name, p.value.to_value())))
    }

    fn properties(&self, component: ComponentID) -> netprof_reflect::Result<Vec<Property>> {
        Ok(self
            .readable(component)?
            .properties
            .iter()
            .map(|p| Property::new(&p.name, p.value.to_value()))
            .collect())
    }

    fn tagged_fields(
        &self,
        component: ComponentID,
        tag: &str,
    ) -> netprof_reflect::Result<Vec<TaggedField>> {
        let Some(fields) = &self.readable(component)?.proxy else {
            return Ok(Vec::new());
        };
        Ok(fields
            .iter()
            .filter(|f| f.tags.iter().any(|t| t == tag))
            .map(|f| TaggedField::new(&f.name, f.ty.to_desc()))
            .collect())
    }

    fn asset(&self, asset: AssetID) -> Option<AssetInfo> {
        if asset.generation() != 0 {
            return None;
        }
        let &slot = self.assets.get(&asset.index())?;
        let entry = self.snapshot.assets.get(slot)?;
        Some(AssetInfo {
            id: asset,
            name: entry.name.as_str().into(),
            path: entry.path.as_str().into(),
        })
    }
}

impl ComponentWriter for SnapshotHost {
    fn set_enum_index(
        &mut self,
        component: ComponentID,
        property: &str,
        index: usize,
    ) -> netprof_reflect::Result<()> {
        let &slot = self
            .component_slot(component)
            .ok_or(ReflectError::MissingComponent(component))?;
        let entry = self.readable(component)?;
        let found = entry
            .find_property(property)
            .ok_or_else(|| ReflectError::MissingProperty {
                component,
                property: property.to_string(),
            })?;
        let ValueEntry::Enum { labels, .. } = &found.value else {
            return Err(ReflectError::WrongKind {
                property: property.to_string(),
                expected: PropertyKind::Enum,
                found: found.value.to_value().kind(),
            });
        };
        if index >= labels.len() {
            return Err(ReflectError::IndexOutOfRange {
                property: property.to_string(),
                index,
                len: labels.len(),
            });
        }
        self.staged.push((slot, property.to_string(), index));
        Ok(())
    }

    fn commit(&mut self, component: ComponentID) -> netprof_reflect::Result<()> {
        let &slot = self
            .component_slot(component)
            .ok_or(ReflectError::MissingComponent(component))?;
        self.commit_slot(slot);
        Ok(())
    }
}

impl EditHistory for SnapshotHost {
    fn with_reversible_edit<R, F>(
        &mut self,
        component: ComponentID,
        description: &str,
        body: F,
    ) -> netprof_reflect::Result<R>
    where
        F: FnOnce(&mut Self) -> netprof_reflect::Result<R>,
    {
        let &slot = self
            .component_slot(component)
            .ok_or(ReflectError::MissingComponent(component))?;
        let before = self.snapshot.components[slot].properties.clone();

        let outcome = body(self);
        // Anything staged but never committed does not survive the edit.
        self.staged.retain(|(s, _, _)| *s != slot);

        match outcome {
            Ok(value) => {
                if self.snapshot.components[slot].properties != before {
                    self.undo_stack.push(EditRecord {
                        description: description.to_string(),
                        component: slot,
                        before,
                    });
                    self.dirty = true;
                }
                Ok(value)
            }
            Err(err) => {
                self.snapshot.components[slot].properties = before;
                Err(err)
            }
        }
    }
}
