use netprof_ids::{AssetID, ComponentID, ObjectID};

use crate::{AssetInfo, Property, Result, TaggedField, TypeInfo};

/// Live scene enumeration. Everything returned by `list_components` is already
/// filtered by the host to live, editable, visible components of loaded scenes.
pub trait SceneSource {
    fn list_components(&self) -> Vec<ComponentID>;

    fn component_type(&self, component: ComponentID) -> Option<TypeInfo>;
    fn owner(&self, component: ComponentID) -> Option<ObjectID>;
    fn is_live(&self, component: ComponentID) -> bool;

    fn object_name(&self, object: ObjectID) -> Option<String>;
    fn parent(&self, object: ObjectID) -> Option<ObjectID>;
}

/// Read side of the reflective accessor.
pub trait ComponentReflector {
    /// Single property by exact name. `Ok(None)` when the component has no such property.
    fn property(&self, component: ComponentID, name: &str) -> Result<Option<Property>>;

    /// Visible top-level properties in declaration order. Shallow; nested children are
    /// not expanded.
    fn properties(&self, component: ComponentID) -> Result<Vec<Property>>;

    /// Fields tagged with `tag` on the component's proxy sibling. Empty when there is
    /// no proxy or the tag type is unknown to the host.
    fn tagged_fields(&self, component: ComponentID, tag: &str) -> Result<Vec<TaggedField>>;

    fn asset(&self, asset: AssetID) -> Option<AssetInfo>;

    /// First candidate name that resolves to a property.
    fn named_property(
        &self,
        component: ComponentID,
        candidates: &[String],
    ) -> Result<Option<Property>> {
        for name in candidates {
            if let Some(property) = self.property(component, name)? {
                return Ok(Some(property));
            }
        }
        Ok(None)
    }
}

/// Write side of the reflective accessor.
pub trait ComponentWriter {
    fn set_enum_index(
        &mut self,
        component: ComponentID,
        property: &str,
        index: usize,
    ) -> Result<()>;

    /// Flush pending writes on `component` back into the live instance.
    fn commit(&mut self, component: ComponentID) -> Result<()>;
}

/// Undo / dirty tracking.
pub trait EditHistory {
    /// Runs `body` inside one undoable step named `description`. Whatever `body` commits
    /// on `component` is reverted by a single undo, and the owning scene is marked
    /// modified when anything changed.
    fn with_reversible_edit<R, F>(
        &mut self,
        component: ComponentID,
        description: &str,
        body: F,
    ) -> Result<R>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<R>;
}

/// Everything the profiler needs from the editor it runs in.
pub trait Host: SceneSource + ComponentReflector + ComponentWriter + EditHistory {}

impl<T> Host for T where T: SceneSource + ComponentReflector + ComponentWriter + EditHistory {}
