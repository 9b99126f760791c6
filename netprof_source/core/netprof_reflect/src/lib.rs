pub mod error;
pub mod host;
pub mod property;

pub use error::*;
pub use host::*;
pub use property::*;

pub mod prelude {
    pub use crate::host::{ComponentReflector, ComponentWriter, EditHistory, Host, SceneSource};
    pub use crate::property::{Property, PropertyKind, PropertyValue, TaggedField, TypeDesc};
    pub use netprof_ids::{AssetID, ComponentID, ObjectID};
}
