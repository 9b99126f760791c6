use netprof_ids::ComponentID;
use thiserror::Error;

use crate::PropertyKind;

pub type Result<T> = std::result::Result<T, ReflectError>;

/// Failures reported by a host while reading or writing component state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflectError {
    #[error("component {0} is not present in the scene")]
    MissingComponent(ComponentID),

    #[error("property `{property}` not found on component {component}")]
    MissingProperty {
        component: ComponentID,
        property: String,
    },

    #[error("property `{property}` is {found}, expected {expected}")]
    WrongKind {
        property: String,
        expected: PropertyKind,
        found: PropertyKind,
    },

    #[error("option index {index} out of range for `{property}` ({len} options)")]
    IndexOutOfRange {
        property: String,
        index: usize,
        len: usize,
    },

    #[error("host error: {0}")]
    Host(String),
}
