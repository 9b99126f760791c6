//! Type-safe generational handles for scene objects, components and assets.
//! All IDs use u64 = index (low 32 bits) | generation (high 32 bits). Index 0 = nil.
//! Hosts hand these out; a handle from an earlier scan may point at a reused slot,
//! which the generation half catches.

use std::fmt;

// ---- Generational ID: base encoding ----
// u64 layout: low 32 = index (0 = nil, 1.. = slot), high 32 = generation.

/// Defines a generational handle type (ObjectID, ComponentID, AssetID).
macro_rules! define_generational_id {
    ($type_name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $type_name(pub u64);

        impl $type_name {
            #[inline]
            pub const fn nil() -> Self {
                Self(0)
            }

            #[inline]
            pub const fn index(self) -> u32 {
                (self.0 & 0xFFFF_FFFF) as u32
            }

            #[inline]
            pub const fn generation(self) -> u32 {
                (self.0 >> 32) as u32
            }

            #[inline]
            pub const fn from_parts(index: u32, generation: u32) -> Self {
                Self((index as u64) | ((generation as u64) << 32))
            }

            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }

            #[inline]
            pub const fn from_u64(value: u64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn is_nil(self) -> bool {
                self.0 == 0
            }

            /// Index in low 32, generation 0 (snapshot files store plain indices).
            #[inline]
            pub const fn from_u32(index: u32) -> Self {
                Self::from_parts(index, 0)
            }
        }

        impl Default for $type_name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Debug for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($type_name), "({}:{})"),
                    self.index(),
                    self.generation()
                )
            }
        }

        impl fmt::Display for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.index(), self.generation())
            }
        }
    };
}

define_generational_id!(
    ObjectID,
    "Scene object handle. Stable for the lifetime of the object; used as the dedup key when indexing."
);
define_generational_id!(
    ComponentID,
    "Attached component handle. Non-owning back-reference kept by component records."
);
define_generational_id!(
    AssetID,
    "Asset handle (program sources and other referenced assets)."
);

impl AssetID {
    /// Opaque key text, stable across scans of the same asset.
    pub fn key_string(self) -> String {
        format!("{:016x}", self.0)
    }
}
