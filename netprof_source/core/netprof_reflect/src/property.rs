// netprof_reflect/src/property.rs

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use netprof_ids::AssetID;

/// Coarse kind of a reflected property, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Enum,
    Array,
    String,
    AssetRef,
    Other,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::Enum => "enum",
            PropertyKind::Array => "array",
            PropertyKind::String => "string",
            PropertyKind::AssetRef => "asset reference",
            PropertyKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Value of a reflected property. Only the shapes the profiler reads are modelled;
/// everything else arrives as `Other`.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Enumerated value: display labels plus the selected index. The index is whatever
    /// the host serialized and may be out of range.
    Enum {
        labels: Arc<[Arc<str>]>,
        selected: i32,
    },
    Array(Vec<PropertyValue>),
    String(Arc<str>),
    AssetRef(Option<AssetID>),
    Other,
}

// -------------------- Constructors --------------------

impl PropertyValue {
    pub fn enumeration<I, S>(labels: I, selected: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<Arc<str>> = labels
            .into_iter()
            .map(|s| Arc::<str>::from(s.as_ref()))
            .collect();
        PropertyValue::Enum {
            labels: labels.into(),
            selected,
        }
    }

    #[inline]
    pub fn string<S: AsRef<str>>(s: S) -> Self {
        PropertyValue::String(Arc::<str>::from(s.as_ref()))
    }

    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PropertyValue::Array(items.into_iter().map(PropertyValue::string).collect())
    }

    #[inline]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Enum { .. } => PropertyKind::Enum,
            PropertyValue::Array(_) => PropertyKind::Array,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::AssetRef(_) => PropertyKind::AssetRef,
            PropertyValue::Other => PropertyKind::Other,
        }
    }
}

// -------------------- Accessors --------------------

impl PropertyValue {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_asset(&self) -> Option<AssetID> {
        match self {
            PropertyValue::AssetRef(id) => *id,
            _ => None,
        }
    }

    #[inline]
    pub fn enum_labels(&self) -> Option<&[Arc<str>]> {
        match self {
            PropertyValue::Enum { labels, .. } => Some(labels),
            _ => None,
        }
    }

    #[inline]
    pub fn enum_index(&self) -> Option<i32> {
        match self {
            PropertyValue::Enum { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    /// Label of the selected option; `None` for non-enums, empty label sets and
    /// out-of-range indices.
    pub fn selected_label(&self) -> Option<&str> {
        let PropertyValue::Enum { labels, selected } = self else {
            return None;
        };
        let index = usize::try_from(*selected).ok()?;
        labels.get(index).map(|label| label.as_ref())
    }
}

/// A named property as read from a component.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: Arc<str>,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl AsRef<str>, value: PropertyValue) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            value,
        }
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.kind() == PropertyKind::Enum
    }
}

// -------------------- Type descriptors --------------------

/// Declared type of a field: a name plus generic arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeDesc {
    pub name: Arc<str>,
    pub args: Vec<TypeDesc>,
}

impl TypeDesc {
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl AsRef<str>, args: Vec<TypeDesc>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            args,
        }
    }

    /// Name with any generic arity suffix (`` List`1 ``) removed.
    pub fn base_name(&self) -> &str {
        match self.name.find('`') {
            Some(tick) => &self.name[..tick],
            None => &self.name,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return f.write_str("Unknown");
        }
        if self.args.is_empty() {
            return f.write_str(&self.name);
        }
        write!(f, "{}<", self.base_name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ">")
    }
}

/// A field on a component's proxy carrying some attribute tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedField {
    pub name: Arc<str>,
    pub ty: TypeDesc,
}

impl TaggedField {
    pub fn new(name: impl AsRef<str>, ty: TypeDesc) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            ty,
        }
    }
}

// -------------------- Scene metadata --------------------

/// Runtime type of a component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub name: Arc<str>,
    pub namespace: Option<Arc<str>>,
}

impl TypeInfo {
    pub fn new(name: impl AsRef<str>, namespace: Option<&str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            namespace: namespace.map(Arc::from),
        }
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.to_string(),
        }
    }
}

/// Display data for a referenced asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetInfo {
    pub id: AssetID,
    pub name: Arc<str>,
    pub path: Arc<str>,
}
