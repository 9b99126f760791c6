//! On-disk scene snapshot. Plain indices everywhere; the host turns them into
//! generation-0 handles.

use netprof_ids::AssetID;
use netprof_reflect::{PropertyValue, TypeDesc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene: String,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<AssetEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub id: u32,
    pub object: u32,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub live: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Every property read fails. Stands in for a component whose serialized
    /// state the editor cannot open.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unreadable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyEntry>,
    /// Fields of the proxy sibling. `None` when the component has no proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Vec<FieldEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    #[serde(flatten)]
    pub value: ValueEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueEntry {
    Enum { labels: Vec<String>, selected: i32 },
    Array { items: Vec<ValueEntry> },
    String { value: String },
    AssetRef { asset: Option<u32> },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeEntry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A bare type name, or a generic `{ name, args }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeEntry {
    Named(String),
    Generic { name: String, args: Vec<TypeEntry> },
}

// -------------------- Conversions --------------------

impl ValueEntry {
    pub fn to_value(&self) -> PropertyValue {
        match self {
            ValueEntry::Enum { labels, selected } => PropertyValue::enumeration(labels, *selected),
            ValueEntry::Array { items } => {
                PropertyValue::Array(items.iter().map(ValueEntry::to_value).collect())
            }
            ValueEntry::String { value } => PropertyValue::string(value),
            ValueEntry::AssetRef { asset } => {
                PropertyValue::AssetRef(asset.map(AssetID::from_u32))
            }
            ValueEntry::Other => PropertyValue::Other,
        }
    }

    pub fn enumeration<I, S>(labels: I, selected: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueEntry::Enum {
            labels: labels.into_iter().map(Into::into).collect(),
            selected,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        ValueEntry::String {
            value: value.into(),
        }
    }

    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueEntry::Array {
            items: items.into_iter().map(ValueEntry::string).collect(),
        }
    }

    pub fn asset(id: u32) -> Self {
        ValueEntry::AssetRef { asset: Some(id) }
    }
}

impl TypeEntry {
    pub fn named(name: impl Into<String>) -> Self {
        TypeEntry::Named(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeEntry>) -> Self {
        TypeEntry::Generic {
            name: name.into(),
            args,
        }
    }

    pub fn to_desc(&self) -> TypeDesc {
        match self {
            TypeEntry::Named(name) => TypeDesc::named(name),
            TypeEntry::Generic { name, args } => {
                TypeDesc::generic(name, args.iter().map(TypeEntry::to_desc).collect())
            }
        }
    }
}

// -------------------- Builders --------------------

impl SceneSnapshot {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            loaded: true,
            assets: Vec::new(),
            objects: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }

    pub fn asset(mut self, id: u32, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.assets.push(AssetEntry {
            id,
            name: name.into(),
            path: path.into(),
        });
        self
    }

    pub fn object(mut self, id: u32, name: impl Into<String>, parent: Option<u32>) -> Self {
        self.objects.push(ObjectEntry {
            id,
            name: name.into(),
            parent,
        });
        self
    }

    pub fn component(mut self, component: ComponentEntry) -> Self {
        self.components.push(component);
        self
    }
}

impl ComponentEntry {
    pub fn new(id: u32, object: u32, ty: impl Into<String>) -> Self {
        Self {
            id,
            object,
            ty: ty.into(),
            namespace: None,
            live: true,
            editable: true,
            hidden: false,
            unreadable: false,
            properties: Vec::new(),
            proxy: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: ValueEntry) -> Self {
        self.properties.push(PropertyEntry {
            name: name.into(),
            value,
        });
        self
    }

    /// Adds a proxy field, creating the proxy if needed.
    pub fn proxy_field(
        mut self,
        name: impl Into<String>,
        ty: TypeEntry,
        tag: Option<&str>,
    ) -> Self {
        self.proxy.get_or_insert_with(Vec::new).push(FieldEntry {
            name: name.into(),
            ty,
            tags: tag.map(str::to_string).into_iter().collect(),
        });
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.iter().find(|p| p.name == name)
    }
}
