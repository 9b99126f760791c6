//! Derived views over a [`ScanResult`]. Recomputed on every call and never cached;
//! both borrow the result they were built from.

use indexmap::IndexMap;
use netprof_ids::AssetID;
use netprof_reflect::SceneSource;
use std::fmt;
use std::sync::Arc;

use crate::estimator::intensity_score;
use crate::index::{ComponentRecord, SceneObjectNode};
use crate::scan::ScanResult;
use crate::sync_mode::SyncFilter;

/// An object with at least one visible component.
#[derive(Debug, Clone)]
pub struct ObjectView<'a> {
    pub object: &'a SceneObjectNode,
    /// Components passing the filter, in discovery order.
    pub visible: Vec<&'a ComponentRecord>,
    /// Whole-object estimate, visible or not.
    pub kbps: f64,
    pub intensity: f64,
}

/// Objects ordered by estimated bandwidth, largest first. Ties keep first-seen order.
pub fn by_object(result: &ScanResult, filter: SyncFilter) -> Vec<ObjectView<'_>> {
    let mut views: Vec<ObjectView<'_>> = result
        .objects()
        .iter()
        .filter_map(|object| {
            let visible: Vec<&ComponentRecord> = object
                .components
                .iter()
                .filter(|c| filter.matches(&c.mode))
                .collect();
            if visible.is_empty() {
                return None;
            }
            let kbps = result.object_kbps(object);
            Some(ObjectView {
                object,
                visible,
                kbps,
                intensity: intensity_score(kbps),
            })
        })
        .collect();
    views.sort_by(|a, b| b.kbps.total_cmp(&a.kbps));
    views
}

/// Identity of the authored behaviour behind a component: its program-source asset,
/// else the source path, else the raw component type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScriptKey {
    Asset(AssetID),
    Path(Arc<str>),
    Type(Arc<str>),
}

impl ScriptKey {
    pub fn of(record: &ComponentRecord) -> Self {
        if let Some(source) = &record.program_source {
            if let Some(asset) = source.asset {
                return ScriptKey::Asset(asset);
            }
            if let Some(path) = &source.path {
                return ScriptKey::Path(Arc::from(path.as_str()));
            }
        }
        ScriptKey::Type(record.type_name.clone())
    }

    /// Parses the form produced by `Display`: `asset:<hex>`, `path:<p>` or `type:<t>`.
    /// A bare string is read as a path if it contains `/`, else as a type name.
    pub fn parse(raw: &str) -> Self {
        if let Some(hex) = raw.strip_prefix("asset:") {
            if let Ok(bits) = u64::from_str_radix(hex, 16) {
                return ScriptKey::Asset(AssetID::from_u64(bits));
            }
        }
        if let Some(path) = raw.strip_prefix("path:") {
            return ScriptKey::Path(Arc::from(path));
        }
        if let Some(ty) = raw.strip_prefix("type:") {
            return ScriptKey::Type(Arc::from(ty));
        }
        if raw.contains('/') {
            ScriptKey::Path(Arc::from(raw))
        } else {
            ScriptKey::Type(Arc::from(raw))
        }
    }
}

impl fmt::Display for ScriptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKey::Asset(id) => write!(f, "asset:{}", id.key_string()),
            ScriptKey::Path(path) => write!(f, "path:{path}"),
            ScriptKey::Type(ty) => write!(f, "type:{ty}"),
        }
    }
}

/// Visible components sharing one [`ScriptKey`].
#[derive(Debug, Clone)]
pub struct ScriptSummary<'a> {
    pub key: ScriptKey,
    pub display_name: String,
    /// Program-source path, empty when unknown.
    pub tooltip: String,
    pub instance_count: usize,
    pub bandwidth_kbps: f64,
    pub components: Vec<&'a ComponentRecord>,
}

impl ScriptSummary<'_> {
    /// True when at least one contributor is a primary behaviour that is still live.
    pub fn is_bulk_editable(&self, source: &dyn SceneSource) -> bool {
        self.components
            .iter()
            .any(|c| c.is_primary() && source.is_live(c.component))
    }
}

fn display_name(record: &ComponentRecord) -> String {
    let source = record.program_source.as_ref();
    source
        .and_then(|s| s.name.clone())
        .or_else(|| source.and_then(|s| s.path.clone()))
        .unwrap_or_else(|| record.type_name.to_string())
}

/// Visible components grouped by script identity, largest bandwidth first. Ties keep
/// the order in which keys were first seen.
pub fn by_script(result: &ScanResult, filter: SyncFilter) -> Vec<ScriptSummary<'_>> {
    let mut groups: IndexMap<ScriptKey, ScriptSummary<'_>> = IndexMap::new();
    for (_, record) in result.index().components() {
        if !filter.matches(&record.mode) {
            continue;
        }
        let key = ScriptKey::of(record);
        let summary = groups.entry(key.clone()).or_insert_with(|| ScriptSummary {
            key,
            display_name: display_name(record),
            tooltip: record.program_source_path().unwrap_or_default().to_string(),
            instance_count: 0,
            bandwidth_kbps: 0.0,
            components: Vec::new(),
        });
        summary.instance_count += 1;
        summary.bandwidth_kbps += result.component_kbps(record);
        summary.components.push(record);
    }

    let mut summaries: Vec<ScriptSummary<'_>> = groups.into_values().collect();
    summaries.sort_by(|a, b| b.bandwidth_kbps.total_cmp(&a.bandwidth_kbps));
    summaries
}
