//! Sync classification: a chain of mode strategies and a chain of variable
//! strategies, each tried in order until one produces a result.

use std::fmt;

use netprof_ids::ComponentID;
use netprof_project::ClassifierConfig;
use netprof_reflect::{AssetInfo, ComponentReflector, Property, ReflectError, TypeInfo};

use crate::sync_mode::{SyncMode, is_recognized_mode};

/// How a component type is treated by the profiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentFamily {
    /// The sync-capable behaviour type. Classified through the reflection heuristic.
    Primary,
    /// Framework components whose sync is handled by the framework itself.
    Framework,
    /// Not network relevant; never indexed.
    Unrelated,
}

impl ComponentFamily {
    pub fn of(ty: &TypeInfo, config: &ClassifierConfig) -> Self {
        if ty.name.as_ref() == config.primary_type || ty.full_name().contains(&config.primary_type)
        {
            return ComponentFamily::Primary;
        }
        let in_framework_namespace = ty
            .namespace
            .as_deref()
            .is_some_and(|ns| ns.contains(&config.framework_prefix));
        if ty.name.starts_with(&config.framework_prefix) || in_framework_namespace {
            return ComponentFamily::Framework;
        }
        ComponentFamily::Unrelated
    }
}

/// One synced variable: a name, plus the friendly type when it is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub name: String,
    pub ty: Option<String>,
}

impl fmt::Display for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{} : {}", self.name, ty),
            None => f.write_str(&self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode strategies
// ---------------------------------------------------------------------------

pub trait ModeStrategy {
    fn name(&self) -> &'static str;

    fn detect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Option<SyncMode>, ReflectError>;
}

/// Known selector names, tried in order. The selected label is returned verbatim.
pub struct NamedSelector {
    candidates: Vec<String>,
}

impl NamedSelector {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }
}

impl ModeStrategy for NamedSelector {
    fn name(&self) -> &'static str {
        "named selector"
    }

    fn detect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Option<SyncMode>, ReflectError> {
        let Some(property) = reflector.named_property(component, &self.candidates)? else {
            return Ok(None);
        };
        // A present selector ends the chain even when it is unusable.
        Ok(Some(
            property
                .value
                .selected_label()
                .map(SyncMode::from_label)
                .unwrap_or_default(),
        ))
    }
}

/// Shallow walk over visible properties for an enum whose name mentions "sync"
/// and whose selected label is a recognized mode.
pub struct SelectorDiscovery;

impl ModeStrategy for SelectorDiscovery {
    fn name(&self) -> &'static str {
        "selector discovery"
    }

    fn detect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Option<SyncMode>, ReflectError> {
        for property in reflector.properties(component)? {
            if !is_sync_enum(&property) {
                continue;
            }
            match property.value.selected_label() {
                Some(label) if is_recognized_mode(label) => {
                    return Ok(Some(SyncMode::from_label(label)));
                }
                _ => {}
            }
        }
        Ok(None)
    }
}

pub(crate) fn is_sync_enum(property: &Property) -> bool {
    property.is_enum() && property.name.to_lowercase().contains("sync")
}

// ---------------------------------------------------------------------------
// Variable strategies
// ---------------------------------------------------------------------------

pub trait VariableStrategy {
    fn name(&self) -> &'static str;

    fn collect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Vec<VariableDescriptor>, ReflectError>;
}

/// Fields on the proxy sibling carrying the synced tag.
pub struct TaggedFieldScan {
    tag: String,
}

impl TaggedFieldScan {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl VariableStrategy for TaggedFieldScan {
    fn name(&self) -> &'static str {
        "tagged fields"
    }

    fn collect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Vec<VariableDescriptor>, ReflectError> {
        Ok(reflector
            .tagged_fields(component, &self.tag)?
            .into_iter()
            .map(|field| VariableDescriptor {
                name: field.name.to_string(),
                ty: Some(field.ty.to_string()),
            })
            .collect())
    }
}

/// Serialized string array naming the synced variables.
pub struct SerializedArrayScan {
    candidates: Vec<String>,
}

impl SerializedArrayScan {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }
}

impl VariableStrategy for SerializedArrayScan {
    fn name(&self) -> &'static str {
        "serialized array"
    }

    fn collect(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Vec<VariableDescriptor>, ReflectError> {
        let Some(property) = reflector.named_property(component, &self.candidates)? else {
            return Ok(Vec::new());
        };
        let Some(items) = property.value.as_array() else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|name| VariableDescriptor {
                name: name.to_string(),
                ty: None,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub mode: SyncMode,
    pub variables: Vec<VariableDescriptor>,
}

pub struct Classifier {
    config: ClassifierConfig,
    mode_chain: Vec<Box<dyn ModeStrategy>>,
    variable_chain: Vec<Box<dyn VariableStrategy>>,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            mode_chain: vec![
                Box::new(NamedSelector::new(config.sync_property_names.clone())),
                Box::new(SelectorDiscovery),
            ],
            variable_chain: vec![
                Box::new(TaggedFieldScan::new(config.synced_tag.clone())),
                Box::new(SerializedArrayScan::new(config.synced_array_names.clone())),
            ],
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn family(&self, ty: &TypeInfo) -> ComponentFamily {
        ComponentFamily::of(ty, &self.config)
    }

    /// Mode and synced variables of a primary behaviour. Never fails: a reflection
    /// error is logged and the component comes back Unknown with no variables.
    pub fn classify(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Classification {
        match self.try_classify(reflector, component) {
            Ok(classification) => classification,
            Err(err) => {
                log::warn!("could not fully analyze component {component}: {err}");
                Classification::default()
            }
        }
    }

    fn try_classify(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Result<Classification, ReflectError> {
        let mut mode = SyncMode::unknown();
        for strategy in &self.mode_chain {
            if let Some(found) = strategy.detect(reflector, component)? {
                log::debug!("component {component}: {} -> {found}", strategy.name());
                mode = found;
                break;
            }
        }

        let mut variables = Vec::new();
        for strategy in &self.variable_chain {
            let found = strategy.collect(reflector, component)?;
            if !found.is_empty() {
                log::debug!(
                    "component {component}: {} -> {} variable(s)",
                    strategy.name(),
                    found.len()
                );
                variables = found;
                break;
            }
        }

        Ok(Classification { mode, variables })
    }

    /// Framework components are not introspected; the type name decides.
    pub fn classify_framework(&self, ty: &TypeInfo) -> SyncMode {
        let built_in = self
            .config
            .built_in_families
            .iter()
            .any(|family| ty.name.contains(family.as_str()));
        if built_in {
            SyncMode::built_in()
        } else {
            SyncMode::vrc_managed()
        }
    }

    /// Program-source asset referenced by a primary behaviour, if any. A reference
    /// the host cannot describe still yields its id.
    pub fn program_source(
        &self,
        reflector: &dyn ComponentReflector,
        component: ComponentID,
    ) -> Option<ProgramSource> {
        let property = match reflector.named_property(component, &self.config.program_source_names)
        {
            Ok(found) => found?,
            Err(err) => {
                log::debug!("component {component}: program source lookup failed: {err}");
                return None;
            }
        };
        let asset = property.value.as_asset()?;
        Some(match reflector.asset(asset) {
            Some(info) => ProgramSource::from(info),
            None => ProgramSource {
                asset: Some(asset),
                name: None,
                path: None,
            },
        })
    }
}

/// Backing program definition of a behaviour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSource {
    pub asset: Option<netprof_ids::AssetID>,
    pub name: Option<String>,
    pub path: Option<String>,
}

impl From<AssetInfo> for ProgramSource {
    fn from(info: AssetInfo) -> Self {
        Self {
            asset: Some(info.id),
            name: Some(info.name.to_string()),
            path: Some(info.path.to_string()).filter(|p| !p.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use netprof_ids::{AssetID, ComponentID};
    use netprof_snapshot::{ComponentEntry, SceneSnapshot, TypeEntry, ValueEntry};

    use super::*;
    use crate::sync_mode::SyncCategory;
    use crate::test_scenes::{behaviour, host};

    fn one(component: ComponentEntry) -> netprof_snapshot::SnapshotHost {
        host(SceneSnapshot::new("s").object(1, "A", None).component(component))
    }

    fn classify(component: ComponentEntry) -> Classification {
        let h = one(component);
        Classifier::new(&ClassifierConfig::default()).classify(&h, ComponentID::from_u32(1))
    }

    #[test]
    fn named_selector_label_is_verbatim() {
        let c = classify(behaviour(1, 1, 2));
        assert_eq!(c.mode.label(), "Manual");
        assert!(c.variables.is_empty());
    }

    #[test]
    fn later_candidate_names_are_tried() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour").property(
                "Synchronization",
                ValueEntry::enumeration(["Sync: None", "Sync: Manual"], 0),
            ),
        );
        assert_eq!(c.mode.label(), "Sync: None");
        assert_eq!(c.mode.category(), SyncCategory::None);
    }

    #[test]
    fn discovery_finds_recognized_sync_enum() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("speed", ValueEntry::enumeration(["Continuous"], 0))
                .property("networkSyncType", ValueEntry::enumeration(["Smooth", "Continuous"], 1)),
        );
        assert_eq!(c.mode.label(), "Continuous");
    }

    #[test]
    fn discovery_ignores_unrecognized_labels() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("syncStyle", ValueEntry::enumeration(["Fast", "Slow"], 0)),
        );
        assert_eq!(c.mode, SyncMode::unknown());
    }

    #[test]
    fn out_of_range_selector_stops_at_unknown() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("syncMethod", ValueEntry::enumeration(["None", "Manual"], 5))
                .property("altSync", ValueEntry::enumeration(["Manual", "None"], 0)),
        );
        assert_eq!(c.mode, SyncMode::unknown());
    }

    #[test]
    fn non_enum_selector_skips_discovery() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("syncMethod", ValueEntry::string("Manual"))
                .property("syncAlt", ValueEntry::enumeration(["None", "Continuous"], 1)),
        );
        assert_eq!(c.mode, SyncMode::unknown());
        assert_eq!(c.mode.category(), SyncCategory::Unknown);
    }

    #[test]
    fn tagged_fields_win_over_serialized_array() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("syncedVariables", ValueEntry::strings(["a", "b", "c", "d"]))
                .proxy_field(
                    "scores",
                    TypeEntry::generic(
                        "Dictionary`2",
                        vec![TypeEntry::named("String"), TypeEntry::named("Int32")],
                    ),
                    Some("UdonSynced"),
                )
                .proxy_field("local", TypeEntry::named("Single"), None),
        );
        assert_eq!(c.variables.len(), 1);
        assert_eq!(c.variables[0].to_string(), "scores : Dictionary<String, Int32>");
    }

    #[test]
    fn serialized_array_fallback() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .property("syncedVariableNames", ValueEntry::strings(["hp", "ammo"])),
        );
        let names: Vec<_> = c.variables.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, ["hp", "ammo"]);
        assert!(c.variables.iter().all(|v| v.ty.is_none()));
    }

    #[test]
    fn three_tagged_fields_without_selector() {
        let c = classify(
            ComponentEntry::new(1, 1, "UdonBehaviour")
                .proxy_field("a", TypeEntry::named("Int32"), Some("UdonSynced"))
                .proxy_field("b", TypeEntry::named("Int32"), Some("UdonSynced"))
                .proxy_field("c", TypeEntry::named("Int32"), Some("UdonSynced")),
        );
        assert_eq!(c.mode.label(), "Unknown");
        assert_eq!(c.variables.len(), 3);
    }

    #[test]
    fn read_failure_degrades_to_unknown() {
        let c = classify(behaviour(1, 1, 1).unreadable());
        assert_eq!(c, Classification::default());
        assert_eq!(c.mode.category(), SyncCategory::Unknown);
    }

    #[test]
    fn families() {
        let config = ClassifierConfig::default();
        let of = |name: &str, ns: Option<&str>| ComponentFamily::of(&TypeInfo::new(name, ns), &config);
        assert_eq!(of("UdonBehaviour", None), ComponentFamily::Primary);
        assert_eq!(of("UdonBehaviour", Some("VRC.Udon")), ComponentFamily::Primary);
        assert_eq!(of("VRCPickup", None), ComponentFamily::Framework);
        assert_eq!(of("AvatarPedestal", Some("VRC.SDK3")), ComponentFamily::Framework);
        assert_eq!(of("Rigidbody", Some("UnityEngine")), ComponentFamily::Unrelated);
    }

    #[test]
    fn framework_modes() {
        let classifier = Classifier::new(&ClassifierConfig::default());
        let mode = |name: &str| classifier.classify_framework(&TypeInfo::new(name, None));
        assert_eq!(mode("VRCPickup"), SyncMode::built_in());
        assert_eq!(mode("VRCObjectSync"), SyncMode::built_in());
        assert_eq!(mode("VRCStation"), SyncMode::built_in());
        assert_eq!(mode("VRCMirrorReflection"), SyncMode::vrc_managed());
    }

    #[test]
    fn program_source_lookup() {
        let h = host(
            SceneSnapshot::new("s")
                .asset(5, "Door", "Assets/Door.asset")
                .object(1, "A", None)
                .component(behaviour(1, 1, 0).property("m_ProgramSource", ValueEntry::asset(5)))
                .component(behaviour(2, 1, 0).property("programSource", ValueEntry::asset(6)))
                .component(behaviour(3, 1, 0)),
        );
        let classifier = Classifier::new(&ClassifierConfig::default());

        let known = classifier.program_source(&h, ComponentID::from_u32(1)).unwrap();
        assert_eq!(known.name.as_deref(), Some("Door"));
        assert_eq!(known.path.as_deref(), Some("Assets/Door.asset"));

        let undescribed = classifier.program_source(&h, ComponentID::from_u32(2)).unwrap();
        assert_eq!(undescribed.asset, Some(AssetID::from_u32(6)));
        assert_eq!(undescribed.path, None);

        assert_eq!(classifier.program_source(&h, ComponentID::from_u32(3)), None);
    }
}
