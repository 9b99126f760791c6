pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod estimator;
pub mod index;
pub mod mutation;
pub mod scan;
pub mod session;
pub mod sync_mode;

pub use aggregate::{ObjectView, ScriptKey, ScriptSummary, by_object, by_script};
pub use classifier::{
    Classification, Classifier, ComponentFamily, ModeStrategy, ProgramSource, VariableDescriptor,
    VariableStrategy,
};
pub use error::ProfilerError;
pub use estimator::{Estimator, IntensityRating, intensity_score};
pub use index::{ComponentRecord, ObjectIndex, SceneObjectNode, hierarchy_path, index_objects};
pub use mutation::{ApplyOutcome, ApplyRequest, apply_mode, set_sync_mode};
pub use scan::{ScanResult, ScanSummary, scan};
pub use session::{ApplyStatus, DetailsView, Session, ViewMode};
pub use sync_mode::{SyncCategory, SyncFilter, SyncMode, SyncTarget};

pub use netprof_project::{ClassifierConfig, EstimatorConfig, ProfilerConfig};

#[cfg(test)]
pub(crate) mod test_scenes {
    use netprof_snapshot::{ComponentEntry, SceneSnapshot, SnapshotHost, TypeEntry, ValueEntry};

    pub const SYNC_LABELS: [&str; 3] = ["None", "Continuous", "Manual"];

    pub fn behaviour(id: u32, object: u32, selected: i32) -> ComponentEntry {
        ComponentEntry::new(id, object, "UdonBehaviour")
            .namespace("VRC.Udon")
            .property("syncMethod", ValueEntry::enumeration(SYNC_LABELS, selected))
    }

    /// Door (continuous, two tagged vars), Lamp (manual, array vars), Pickup on a cube,
    /// and an unrelated renderer.
    pub fn small_world() -> SceneSnapshot {
        SceneSnapshot::new("World")
            .asset(100, "DoorLogic", "Assets/Door.asset")
            .asset(101, "LampLogic", "Assets/Lamp.asset")
            .object(1, "Root", None)
            .object(2, "Door", Some(1))
            .object(3, "Lamp", Some(1))
            .object(4, "Cube", Some(1))
            .component(
                behaviour(10, 2, 1)
                    .property("programSource", ValueEntry::asset(100))
                    .proxy_field("isOpen", TypeEntry::named("Boolean"), Some("UdonSynced"))
                    .proxy_field(
                        "owners",
                        TypeEntry::generic("List`1", vec![TypeEntry::named("String")]),
                        Some("UdonSynced"),
                    ),
            )
            .component(
                behaviour(11, 3, 2)
                    .property("programSource", ValueEntry::asset(101))
                    .property("syncedVariables", ValueEntry::strings(["lit"])),
            )
            .component(ComponentEntry::new(12, 4, "VRCPickup").namespace("VRC.SDK3.Components"))
            .component(ComponentEntry::new(13, 4, "MeshRenderer").namespace("UnityEngine"))
    }

    pub fn host(snapshot: SceneSnapshot) -> SnapshotHost {
        match SnapshotHost::new(snapshot) {
            Ok(host) => host,
            Err(err) => panic!("invalid test scene: {err}"),
        }
    }
}
