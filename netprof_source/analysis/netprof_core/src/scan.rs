use indexmap::IndexMap;
use netprof_project::ProfilerConfig;
use netprof_reflect::{ComponentReflector, SceneSource};
use std::sync::Arc;

use crate::aggregate::{self, ObjectView, ScriptSummary};
use crate::classifier::{Classifier, ComponentFamily};
use crate::estimator::{Estimator, IntensityRating, intensity_score};
use crate::index::{ComponentRecord, ObjectIndex, SceneObjectNode, index_objects};
use crate::sync_mode::{SyncCategory, SyncFilter, is_sync_mode};

/// Scene-wide counters, computed over every indexed component (never filtered).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanSummary {
    pub primary_total: usize,
    pub continuous: usize,
    pub manual: usize,
    pub none: usize,
    pub unknown: usize,
    pub vrc_managed: usize,
    pub built_in: usize,
    /// Sum of known synced-variable counts. Estimated defaults are not included.
    pub synced_variables: usize,
    pub framework_total: usize,
    /// Framework component counts per type name, in first-seen order.
    pub framework_types: IndexMap<Arc<str>, usize>,
    pub scene_kbps: f64,
    pub intensity: f64,
    pub rating: IntensityRating,
    pub high_continuous_advisory: bool,
}

impl ScanSummary {
    /// Framework types by count, largest first; ties keep first-seen order.
    pub fn framework_breakdown(&self) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .framework_types
            .iter()
            .map(|(name, &count)| (name.as_ref(), count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    fn count(&mut self, record: &ComponentRecord) {
        match record.family {
            ComponentFamily::Primary => {
                self.primary_total += 1;
                self.synced_variables += record.synced_variable_count();
                // Counters test none before manual before continuous; the filter and
                // rate lookup use the opposite order.
                let label = record.mode.label();
                if is_sync_mode(label, "none") {
                    self.none += 1;
                } else if is_sync_mode(label, "manual") {
                    self.manual += 1;
                } else if is_sync_mode(label, "continuous") {
                    self.continuous += 1;
                } else {
                    self.unknown += 1;
                }
            }
            ComponentFamily::Framework => {
                self.framework_total += 1;
                *self
                    .framework_types
                    .entry(record.type_name.clone())
                    .or_insert(0) += 1;
                if record.category() == SyncCategory::BuiltIn {
                    self.built_in += 1;
                } else {
                    self.vrc_managed += 1;
                }
            }
            ComponentFamily::Unrelated => {}
        }
    }
}

/// Everything one scan produced. Records hold handles into the host that was
/// scanned; a result must be dropped once that host is mutated.
#[derive(Clone, Debug)]
pub struct ScanResult {
    index: ObjectIndex,
    summary: ScanSummary,
    estimator: Estimator,
}

impl ScanResult {
    #[inline]
    pub fn index(&self) -> &ObjectIndex {
        &self.index
    }

    #[inline]
    pub fn objects(&self) -> &[SceneObjectNode] {
        self.index.objects()
    }

    #[inline]
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    #[inline]
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn component_kbps(&self, record: &ComponentRecord) -> f64 {
        self.estimator.component_kbps(record)
    }

    pub fn object_kbps(&self, object: &SceneObjectNode) -> f64 {
        self.estimator.object_kbps(object)
    }

    pub fn scene_kbps(&self) -> f64 {
        self.summary.scene_kbps
    }

    pub fn by_object(&self, filter: SyncFilter) -> Vec<ObjectView<'_>> {
        aggregate::by_object(self, filter)
    }

    pub fn by_script(&self, filter: SyncFilter) -> Vec<ScriptSummary<'_>> {
        aggregate::by_script(self, filter)
    }
}

/// Index, classify and estimate the whole scene in one pass.
pub fn scan<S>(source: &S, config: &ProfilerConfig) -> ScanResult
where
    S: SceneSource + ComponentReflector,
{
    let classifier = Classifier::new(&config.classifier);
    let estimator = Estimator::new(config.estimator);

    let components = source.list_components();
    let mut index = index_objects(source, &classifier, &components);

    for object in index.objects_mut() {
        for record in &mut object.components {
            match record.family {
                ComponentFamily::Primary => {
                    record.program_source = classifier.program_source(source, record.component);
                    let classification = classifier.classify(source, record.component);
                    record.mode = classification.mode;
                    record.variables = classification.variables;
                }
                ComponentFamily::Framework => {
                    if let Some(ty) = source.component_type(record.component) {
                        record.mode = classifier.classify_framework(&ty);
                    }
                }
                ComponentFamily::Unrelated => {}
            }
        }
    }

    let mut summary = ScanSummary::default();
    for (_, record) in index.components() {
        summary.count(record);
    }
    summary.scene_kbps = estimator.scene_kbps(index.objects());
    summary.intensity = intensity_score(summary.scene_kbps);
    summary.rating = IntensityRating::from_score(summary.intensity);
    summary.high_continuous_advisory =
        summary.continuous > estimator.config().continuous_warning_threshold as usize;

    log::info!(
        "scan: {} behaviours (continuous {}, manual {}, none {}, unknown {}) | {} framework components | {} synced vars | {:.1} kbps",
        summary.primary_total,
        summary.continuous,
        summary.manual,
        summary.none,
        summary.unknown,
        summary.framework_total,
        summary.synced_variables,
        summary.scene_kbps,
    );
    if summary.high_continuous_advisory {
        log::warn!(
            "{} continuous sync behaviours detected; this may cause high network traffic",
            summary.continuous
        );
    }

    ScanResult {
        index,
        summary,
        estimator,
    }
}

#[cfg(test)]
mod tests {
    use netprof_snapshot::{ComponentEntry, SceneSnapshot};

    use super::*;
    use crate::test_scenes::{behaviour, host, small_world};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn scan_snapshot(snapshot: SceneSnapshot) -> ScanResult {
        scan(&host(snapshot), &ProfilerConfig::default())
    }

    #[test]
    fn small_world_summary() {
        let result = scan_snapshot(small_world());
        let s = result.summary();
        assert_eq!(s.primary_total, 2);
        assert_eq!((s.continuous, s.manual, s.none, s.unknown), (1, 1, 0, 0));
        assert_eq!((s.built_in, s.vrc_managed), (1, 0));
        assert_eq!(s.synced_variables, 3);
        assert_eq!(s.framework_total, 1);
        assert_eq!(s.framework_breakdown(), vec![("VRCPickup", 1)]);

        let expected = 10.0 * 48.0 / 1024.0 + 0.2 * 36.0 / 1024.0 + 5.0 * 48.0 / 1024.0;
        assert!(close(s.scene_kbps, expected));
        assert!(close(s.intensity, expected * 2.0));
        assert_eq!(s.rating, IntensityRating::VeryLow);
        assert!(!s.high_continuous_advisory);
    }

    #[test]
    fn records_carry_program_source_and_variables() {
        let result = scan_snapshot(small_world());
        let door = &result.objects()[0];
        assert_eq!(door.name, "Door");
        assert_eq!(door.path, "Root/Door");
        let record = &door.components[0];
        assert_eq!(record.mode.label(), "Continuous");
        assert_eq!(record.program_source_path(), Some("Assets/Door.asset"));
        let vars: Vec<_> = record.variables.iter().map(|v| v.to_string()).collect();
        assert_eq!(vars, ["isOpen : Boolean", "owners : List<String>"]);
    }

    #[test]
    fn eleven_continuous_components() {
        let mut snapshot = SceneSnapshot::new("s").object(1, "Spinners", None);
        for id in 0..11 {
            snapshot = snapshot.component(behaviour(100 + id, 1, 1));
        }
        let result = scan_snapshot(snapshot);
        let s = result.summary();
        assert_eq!(s.continuous, 11);
        assert!(close(s.scene_kbps, 11.0 * 10.0 * 36.0 / 1024.0));
        assert!((s.scene_kbps - 3.867).abs() < 1e-3);
        assert!((s.intensity - 7.73).abs() < 1e-2);
        assert_eq!(s.rating.label(), "Very Low");
        assert!(s.high_continuous_advisory);
    }

    #[test]
    fn ten_continuous_components_do_not_warn() {
        let mut snapshot = SceneSnapshot::new("s").object(1, "Spinners", None);
        for id in 0..10 {
            snapshot = snapshot.component(behaviour(100 + id, 1, 1));
        }
        assert!(!scan_snapshot(snapshot).summary().high_continuous_advisory);
    }

    #[test]
    fn mixed_labels_count_none_first() {
        let result = scan_snapshot(
            SceneSnapshot::new("s")
                .object(1, "A", None)
                .component(ComponentEntry::new(10, 1, "UdonBehaviour").property(
                    "syncMethod",
                    netprof_snapshot::ValueEntry::enumeration(["Manual / None"], 0),
                ))
                .component(ComponentEntry::new(11, 1, "UdonBehaviour").property(
                    "syncMethod",
                    netprof_snapshot::ValueEntry::enumeration(["Manual or Continuous"], 0),
                )),
        );
        let s = result.summary();
        assert_eq!((s.none, s.manual, s.continuous, s.unknown), (1, 1, 0, 0));

        // The filter category still reads continuous before manual.
        let categories: Vec<_> = result
            .objects()
            .iter()
            .flat_map(|o| o.components.iter().map(|c| c.category()))
            .collect();
        assert_eq!(categories, [SyncCategory::Manual, SyncCategory::Continuous]);
    }

    #[test]
    fn empty_scene_is_all_zero() {
        let result = scan_snapshot(SceneSnapshot::new("Empty"));
        assert!(result.is_empty());
        assert_eq!(result.summary(), &ScanSummary::default());
        assert!(result.by_object(SyncFilter::ALL).is_empty());
        assert!(result.by_script(SyncFilter::ALL).is_empty());
    }

    #[test]
    fn unreadable_component_counts_as_unknown() {
        let result = scan_snapshot(
            SceneSnapshot::new("s")
                .object(1, "A", None)
                .component(behaviour(1, 1, 1).unreadable())
                .component(behaviour(2, 1, 1)),
        );
        let s = result.summary();
        assert_eq!((s.unknown, s.continuous), (1, 1));
        assert!(close(s.scene_kbps, (36.0 + 360.0) / 1024.0));
    }

    #[test]
    fn framework_breakdown_sorted_by_count() {
        let result = scan_snapshot(
            SceneSnapshot::new("s")
                .object(1, "A", None)
                .component(ComponentEntry::new(1, 1, "VRCMirrorReflection"))
                .component(ComponentEntry::new(2, 1, "VRCStation"))
                .component(ComponentEntry::new(3, 1, "VRCStation"))
                .component(ComponentEntry::new(4, 1, "VRCSpatialAudioSource")),
        );
        let s = result.summary();
        assert_eq!(
            s.framework_breakdown(),
            vec![
                ("VRCStation", 2),
                ("VRCMirrorReflection", 1),
                ("VRCSpatialAudioSource", 1)
            ]
        );
        assert_eq!((s.built_in, s.vrc_managed), (2, 2));
        assert_eq!(s.primary_total, 0);
    }

    #[test]
    fn rescanning_is_idempotent() {
        let h = host(small_world());
        let config = ProfilerConfig::default();
        let first = scan(&h, &config);
        let second = scan(&h, &config);
        assert_eq!(first.objects(), second.objects());
        assert_eq!(first.summary(), second.summary());
    }
}
