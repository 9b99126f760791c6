//! Plain-text views over a scan. Everything returns a `String` so the binary only
//! decides where it goes.

use std::fmt::Write;

use netprof_core::{ScanResult, SyncFilter};
use netprof_reflect::SceneSource;

pub fn summary(result: &ScanResult) -> String {
    let s = result.summary();
    let rates = result.estimator().config();
    let mut out = String::new();

    let _ = writeln!(out, "Behaviour Summary");
    let _ = writeln!(out, "  Total behaviours:      {}", s.primary_total);
    let _ = writeln!(out, "  By sync mode:");
    let _ = writeln!(out, "    Continuous:          {}", s.continuous);
    let _ = writeln!(out, "    Manual:              {}", s.manual);
    let _ = writeln!(out, "    None:                {}", s.none);
    let _ = writeln!(out, "    VRC Managed:         {}", s.vrc_managed);
    let _ = writeln!(out, "    Built-in Sync:       {}", s.built_in);
    let _ = writeln!(out, "    Unknown:             {}", s.unknown);
    let _ = writeln!(out, "  Total synced vars:     {}", s.synced_variables);

    let _ = writeln!(out);
    let _ = writeln!(out, "Framework Components");
    let _ = writeln!(out, "  Total:                 {}", s.framework_total);
    for (name, count) in s.framework_breakdown() {
        let _ = writeln!(out, "    {name}: {count}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Network Intensity Estimate");
    let _ = writeln!(
        out,
        "  Intensity score: {:.1}/100 ({})",
        s.intensity,
        s.rating.label()
    );
    let _ = writeln!(out, "  Estimated bandwidth: {:.1} kbps (approx.)", s.scene_kbps);
    let _ = writeln!(
        out,
        "  Assumes continuous ~{}Hz, manual ~{}Hz; {}B base + {}B/var",
        rates.continuous_rate_hz,
        rates.manual_rate_hz,
        rates.base_bytes_per_update,
        rates.bytes_per_synced_var
    );
    if s.high_continuous_advisory {
        let _ = writeln!(
            out,
            "\nWarning: {} continuous sync behaviours detected. This may cause high network traffic.",
            s.continuous
        );
    }
    out
}

pub fn objects(result: &ScanResult, filter: SyncFilter) -> String {
    let mut out = String::new();
    let views = result.by_object(filter);
    if views.is_empty() {
        let _ = writeln!(out, "No objects match the current filter.");
        return out;
    }
    for view in views {
        let _ = writeln!(
            out,
            "{}  [{}]  components: {}  score: {:.1}  kbps: {:.1}",
            view.object.name,
            view.object.path,
            view.object.components.len(),
            view.intensity,
            view.kbps
        );
        for record in view.visible {
            let _ = writeln!(out, "  [{}] Sync: {}", record.type_name, record.mode);
            if !record.variables.is_empty() {
                let _ = writeln!(out, "    Synced variables ({}):", record.variables.len());
                for variable in &record.variables {
                    let _ = writeln!(out, "      - {variable}");
                }
            }
            if let Some(path) = record.program_source_path() {
                let _ = writeln!(out, "    Program path: {path}");
            }
        }
    }
    out
}

pub fn scripts(result: &ScanResult, filter: SyncFilter, source: &dyn SceneSource) -> String {
    let mut out = String::new();
    let summaries = result.by_script(filter);
    if summaries.is_empty() {
        let _ = writeln!(out, "No scripts match the current filter.");
        return out;
    }
    for summary in summaries {
        let editable = if summary.is_bulk_editable(source) {
            "editable"
        } else {
            "read-only"
        };
        let _ = writeln!(
            out,
            "{}  instances: {}  kbps: {:.1}  {}",
            summary.display_name, summary.instance_count, summary.bandwidth_kbps, editable
        );
        let _ = writeln!(out, "  key: {}", summary.key);
        if !summary.tooltip.is_empty() {
            let _ = writeln!(out, "  path: {}", summary.tooltip);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use netprof_core::{ProfilerConfig, SyncCategory, scan};
    use netprof_snapshot::{ComponentEntry, SceneSnapshot, SnapshotHost, ValueEntry};

    use super::*;

    fn host() -> SnapshotHost {
        let mut snapshot = SceneSnapshot::new("Test")
            .asset(1, "Spinner", "Assets/Spinner.asset")
            .object(1, "Root", None)
            .object(2, "Spinner", Some(1))
            .component(ComponentEntry::new(50, 1, "VRCPickup"));
        for id in 0..11 {
            snapshot = snapshot.component(
                ComponentEntry::new(100 + id, 2, "UdonBehaviour")
                    .property(
                        "syncMethod",
                        ValueEntry::enumeration(["None", "Continuous", "Manual"], 1),
                    )
                    .property("programSource", ValueEntry::asset(1)),
            );
        }
        SnapshotHost::new(snapshot).unwrap()
    }

    #[test]
    fn summary_lists_counts_and_warning() {
        let text = summary(&scan(&host(), &ProfilerConfig::default()));
        assert!(text.contains("Total behaviours:      11"));
        assert!(text.contains("VRCPickup: 1"));
        assert!(text.contains("(Very Low)"));
        assert!(text.contains("Warning: 11 continuous sync behaviours detected."));
    }

    #[test]
    fn objects_view_respects_filter() {
        let result = scan(&host(), &ProfilerConfig::default());
        let all = objects(&result, SyncFilter::ALL);
        assert!(all.starts_with("Spinner  [Root/Spinner]"));
        assert!(all.contains("Program path: Assets/Spinner.asset"));

        let none = objects(&result, SyncFilter::EMPTY.with(SyncCategory::Manual));
        assert_eq!(none, "No objects match the current filter.\n");
    }

    #[test]
    fn scripts_view_marks_editability() {
        let h = host();
        let result = scan(&h, &ProfilerConfig::default());
        let text = scripts(&result, SyncFilter::ALL, &h);
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Spinner  instances: 11"));
        assert!(text.contains("VRCPickup  instances: 1  kbps: 0.2  read-only"));
        assert!(text.contains("key: type:VRCPickup"));
    }
}
