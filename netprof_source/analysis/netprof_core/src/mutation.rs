//! Bulk sync-mode edits for one script group: confirm, write, rescan.

use netprof_ids::ComponentID;
use netprof_project::{ClassifierConfig, ProfilerConfig};
use netprof_reflect::{ComponentReflector, Host, Property, ReflectError};
use std::sync::Arc;

use crate::aggregate::ScriptKey;
use crate::classifier::is_sync_enum;
use crate::scan::{ScanResult, scan};
use crate::sync_mode::{SyncFilter, SyncTarget, is_sync_mode};

/// Undo step name recorded for each write.
pub const SET_SYNC_MODE: &str = "Set Sync Mode";

/// What the caller is asked to confirm before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRequest {
    pub key: ScriptKey,
    pub display_name: String,
    pub target: SyncTarget,
    pub instance_count: usize,
}

impl ApplyRequest {
    pub fn prompt(&self) -> String {
        format!(
            "Set sync mode to {} for all {} instances of '{}' in the scene?",
            self.target, self.instance_count, self.display_name
        )
    }
}

#[derive(Debug)]
pub enum ApplyOutcome {
    /// Confirmation refused. The scan passed in comes back untouched.
    Declined(ScanResult),
    /// No visible group has this key. Nothing written, no rescan.
    NotFound(ScanResult),
    /// Confirmed. `written` may be zero; the scan is always fresh.
    Applied {
        written: usize,
        skipped: usize,
        result: ScanResult,
    },
}

impl ApplyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }

    pub fn result(&self) -> &ScanResult {
        match self {
            ApplyOutcome::Declined(result) | ApplyOutcome::NotFound(result) => result,
            ApplyOutcome::Applied { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ScanResult {
        match self {
            ApplyOutcome::Declined(result) | ApplyOutcome::NotFound(result) => result,
            ApplyOutcome::Applied { result, .. } => result,
        }
    }
}

/// Writes `target` to every live primary behaviour in the group `key`, then rescans.
///
/// `current` is consumed: once anything is written its records no longer describe the
/// host. The group is looked up under `filter`, matching what the caller was shown.
pub fn apply_mode<H, F>(
    host: &mut H,
    config: &ProfilerConfig,
    current: ScanResult,
    key: &ScriptKey,
    target: SyncTarget,
    filter: SyncFilter,
    confirm: F,
) -> ApplyOutcome
where
    H: Host,
    F: FnOnce(&ApplyRequest) -> bool,
{
    let found = current
        .by_script(filter)
        .into_iter()
        .find(|s| &s.key == key)
        .map(|summary| {
            let request = ApplyRequest {
                key: key.clone(),
                display_name: summary.display_name.clone(),
                target,
                instance_count: summary.instance_count,
            };
            let targets: Vec<ComponentID> = summary
                .components
                .iter()
                .filter(|c| c.is_primary())
                .map(|c| c.component)
                .collect();
            (request, targets)
        });
    let Some((request, targets)) = found else {
        log::warn!("apply {target}: no script group `{key}` in the current view");
        return ApplyOutcome::NotFound(current);
    };

    if !confirm(&request) {
        return ApplyOutcome::Declined(current);
    }
    drop(current);

    let mut written = 0;
    let mut skipped = 0;
    for component in targets {
        if !host.is_live(component) {
            log::warn!("component {component}: no longer live, skipped");
            skipped += 1;
            continue;
        }
        match set_sync_mode(host, &config.classifier, component, target) {
            Ok(true) => written += 1,
            Ok(false) => {
                log::warn!("component {component}: no `{target}` option on a sync selector");
                skipped += 1;
            }
            Err(err) => {
                log::warn!("component {component}: write failed, skipped: {err}");
                skipped += 1;
            }
        }
    }

    log::info!(
        "apply {target} to `{}`: {written} written, {skipped} skipped",
        request.display_name
    );

    ApplyOutcome::Applied {
        written,
        skipped,
        result: scan(&*host, config),
    }
}

/// One reversible write. `Ok(false)` when there is no selector or no matching option.
pub fn set_sync_mode<H: Host>(
    host: &mut H,
    config: &ClassifierConfig,
    component: ComponentID,
    target: SyncTarget,
) -> Result<bool, ReflectError> {
    let Some(selector) = resolve_selector(&*host, config, component)? else {
        return Ok(false);
    };
    let Some(index) = selector
        .value
        .enum_labels()
        .and_then(|labels| find_option_index(labels, target.label()))
    else {
        return Ok(false);
    };

    let name = selector.name;
    host.with_reversible_edit(component, SET_SYNC_MODE, |h| {
        h.set_enum_index(component, &name, index)?;
        h.commit(component)?;
        Ok(true)
    })
}

/// Writable sync selector: the named property when present (only if it is an enum),
/// else the first visible enum whose name mentions "sync" and which offers none,
/// manual and continuous.
pub fn resolve_selector(
    reflector: &dyn ComponentReflector,
    config: &ClassifierConfig,
    component: ComponentID,
) -> Result<Option<Property>, ReflectError> {
    if let Some(property) = reflector.named_property(component, &config.sync_property_names)? {
        return Ok(property.is_enum().then_some(property));
    }
    Ok(reflector
        .properties(component)?
        .into_iter()
        .find(|p| is_sync_enum(p) && has_mode_options(p)))
}

fn has_mode_options(property: &Property) -> bool {
    let Some(labels) = property.value.enum_labels() else {
        return false;
    };
    ["none", "manual", "continuous"]
        .iter()
        .all(|mode| labels.iter().any(|label| is_sync_mode(label, mode)))
}

/// Exact case-insensitive label first, then the first label containing `target`.
pub fn find_option_index(labels: &[Arc<str>], target: &str) -> Option<usize> {
    labels
        .iter()
        .position(|label| label.eq_ignore_ascii_case(target))
        .or_else(|| labels.iter().position(|label| is_sync_mode(label, target)))
}
