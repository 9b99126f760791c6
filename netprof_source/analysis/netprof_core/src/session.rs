use ahash::AHashMap;
use netprof_project::ProfilerConfig;
use netprof_reflect::Host;

use crate::aggregate::{ObjectView, ScriptKey, ScriptSummary};
use crate::mutation::{ApplyOutcome, ApplyRequest, apply_mode};
use crate::scan::{ScanResult, scan};
use crate::sync_mode::{SyncFilter, SyncTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Summary,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailsView {
    #[default]
    ByObject,
    ByScript,
}

/// Result of [`Session::apply`]. The session already holds the rescanned result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Declined,
    NotFound,
    Applied { written: usize, skipped: usize },
}

impl ApplyStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ApplyStatus::Applied { .. })
    }
}

/// Host plus the last scan and the user's view preferences. Preferences are inputs to
/// the views only; scans and edits never change them.
pub struct Session<H: Host> {
    host: H,
    config: ProfilerConfig,
    result: Option<ScanResult>,

    pub filter: SyncFilter,
    pub view: ViewMode,
    pub details: DetailsView,
    selections: AHashMap<ScriptKey, SyncTarget>,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, config: ProfilerConfig) -> Self {
        Self {
            host,
            config,
            result: None,
            filter: SyncFilter::ALL,
            view: ViewMode::default(),
            details: DetailsView::default(),
            selections: AHashMap::new(),
        }
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct host access. Drops the current result, since it may no longer match.
    pub fn host_mut(&mut self) -> &mut H {
        self.result = None;
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    #[inline]
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Full rescan, replacing any previous result.
    pub fn analyze(&mut self) -> &ScanResult {
        self.result.insert(scan(&self.host, &self.config))
    }

    #[inline]
    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    pub fn by_object(&self) -> Vec<ObjectView<'_>> {
        match &self.result {
            Some(result) => result.by_object(self.filter),
            None => Vec::new(),
        }
    }

    pub fn by_script(&self) -> Vec<ScriptSummary<'_>> {
        match &self.result {
            Some(result) => result.by_script(self.filter),
            None => Vec::new(),
        }
    }

    pub fn is_bulk_editable(&self, summary: &ScriptSummary<'_>) -> bool {
        summary.is_bulk_editable(&self.host)
    }

    /// Target picked for `key`, defaulting to `None` the first time it is asked for.
    pub fn selection_for(&mut self, key: &ScriptKey) -> SyncTarget {
        *self.selections.entry(key.clone()).or_default()
    }

    pub fn select(&mut self, key: &ScriptKey, target: SyncTarget) {
        self.selections.insert(key.clone(), target);
    }

    /// Confirm, write and rescan as one step. Scans first if nothing was analyzed yet.
    pub fn apply<F>(&mut self, key: &ScriptKey, target: SyncTarget, confirm: F) -> ApplyStatus
    where
        F: FnOnce(&ApplyRequest) -> bool,
    {
        let current = match self.result.take() {
            Some(result) => result,
            None => scan(&self.host, &self.config),
        };
        let outcome = apply_mode(
            &mut self.host,
            &self.config,
            current,
            key,
            target,
            self.filter,
            confirm,
        );
        let status = match &outcome {
            ApplyOutcome::Declined(_) => ApplyStatus::Declined,
            ApplyOutcome::NotFound(_) => ApplyStatus::NotFound,
            ApplyOutcome::Applied {
                written, skipped, ..
            } => ApplyStatus::Applied {
                written: *written,
                skipped: *skipped,
            },
        };
        self.result = Some(outcome.into_result());
        status
    }

    /// [`Session::apply`] with the stored selection for `key`.
    pub fn apply_selection<F>(&mut self, key: &ScriptKey, confirm: F) -> ApplyStatus
    where
        F: FnOnce(&ApplyRequest) -> bool,
    {
        let target = self.selection_for(key);
        self.apply(key, target, confirm)
    }
}

#[cfg(test)]
mod tests {
    use netprof_ids::ComponentID;
    use netprof_snapshot::SnapshotHost;
    use std::sync::Arc;

    use super::*;
    use crate::sync_mode::SyncCategory;
    use crate::test_scenes::{host, small_world};

    fn session() -> Session<SnapshotHost> {
        Session::new(host(small_world()), ProfilerConfig::default())
    }

    fn door() -> ScriptKey {
        ScriptKey::Asset(netprof_ids::AssetID::from_u32(100))
    }

    #[test]
    fn views_are_empty_before_analyze() {
        let mut s = session();
        assert!(s.result().is_none());
        assert!(s.by_object().is_empty());
        assert!(s.by_script().is_empty());

        s.analyze();
        assert_eq!(s.by_object().len(), 3);
        assert_eq!(s.by_script().len(), 3);
    }

    #[test]
    fn filter_is_a_view_preference() {
        let mut s = session();
        s.analyze();
        s.filter = SyncFilter::ALL.without(SyncCategory::BuiltIn);
        assert_eq!(s.by_script().len(), 2);
        assert_eq!(s.result().map(|r| r.summary().built_in), Some(1));
    }

    #[test]
    fn selections_default_to_none() {
        let mut s = session();
        assert_eq!(s.selection_for(&door()), SyncTarget::None);
        s.select(&door(), SyncTarget::Manual);
        assert_eq!(s.selection_for(&door()), SyncTarget::Manual);
        assert_eq!(s.view, ViewMode::Summary);
        assert_eq!(s.details, DetailsView::ByObject);
    }

    #[test]
    fn apply_selection_writes_and_rescans() {
        let mut s = session();
        s.analyze();
        s.select(&door(), SyncTarget::Manual);

        let status = s.apply_selection(&door(), |request| request.instance_count == 1);
        assert_eq!(status, ApplyStatus::Applied { written: 1, skipped: 0 });
        assert!(status.is_success());

        let summary = s.result().map(|r| r.summary().clone()).unwrap();
        assert_eq!((summary.continuous, summary.manual), (0, 2));
        assert_eq!(s.host().selected_label(ComponentID::from_u32(10), "syncMethod"), Some("Manual"));
    }

    #[test]
    fn apply_without_prior_scan() {
        let mut s = session();
        let status = s.apply(&door(), SyncTarget::None, |_| false);
        assert_eq!(status, ApplyStatus::Declined);
        assert!(s.result().is_some());
        assert!(!s.host().is_dirty());
    }

    #[test]
    fn apply_unknown_key() {
        let mut s = session();
        s.analyze();
        let status = s.apply(&ScriptKey::Type(Arc::from("Ghost")), SyncTarget::None, |_| true);
        assert_eq!(status, ApplyStatus::NotFound);
        assert!(!status.is_success());
    }

    #[test]
    fn bulk_editability_goes_through_the_host() {
        let mut s = session();
        s.analyze();
        let editable: Vec<_> = s.by_script().iter().map(|summary| s.is_bulk_editable(summary)).collect();
        assert_eq!(editable, [true, false, true]);

        s.host_mut();
        assert!(s.result().is_none());
    }
}
