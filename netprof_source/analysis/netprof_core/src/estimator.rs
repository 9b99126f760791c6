//! Coarse bandwidth model. Figures are advisory, for ranking what to look at
//! first; nothing here observes real traffic.
//!
//! `bytes_per_update = base + effective_vars * bytes_per_var`,
//! `kbps = rate_hz(mode) * bytes_per_update / 1024`.

use netprof_project::EstimatorConfig;

use crate::index::{ComponentRecord, SceneObjectNode};
use crate::sync_mode::SyncCategory;

pub const BYTES_PER_KILOBYTE: f64 = 1024.0;
pub const INTENSITY_PER_KBPS: f64 = 2.0;
pub const MAX_INTENSITY: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn rate_hz(&self, category: SyncCategory) -> f64 {
        match category {
            SyncCategory::Continuous => self.config.continuous_rate_hz,
            SyncCategory::Manual => self.config.manual_rate_hz,
            SyncCategory::BuiltIn => self.config.built_in_rate_hz,
            SyncCategory::None => 0.0,
            SyncCategory::VrcManaged | SyncCategory::Unknown => self.config.managed_rate_hz,
        }
    }

    /// Known count when there is one, otherwise a per-family guess.
    pub fn effective_variable_count(&self, record: &ComponentRecord) -> usize {
        let known = record.synced_variable_count();
        if known > 0 {
            return known;
        }
        if record.is_primary() {
            return 1;
        }
        if record.category() == SyncCategory::BuiltIn {
            return 2;
        }
        1
    }

    pub fn component_kbps(&self, record: &ComponentRecord) -> f64 {
        let vars = self.effective_variable_count(record) as f64;
        let bytes_per_update =
            self.config.base_bytes_per_update + vars * self.config.bytes_per_synced_var;
        self.rate_hz(record.category()) * bytes_per_update / BYTES_PER_KILOBYTE
    }

    pub fn object_kbps(&self, object: &SceneObjectNode) -> f64 {
        object.components.iter().map(|c| self.component_kbps(c)).sum()
    }

    pub fn scene_kbps<'a, I>(&self, objects: I) -> f64
    where
        I: IntoIterator<Item = &'a SceneObjectNode>,
    {
        objects.into_iter().map(|o| self.object_kbps(o)).sum()
    }
}

/// `clamp(kbps * 2, 0, 100)`.
pub fn intensity_score(kbps: f64) -> f64 {
    (kbps * INTENSITY_PER_KBPS).clamp(0.0, MAX_INTENSITY)
}

/// Advisory bands over the intensity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntensityRating {
    #[default]
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl IntensityRating {
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            Self::VeryLow
        } else if score < 40.0 {
            Self::Low
        } else if score < 60.0 {
            Self::Moderate
        } else if score < 80.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}
