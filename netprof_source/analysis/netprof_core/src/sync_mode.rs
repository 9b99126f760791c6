use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::ProfilerError;

pub const LABEL_UNKNOWN: &str = "Unknown";
pub const LABEL_VRC_MANAGED: &str = "VRC Managed";
pub const LABEL_BUILT_IN: &str = "Built-in Sync";

/// Case-insensitive substring test used everywhere a mode label is interpreted.
#[inline]
pub fn is_sync_mode(label: &str, expected: &str) -> bool {
    !label.is_empty() && label.to_lowercase().contains(&expected.to_lowercase())
}

/// Whether a label names one of the three selectable modes.
pub fn is_recognized_mode(label: &str) -> bool {
    is_sync_mode(label, "none") || is_sync_mode(label, "manual") || is_sync_mode(label, "continuous")
}

/// Mode as classified: the display label exactly as the host reported it.
/// Meaning is re-derived from the label through [`SyncCategory::of`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SyncMode(Arc<str>);

impl SyncMode {
    pub fn from_label(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    pub fn unknown() -> Self {
        Self::from_label(LABEL_UNKNOWN)
    }

    pub fn vrc_managed() -> Self {
        Self::from_label(LABEL_VRC_MANAGED)
    }

    pub fn built_in() -> Self {
        Self::from_label(LABEL_BUILT_IN)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn category(&self) -> SyncCategory {
        SyncCategory::of(&self.0)
    }
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set every label maps into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncCategory {
    Continuous,
    Manual,
    None,
    VrcManaged,
    BuiltIn,
    Unknown,
}

impl SyncCategory {
    pub const ALL: [SyncCategory; 6] = [
        SyncCategory::Continuous,
        SyncCategory::Manual,
        SyncCategory::None,
        SyncCategory::VrcManaged,
        SyncCategory::BuiltIn,
        SyncCategory::Unknown,
    ];

    /// First match wins: continuous, manual, none (substrings), then the two
    /// managed labels (exact, case-insensitive). A label containing both "manual"
    /// and "continuous" is Continuous.
    pub fn of(label: &str) -> Self {
        if is_sync_mode(label, "continuous") {
            return SyncCategory::Continuous;
        }
        if is_sync_mode(label, "manual") {
            return SyncCategory::Manual;
        }
        if is_sync_mode(label, "none") {
            return SyncCategory::None;
        }
        if label.eq_ignore_ascii_case(LABEL_VRC_MANAGED) {
            return SyncCategory::VrcManaged;
        }
        if label.eq_ignore_ascii_case(LABEL_BUILT_IN) {
            return SyncCategory::BuiltIn;
        }
        SyncCategory::Unknown
    }

    pub const fn filter(self) -> SyncFilter {
        match self {
            SyncCategory::Continuous => SyncFilter::CONTINUOUS,
            SyncCategory::Manual => SyncFilter::MANUAL,
            SyncCategory::None => SyncFilter::SYNC_NONE,
            SyncCategory::VrcManaged => SyncFilter::VRC_MANAGED,
            SyncCategory::BuiltIn => SyncFilter::BUILT_IN,
            SyncCategory::Unknown => SyncFilter::UNKNOWN,
        }
    }

    /// Lowercase name accepted by [`SyncFilter::parse_list`].
    pub const fn key(self) -> &'static str {
        match self {
            SyncCategory::Continuous => "continuous",
            SyncCategory::Manual => "manual",
            SyncCategory::None => "none",
            SyncCategory::VrcManaged => "vrc-managed",
            SyncCategory::BuiltIn => "built-in",
            SyncCategory::Unknown => "unknown",
        }
    }
}

/// Bitmask of visible categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncFilter(u8);

impl SyncFilter {
    pub const EMPTY: SyncFilter = SyncFilter(0);
    pub const CONTINUOUS: SyncFilter = SyncFilter(1 << 0);
    pub const MANUAL: SyncFilter = SyncFilter(1 << 1);
    pub const SYNC_NONE: SyncFilter = SyncFilter(1 << 2);
    pub const VRC_MANAGED: SyncFilter = SyncFilter(1 << 3);
    pub const BUILT_IN: SyncFilter = SyncFilter(1 << 4);
    pub const UNKNOWN: SyncFilter = SyncFilter(1 << 5);
    pub const ALL: SyncFilter = SyncFilter(0b0011_1111);

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn union(self, other: SyncFilter) -> SyncFilter {
        SyncFilter(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn contains(self, category: SyncCategory) -> bool {
        self.0 & category.filter().0 != 0
    }

    #[inline(always)]
    pub const fn with(self, category: SyncCategory) -> SyncFilter {
        SyncFilter(self.0 | category.filter().0)
    }

    #[inline(always)]
    pub const fn without(self, category: SyncCategory) -> SyncFilter {
        SyncFilter(self.0 & !category.filter().0)
    }

    #[inline]
    pub fn matches(self, mode: &SyncMode) -> bool {
        self.contains(mode.category())
    }

    /// Comma separated category keys (`continuous,manual`), or `all` / `none-selected`.
    pub fn parse_list(raw: &str) -> Result<SyncFilter, ProfilerError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(SyncFilter::ALL);
        }
        if raw.eq_ignore_ascii_case("none-selected") {
            return Ok(SyncFilter::EMPTY);
        }
        let mut filter = SyncFilter::EMPTY;
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let category = SyncCategory::ALL
                .into_iter()
                .find(|c| c.key().eq_ignore_ascii_case(part))
                .ok_or_else(|| ProfilerError::UnknownFilter(part.to_string()))?;
            filter = filter.with(category);
        }
        Ok(filter)
    }
}

impl Default for SyncFilter {
    fn default() -> Self {
        SyncFilter::ALL
    }
}

/// Modes a bulk edit can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncTarget {
    #[default]
    None,
    Manual,
    Continuous,
}

impl SyncTarget {
    pub const ALL: [SyncTarget; 3] = [SyncTarget::None, SyncTarget::Manual, SyncTarget::Continuous];

    pub const fn label(self) -> &'static str {
        match self {
            SyncTarget::None => "None",
            SyncTarget::Manual => "Manual",
            SyncTarget::Continuous => "Continuous",
        }
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SyncTarget {
    type Err = ProfilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SyncTarget::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProfilerError::UnknownTarget(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_substring_is_case_insensitive() {
        assert_eq!(SyncCategory::of("Continuous"), SyncCategory::Continuous);
        assert_eq!(SyncCategory::of("MANUAL"), SyncCategory::Manual);
        assert_eq!(SyncCategory::of("Sync: None"), SyncCategory::None);
        assert_eq!(SyncCategory::of("Legacy Continuous Sync"), SyncCategory::Continuous);
    }

    #[test]
    fn category_first_match_wins() {
        assert_eq!(SyncCategory::of("manual or continuous"), SyncCategory::Continuous);
        assert_eq!(SyncCategory::of("manual (none)"), SyncCategory::Manual);
    }

    #[test]
    fn category_managed_labels_are_exact() {
        assert_eq!(SyncCategory::of("VRC Managed"), SyncCategory::VrcManaged);
        assert_eq!(SyncCategory::of("vrc managed"), SyncCategory::VrcManaged);
        assert_eq!(SyncCategory::of("VRC Managed!"), SyncCategory::Unknown);
        assert_eq!(SyncCategory::of("built-in sync"), SyncCategory::BuiltIn);
        assert_eq!(SyncCategory::of("Built-in"), SyncCategory::Unknown);
    }

    #[test]
    fn category_unknown_fallbacks() {
        assert_eq!(SyncCategory::of(""), SyncCategory::Unknown);
        assert_eq!(SyncCategory::of("Unknown"), SyncCategory::Unknown);
        assert_eq!(SyncCategory::of("Fancy"), SyncCategory::Unknown);
    }

    #[test]
    fn mode_test_ignores_case_on_both_sides() {
        assert!(is_sync_mode("Sync Continuous", "Continuous"));
        assert!(is_sync_mode("sync manual", "MANUAL"));
        assert!(!is_sync_mode("", "None"));
    }

    #[test]
    fn recognized_modes() {
        assert!(is_recognized_mode("None"));
        assert!(is_recognized_mode("Continuous"));
        assert!(!is_recognized_mode("Managed"));
        assert!(!is_recognized_mode(""));
    }

    #[test]
    fn mode_label_is_preserved() {
        let mode = SyncMode::from_label("Manual Sync (Legacy)");
        assert_eq!(mode.label(), "Manual Sync (Legacy)");
        assert_eq!(mode.category(), SyncCategory::Manual);
        assert_eq!(SyncMode::default().category(), SyncCategory::Unknown);
    }

    #[test]
    fn filter_bits() {
        let f = SyncFilter::EMPTY
            .with(SyncCategory::Continuous)
            .with(SyncCategory::BuiltIn);
        assert!(f.contains(SyncCategory::Continuous));
        assert!(f.contains(SyncCategory::BuiltIn));
        assert!(!f.contains(SyncCategory::Manual));
        assert!(!f.without(SyncCategory::Continuous).contains(SyncCategory::Continuous));
        for category in SyncCategory::ALL {
            assert!(SyncFilter::ALL.contains(category));
            assert!(!SyncFilter::EMPTY.contains(category));
        }
        assert_eq!(SyncFilter::default(), SyncFilter::ALL);
    }

    #[test]
    fn filter_parse_list() {
        let f = SyncFilter::parse_list("continuous, Manual").unwrap();
        assert_eq!(f, SyncFilter::CONTINUOUS.union(SyncFilter::MANUAL));
        assert_eq!(SyncFilter::parse_list("all").unwrap(), SyncFilter::ALL);
        assert!(SyncFilter::parse_list("none-selected").unwrap().is_empty());
        assert!(matches!(
            SyncFilter::parse_list("continuous,bogus"),
            Err(ProfilerError::UnknownFilter(p)) if p == "bogus"
        ));
    }

    #[test]
    fn target_from_str() {
        assert_eq!("continuous".parse::<SyncTarget>().unwrap(), SyncTarget::Continuous);
        assert_eq!(" None ".parse::<SyncTarget>().unwrap(), SyncTarget::None);
        assert!("sometimes".parse::<SyncTarget>().is_err());
        assert_eq!(SyncTarget::default(), SyncTarget::None);
    }
}
