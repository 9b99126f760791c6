use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfilerError {
    #[error("unknown sync mode `{0}` (expected none, manual or continuous)")]
    UnknownTarget(String),

    #[error(
        "unknown filter category `{0}` (expected continuous, manual, none, vrc-managed, built-in or unknown)"
    )]
    UnknownFilter(String),
}
