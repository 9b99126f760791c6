use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("{kind} {id} references missing {target_kind} {target}")]
    DanglingReference {
        kind: &'static str,
        id: u32,
        target_kind: &'static str,
        target: u32,
    },

    #[error("object {0} is its own ancestor")]
    ParentCycle(u32),

    #[error("snapshot has no file path; use save_as")]
    NoPath,
}
