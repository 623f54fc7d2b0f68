//! Memory log: an append-only JSON-lines file of things the user asked
//! James to remember.
//!
//! One [`MemoryRecord`] per line, in append order. Records are never updated
//! or deleted. [`MemoryLog`] is cheaply cloneable; all clones share one write
//! lock so concurrent appends never interleave within a line.

mod log;
mod record;

pub use log::MemoryLog;
pub use record::{MemoryHistory, MemoryRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode memory record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("memory task failed: {0}")]
    Task(String),
}
