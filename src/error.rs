// Classified failure modes of one compiler run. No stringly-typed errors past
// the CLI boundary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The collection document failed structural validation. Problems are
    /// batched so the caller sees every one, not just the first.
    #[error("invalid collection: {}", .0.join("; "))]
    Structural(Vec<String>),

    /// An environment document was supplied but is malformed. The caller
    /// opted in explicitly, so this aborts the run.
    #[error("invalid environment: {}", .0.join("; "))]
    Environment(Vec<String>),

    /// A single generated file or directory could not be written. Carries the
    /// path so partial output on disk can be diagnosed.
    #[error("failed to write {path}: {source}")]
    Emission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompileError>;
