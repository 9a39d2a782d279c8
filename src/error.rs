//! Crate-root error type.
//!
//! Adverse conditions that are local to one file, one row, or one
//! backend never bubble up here — they degrade to an empty result or an
//! undecrypted record and are logged. `EngineError` only covers the rare
//! catastrophic/programmer-error paths: an invalid query spec, or I/O so
//! broken (e.g. the home directory itself is unreadable) that no backend
//! could possibly proceed.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cookie spec is invalid: {reason}")]
    InvalidSpec { reason: String },

    #[error("could not resolve the current user's home directory")]
    NoHomeDirectory,

    #[error("catastrophic I/O failure: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
