// src/error.rs

//! Crate-level error type for contract-level faults
//!
//! Expected resolution failures (missing dependencies, cycles, version
//! conflicts) are never surfaced through this type; they are accumulated as
//! [`crate::issue::ResolutionIssue`] values and returned as data. `Error`
//! covers only the faults that break the engine's contracts: malformed
//! version or range text, extraction cache I/O, and failures reported by a
//! candidate's resource callbacks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur at the engine's contract boundaries
#[derive(Error, Debug)]
pub enum Error {
    /// Version text could not be parsed
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// Version range text could not be parsed
    #[error("Invalid version range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// A named resource does not exist inside an archive
    ///
    /// Candidate implementations return this for absent resources so the
    /// engine can distinguish "not declared" from a real read failure.
    #[error("Resource '{path}' not found in archive '{archive}'")]
    ResourceNotFound { archive: String, path: String },

    /// Reading a resource that was supposed to exist failed
    #[error("Failed to read '{path}' from archive '{archive}': {source}")]
    ResourceRead {
        archive: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing an embedded archive into the extraction cache failed
    #[error("Failed to extract embedded archive to '{path}': {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when this error is the not-found signal from a resource read
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
