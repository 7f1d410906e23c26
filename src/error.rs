// src/error.rs

//! Central error type for plugin acquisition
//!
//! Discovery is best-effort: per-candidate failures (malformed filename,
//! constraint miss, incompatible protocol, missing sidecar) are logged and
//! skipped inside the scan loops and never surface here. Installation
//! surfaces the first fatal error through this enum; non-fatal failures
//! drive the getter fallback loops instead.

use crate::checksum::ChecksumError;
use crate::filename::FilenameError;
use crate::identifier::IdentifierError;
use crate::protocol::ProtocolError;
use crate::version::VersionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no release version found for the {plugin} plugin matching the constraint(s): {constraints}")]
    NoReleaseFound { plugin: String, constraints: String },

    #[error("could not find a local nor a remote checksum for plugin {0}")]
    ChecksumMissing(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Filename(#[from] FilenameError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}
