// src/lib.rs

//! Quarry: plugin acquisition for a configuration-driven build tool
//!
//! Given declarative plugin requirements (source address + version
//! constraints), quarry discovers already-installed plugin binaries on disk
//! and, when a fresh one is wanted, resolves, downloads, verifies, extracts,
//! and installs it from one or more pluggable release sources.
//!
//! # Architecture
//!
//! - Checksum-gated: no binary is listed or installed without a digest that
//!   verifies, and no unverified byte is ever left in an executable location
//! - Canonical filenames: plugin identity, version, wire protocol, OS, and
//!   architecture are all encoded in the binary filename
//! - Pluggable sources: release indexes, checksum manifests, and archives
//!   are fetched through the `Getter` capability, tried in order
//! - One requirement at a time: no internal concurrency; callers serialize
//!   per plugin identifier

pub mod checksum;
pub mod discovery;
mod error;
pub mod filename;
pub mod getter;
pub mod identifier;
pub mod install;
pub mod protocol;
pub mod requirement;
pub mod version;

pub use checksum::{ChecksumError, Checksummer, HashAlgorithm};
pub use discovery::{InstallList, Installation, ListInstallationsOptions};
pub use error::{Error, Result};
pub use filename::{FilenameError, PluginFilename};
pub use getter::{
    ChecksumEntryError, ChecksumFileEntry, FileChecksum, GetOptions, Getter, Release,
    KIND_RELEASES, KIND_ZIP,
};
pub use identifier::{IdentifierError, PluginIdentifier};
pub use install::{InstallOptions, InstallOutcome};
pub use protocol::ProtocolError;
pub use requirement::{BinaryInstallationOptions, Requirement, Requirements};
pub use version::{Constraint, ConstraintSet, Version, VersionError};
