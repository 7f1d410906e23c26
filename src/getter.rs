// src/getter.rs

//! Release sources
//!
//! A [`Getter`] abstracts one source of the three artifact kinds the
//! installer needs: the release index, a checksum manifest, and the binary
//! archive. The core holds getters as an ordered list and tries them in
//! turn; the first one that succeeds for a given kind wins. Transport,
//! authentication, and timeouts are entirely the getter's concern.

use crate::checksum::Checksummer;
use crate::error::{Error, Result};
use crate::filename::{FilenameError, PluginFilename};
use crate::protocol::ProtocolError;
use crate::requirement::{BinaryInstallationOptions, Requirement};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Artifact kind: the JSON release index.
pub const KIND_RELEASES: &str = "releases";

/// Artifact kind: the binary archive.
///
/// Checksum manifests are requested under the checksummer's type name
/// (typically `sha256`) instead of a fixed kind.
pub const KIND_ZIP: &str = "zip";

/// A source of release indexes, checksum manifests, and binary archives
pub trait Getter {
    /// Fetch one artifact kind. The returned stream is released when
    /// dropped, whether or not it was fully consumed.
    fn get(&self, kind: &str, opts: &GetOptions<'_>) -> Result<Box<dyn Read>>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "getter"
    }
}

impl<T: Getter + ?Sized> Getter for std::rc::Rc<T> {
    fn get(&self, kind: &str, opts: &GetOptions<'_>) -> Result<Box<dyn Read>> {
        self.as_ref().get(kind, opts)
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }
}

/// Parameters handed to a getter for a single fetch
#[derive(Debug)]
pub struct GetOptions<'a> {
    pub requirement: &'a Requirement,
    pub binary_installation_options: &'a BinaryInstallationOptions,

    /// Release version selected for this attempt; unset while the release
    /// index itself is being fetched.
    pub version: Option<Version>,
}

impl GetOptions<'_> {
    /// Display form of the selected version with the leading `v` used in
    /// filenames: `v1.2.3`. Empty while no version is selected.
    pub fn version_str(&self) -> String {
        match &self.version {
            Some(v) => format!("v{}", v),
            None => String::new(),
        }
    }

    /// The binary filename this host expects for the selected version,
    /// e.g. `packer-plugin-amazon_v1.2.3_linux_amd64`. Getters derive the
    /// artifact name they serve from it.
    pub fn expected_filename(&self) -> String {
        format!(
            "{}_{}{}",
            self.requirement.filename_prefix(),
            self.version_str(),
            self.binary_installation_options.filename_suffix()
        )
    }
}

/// One entry of a release index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
}

/// Parse a release index: a JSON array of `{"version": "..."}` objects.
pub fn parse_releases<R: Read>(reader: R) -> Result<Vec<Release>> {
    serde_json::from_reader(reader)
        .map_err(|e| Error::Parse(format!("could not parse release index: {e}")))
}

/// Reasons a checksum manifest entry is rejected for the current request
#[derive(Error, Debug)]
pub enum ChecksumEntryError {
    #[error(transparent)]
    Filename(#[from] FilenameError),

    #[error("wrong version, expected {expected}")]
    WrongVersion { expected: String },

    #[error("wrong system, expected {os}_{arch}")]
    WrongSystem { os: String, arch: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One line of a checksum manifest, binding a canonical filename to its
/// expected digest
///
/// The derived accessors become available after [`ChecksumFileEntry::init`]
/// has decoded the filename against the grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumFileEntry {
    pub filename: String,
    pub checksum: String,

    #[serde(skip)]
    parsed: Option<PluginFilename>,
}

impl ChecksumFileEntry {
    /// Decode `filename` against the grammar for the requested plugin.
    pub fn init(&mut self, opts: &GetOptions<'_>) -> std::result::Result<(), ChecksumEntryError> {
        let prefix = opts.requirement.filename_prefix();
        self.parsed = Some(PluginFilename::parse(&self.filename, &prefix)?);
        Ok(())
    }

    pub fn ext(&self) -> &str {
        self.parsed.as_ref().map_or("", |p| p.ext.as_str())
    }

    pub fn bin_version(&self) -> &str {
        self.parsed.as_ref().map_or("", |p| p.version.as_str())
    }

    pub fn prot_version(&self) -> &str {
        self.parsed.as_ref().map_or("", |p| p.protocol.as_str())
    }

    pub fn os(&self) -> &str {
        self.parsed.as_ref().map_or("", |p| p.os.as_str())
    }

    pub fn arch(&self) -> &str {
        self.parsed.as_ref().map_or("", |p| p.arch.as_str())
    }

    /// Check the decoded filename against the requested version, the host
    /// platform, and the host's wire protocol.
    pub fn validate(&self, opts: &GetOptions<'_>) -> std::result::Result<(), ChecksumEntryError> {
        if self.bin_version() != opts.version_str() {
            return Err(ChecksumEntryError::WrongVersion {
                expected: opts.version_str(),
            });
        }

        let binopts = opts.binary_installation_options;
        if self.os() != binopts.os || self.arch() != binopts.arch {
            return Err(ChecksumEntryError::WrongSystem {
                os: binopts.os.clone(),
                arch: binopts.arch.clone(),
            });
        }

        binopts.check_protocol_version(self.prot_version())?;
        Ok(())
    }
}

/// Parse a checksum manifest: a JSON array of `{"filename", "checksum"}`
/// objects.
pub fn parse_checksum_file_entries<R: Read>(reader: R) -> Result<Vec<ChecksumFileEntry>> {
    serde_json::from_reader(reader)
        .map_err(|e| Error::Parse(format!("could not parse checksum manifest: {e}")))
}

/// An artifact-bound verification job: the digest a named file must have,
/// and the algorithm that produced it
#[derive(Debug, Clone)]
pub struct FileChecksum {
    pub filename: String,
    pub expected: Vec<u8>,
    pub checksummer: Checksummer,
}
