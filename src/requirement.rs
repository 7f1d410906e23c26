// src/requirement.rs

//! Plugin requirements as declared in build configurations
//!
//! A configuration's `required_plugins` block produces one [`Requirement`]
//! per entry; from the list we check what is installed and what needs to
//! happen to reach the desired state. [`BinaryInstallationOptions`] carries
//! the host-side parameters that select which published binary fits this
//! machine.

use crate::checksum::Checksummer;
use crate::identifier::PluginIdentifier;
use crate::version::ConstraintSet;

/// A required plugin and the version constraints it must satisfy
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Accessor as written in the configuration, e.g. `amazon`.
    pub accessor: String,

    /// Fully-qualified source address, e.g. `github.com/hashicorp/amazon`.
    pub identifier: PluginIdentifier,

    /// Version constraints as defined by the user. The empty set matches
    /// every version; implicit requirements carry it.
    pub constraints: ConstraintSet,
}

impl Requirement {
    pub fn new(
        accessor: impl Into<String>,
        identifier: PluginIdentifier,
        constraints: ConstraintSet,
    ) -> Self {
        Self {
            accessor: accessor.into(),
            identifier,
            constraints,
        }
    }

    /// `packer-plugin-<type>`, the prefix of this plugin's binary and
    /// archive filenames.
    pub fn filename_prefix(&self) -> String {
        self.identifier.filename_prefix()
    }
}

/// The requirements of one build configuration, in declaration order.
pub type Requirements = Vec<Requirement>;

/// Host-side parameters selecting which published binary fits this machine
#[derive(Debug, Clone, Default)]
pub struct BinaryInstallationOptions {
    /// MAJOR version of the wire protocol spoken by this host.
    pub api_major: String,
    /// MINOR version of the wire protocol spoken by this host.
    pub api_minor: String,

    /// Target operating system, as spelled in release filenames.
    pub os: String,
    /// Target architecture, as spelled in release filenames.
    pub arch: String,

    /// Binary extension on the target host: `.exe` on Windows, empty
    /// elsewhere.
    pub ext: String,

    /// Digest algorithms accepted for verification, in preference order.
    /// At least one must be given for any binary to be trusted.
    pub checksummers: Vec<Checksummer>,
}

impl BinaryInstallationOptions {
    /// `_<os>_<arch><ext>`, the trailing part of every binary filename that
    /// fits this host.
    pub fn filename_suffix(&self) -> String {
        format!("_{}_{}{}", self.os, self.arch, self.ext)
    }
}
