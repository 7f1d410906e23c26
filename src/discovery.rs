// src/discovery.rs

//! Discovery of already-installed plugin binaries
//!
//! Scans the configured plugin folders for binaries whose filename decodes
//! against the grammar, whose version satisfies the requirement, whose wire
//! protocol is negotiable, and whose on-disk checksum verifies against a
//! sidecar file. Discovery is best-effort: every per-file failure is logged
//! and the file skipped, the scan itself never fails.

use crate::error::{Error, Result};
use crate::filename::PluginFilename;
use crate::requirement::{BinaryInstallationOptions, Requirement};
use crate::version::Version;
use std::fmt;
use std::path::PathBuf;
use tracing::{trace, warn};

/// A concrete on-disk binary satisfying a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// Path to the installed binary, e.g.
    /// `<root>/github.com/hashicorp/amazon/packer-plugin-amazon_v1.2.3_x5.0_linux_amd64`
    pub binary_path: PathBuf,

    /// Version display string, including the leading `v`: `v1.2.3`
    pub version: String,
}

impl fmt::Display for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.binary_path.display())
    }
}

/// Installed binaries, ascending by version precedence, one per version
///
/// Use [`Requirement::list_installations`] to obtain one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallList(Vec<Installation>);

impl InstallList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping the list sorted by version precedence and unique per
    /// version. A version already present is kept and the new entry dropped,
    /// so among folders scanned in order the earliest takes precedence;
    /// folders close to the working directory are scanned first, which is
    /// what plugin development wants.
    pub fn insert_sorted_uniq(&mut self, install: Installation) {
        let key = Version::parse(&install.version).ok();
        let before = |existing: &Installation| match (&key, Version::parse(&existing.version).ok())
        {
            (Some(key), Some(existing)) => existing < *key,
            _ => existing.version.as_str() < install.version.as_str(),
        };

        let pos = self.0.partition_point(before);
        if let Some(existing) = self.0.get(pos) {
            let duplicate = match (&key, Version::parse(&existing.version).ok()) {
                (Some(key), Some(existing)) => existing == *key,
                _ => existing.version == install.version,
            };
            if duplicate {
                return;
            }
        }
        self.0.insert(pos, install);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Installation> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Installation> {
        self.0.get(index)
    }
}

impl fmt::Display for InstallList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, install) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", install)?;
        }
        write!(f, "]")
    }
}

impl IntoIterator for InstallList {
    type Item = Installation;
    type IntoIter = std::vec::IntoIter<Installation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstallList {
    type Item = &'a Installation;
    type IntoIter = std::slice::Iter<'a, Installation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Options for scanning installed plugins
#[derive(Debug, Clone, Default)]
pub struct ListInstallationsOptions {
    /// Folders plugins may be installed in, scanned in order. The earliest
    /// folder wins when the same version appears more than once.
    pub from_folders: Vec<PathBuf>,

    pub binary_installation_options: BinaryInstallationOptions,
}

impl Requirement {
    /// List unique installed versions of this plugin, filtered by the host
    /// options
    ///
    /// Binaries are matched by filename grammar, version constraints,
    /// protocol compatibility, and finally the checksum gate: at least one
    /// of the configured checksummers must find a sidecar digest that
    /// verifies, otherwise the binary is considered unsafe and skipped.
    pub fn list_installations(&self, opts: &ListInstallationsOptions) -> Result<InstallList> {
        let mut res = InstallList::new();
        let prefix = self.filename_prefix();
        let suffix = opts.binary_installation_options.filename_suffix();

        trace!(
            "listing potential installations for {} matching {}",
            self.identifier.for_display(),
            self.constraints
        );

        for folder in &opts.from_folders {
            let pattern = folder
                .join(self.identifier.install_subpath())
                .join(format!("{prefix}*{suffix}"));
            let pattern = pattern.to_string_lossy().into_owned();

            let matches = glob::glob(&pattern).map_err(|e| {
                Error::Io(format!(
                    "{}: failed to list binaries in folder: {e}",
                    self.identifier
                ))
            })?;

            for entry in matches {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        trace!("skipping unreadable path: {e}");
                        continue;
                    }
                };
                let Some(fname) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                let parsed = match PluginFilename::parse(fname, &prefix) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        trace!("found {} with an unexpected name, ignoring it: {e}", path.display());
                        continue;
                    }
                };

                let version = match Version::parse(&parsed.version) {
                    Ok(version) => version,
                    Err(e) => {
                        trace!(
                            "found {} with an incorrect {} version, ignoring it: {e}",
                            path.display(),
                            parsed.version
                        );
                        continue;
                    }
                };

                // no constraint means always pass, this will happen for
                // implicit plugin requirements
                if !self.constraints.check(&version) {
                    trace!(
                        "version {} of file {} does not match constraint {}",
                        parsed.version,
                        path.display(),
                        self.constraints
                    );
                    continue;
                }

                if let Err(e) = opts
                    .binary_installation_options
                    .check_protocol_version(&parsed.protocol)
                {
                    warn!(
                        "binary {} requires protocol version {} that is incompatible with this host: {e}",
                        path.display(),
                        parsed.protocol
                    );
                    continue;
                }

                let mut checksum_ok = false;
                for checksummer in &opts.binary_installation_options.checksummers {
                    let expected = match checksummer.checksum_of_file(&path) {
                        Ok(expected) => expected,
                        Err(e) => {
                            trace!("no {} checksum for {}: {e}", checksummer, path.display());
                            continue;
                        }
                    };
                    if let Err(e) = checksummer.checksum_file(&expected, &path) {
                        trace!(
                            "{} checksum of {} does not verify: {e}",
                            checksummer,
                            path.display()
                        );
                        continue;
                    }
                    checksum_ok = true;
                    break;
                }
                if !checksum_ok {
                    trace!(
                        "no checksum found for {}, ignoring possibly unsafe binary",
                        path.display()
                    );
                    continue;
                }

                res.insert_sorted_uniq(Installation {
                    binary_path: path,
                    version: parsed.version.clone(),
                });
            }
        }

        Ok(res)
    }
}
