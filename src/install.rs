// src/install.rs

//! End-to-end plugin installation
//!
//! [`Requirement::install_latest`] resolves the newest release satisfying a
//! requirement, then walks candidate versions newest first. For each
//! candidate it locates a checksum-manifest entry that fits this host,
//! short-circuits if a verified binary is already on disk, downloads the
//! archive from the first getter whose bytes match the expected digest,
//! extracts the binary entry, and persists it together with a sidecar
//! checksum file.
//!
//! No unverified byte is ever left in place of a plugin binary: the archive
//! is verified in a temporary file before extraction, and a failed
//! verification truncates that file before the next getter is tried.

use crate::discovery::Installation;
use crate::error::{Error, Result};
use crate::filename::strip_archive_ext;
use crate::getter::{
    parse_checksum_file_entries, parse_releases, FileChecksum, GetOptions, Getter, KIND_RELEASES,
    KIND_ZIP,
};
use crate::requirement::{BinaryInstallationOptions, Requirement};
use crate::version::Version;
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Options for installing the newest plugin satisfying a requirement
pub struct InstallOptions {
    /// Sources for release indexes, checksum manifests, and archives,
    /// tried in order.
    pub getters: Vec<Box<dyn Getter>>,

    /// Folders plugins may live in. The downloaded binary and its sidecar
    /// checksum go in the last one.
    pub in_folders: Vec<PathBuf>,

    pub binary_installation_options: BinaryInstallationOptions,
}

/// Outcome of [`Requirement::install_latest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A fresh binary was downloaded, verified, and installed.
    Installed(Installation),

    /// A binary for the selected version is already on disk with a
    /// verified checksum; nothing was modified.
    AlreadyInstalled,

    /// Every candidate version was exhausted without a fatal error; no
    /// getter could produce a verifiable archive.
    NoVersionInstalled,
}

impl Requirement {
    /// Install the newest release of this plugin satisfying the version
    /// constraints
    ///
    /// Versions are attempted in strictly descending order; the first one
    /// whose pipeline completes is returned. Getter failures fall through
    /// to the next getter, checksum mismatches to the next getter, archive
    /// exhaustion to the next version. A missing checksum manifest entry is
    /// fatal: no binary is installed without a digest to hold it against.
    pub fn install_latest(&self, opts: &InstallOptions) -> Result<InstallOutcome> {
        let binopts = &opts.binary_installation_options;

        let versions = self.discover_versions(opts)?;

        let last_folder = opts
            .in_folders
            .last()
            .ok_or_else(|| Error::Io("no install folder configured".to_string()))?;

        for version in versions {
            let get_opts = GetOptions {
                requirement: self,
                binary_installation_options: binopts,
                version: Some(version.clone()),
            };

            let output_folder = last_folder.join(self.identifier.install_subpath());
            fs::create_dir_all(&output_folder).map_err(|e| {
                Error::Io(format!(
                    "could not create plugin folder {}: {e}",
                    output_folder.display()
                ))
            })?;

            trace!(
                "trying the {} version to install the {} plugin in {}...",
                get_opts.version_str(),
                self.identifier.for_display(),
                output_folder.display()
            );

            let Some(checksum) = self.locate_checksum(opts, &get_opts)? else {
                return Err(Error::ChecksumMissing(self.identifier.to_string()));
            };

            let output_file_name = output_folder.join(strip_archive_ext(&checksum.filename));

            // A pre-existing binary that still verifies against a local
            // sidecar means there is nothing to do.
            for potential in &binopts.checksummers {
                let expected = match potential.checksum_of_file(&output_file_name) {
                    Ok(expected) => expected,
                    Err(_) => continue,
                };
                trace!("found a pre-existing {} checksum file", potential);
                if potential.checksum_file(&expected, &output_file_name).is_ok() {
                    info!(
                        "{} {} is already correctly installed in {}",
                        self.identifier.for_display(),
                        get_opts.version_str(),
                        output_file_name.display()
                    );
                    return Ok(InstallOutcome::AlreadyInstalled);
                }
            }

            for getter in &opts.getters {
                match self.fetch_and_extract(getter.as_ref(), &get_opts, &checksum, &output_file_name)? {
                    FetchOutcome::Installed => {
                        return Ok(InstallOutcome::Installed(Installation {
                            binary_path: output_file_name,
                            version: format!("v{version}"),
                        }));
                    }
                    FetchOutcome::TryNextGetter => continue,
                }
            }
        }

        Ok(InstallOutcome::NoVersionInstalled)
    }

    /// Phase A: collect constraint-satisfying release versions from the
    /// first getter that yields any, sorted newest first.
    fn discover_versions(&self, opts: &InstallOptions) -> Result<Vec<Version>> {
        trace!(
            "getting available versions for the {} plugin",
            self.identifier.for_display()
        );

        let get_opts = GetOptions {
            requirement: self,
            binary_installation_options: &opts.binary_installation_options,
            version: None,
        };

        let mut versions: Vec<Version> = Vec::new();
        for getter in &opts.getters {
            let releases_file = match getter.get(KIND_RELEASES, &get_opts) {
                Ok(stream) => stream,
                Err(e) => {
                    trace!("{} getter could not get release: {e}", getter.name());
                    continue;
                }
            };
            let releases = match parse_releases(releases_file) {
                Ok(releases) => releases,
                Err(e) => {
                    trace!("could not parse release: {e}");
                    continue;
                }
            };
            if releases.is_empty() {
                trace!("no release found");
                continue;
            }

            for release in &releases {
                let version = match Version::parse(&release.version) {
                    Ok(version) => version,
                    Err(e) => {
                        trace!("ignoring release with invalid version {}: {e}", release.version);
                        continue;
                    }
                };
                if self.constraints.check(&version) {
                    versions.push(version);
                }
            }
            if versions.is_empty() {
                trace!("no matching version found in {} releases", releases.len());
                continue;
            }

            versions.sort();
            versions.reverse();
            debug!("found candidate versions {:?}", versions);
            break;
        }

        if versions.is_empty() {
            return Err(Error::NoReleaseFound {
                plugin: self.identifier.for_display(),
                constraints: self.constraints.to_string(),
            });
        }

        Ok(versions)
    }

    /// Locate the checksum for the selected version: getters in order, and
    /// for each getter every checksummer, until one manifest entry
    /// validates against this host and its digest parses.
    fn locate_checksum(
        &self,
        opts: &InstallOptions,
        get_opts: &GetOptions<'_>,
    ) -> Result<Option<FileChecksum>> {
        for getter in &opts.getters {
            for checksummer in &opts.binary_installation_options.checksummers {
                let manifest = getter
                    .get(checksummer.type_name(), get_opts)
                    .map_err(|e| {
                        Error::Transport(format!(
                            "could not get checksum file for {} version {}: {e}; is the file present on the release and correctly named?",
                            self.identifier.for_display(),
                            get_opts.version_str()
                        ))
                    })?;

                let entries = match parse_checksum_file_entries(manifest) {
                    Ok(entries) => entries,
                    Err(e) => {
                        trace!(
                            "could not parse {} checksum file: {e}; make sure the checksum file contains a checksum and a binary filename per line",
                            checksummer
                        );
                        continue;
                    }
                };

                for mut entry in entries {
                    if let Err(e) = entry.init(get_opts) {
                        trace!(
                            "could not parse checksum filename {}, is it correctly formatted? {e}",
                            entry.filename
                        );
                        continue;
                    }
                    if let Err(e) = entry.validate(get_opts) {
                        trace!("ignoring binary {}: {e}", entry.filename);
                        continue;
                    }

                    trace!("about to get: {}", entry.filename);

                    let expected = match checksummer.parse_checksum(&entry.checksum) {
                        Ok(expected) => expected,
                        Err(e) => {
                            trace!(
                                "could not parse {} checksum: {e}; make sure the checksum file contains the checksum and only the checksum",
                                checksummer
                            );
                            continue;
                        }
                    };

                    return Ok(Some(FileChecksum {
                        filename: entry.filename.clone(),
                        expected,
                        checksummer: *checksummer,
                    }));
                }
            }
        }

        Ok(None)
    }

    /// Download the archive from one getter, verify it against the
    /// expected digest, and extract the binary entry into place.
    ///
    /// Transport and verification failures are soft: the temporary file is
    /// truncated and the caller moves on to the next getter. A malformed
    /// archive or a missing expected entry is fatal for this version.
    fn fetch_and_extract(
        &self,
        getter: &dyn Getter,
        get_opts: &GetOptions<'_>,
        checksum: &FileChecksum,
        output_file_name: &Path,
    ) -> Result<FetchOutcome> {
        let mut tmp_file = tempfile::tempfile().map_err(|e| {
            Error::Io(format!(
                "could not create temporary file to download plugin: {e}"
            ))
        })?;

        let mut remote_zip = match getter.get(KIND_ZIP, get_opts) {
            Ok(stream) => stream,
            Err(e) => {
                trace!(
                    "could not get binary for {} version {} from {} getter: {e}",
                    self.identifier.for_display(),
                    get_opts.version_str(),
                    getter.name()
                );
                return Ok(FetchOutcome::TryNextGetter);
            }
        };

        let copied = io::copy(&mut remote_zip, &mut tmp_file);
        drop(remote_zip);
        if let Err(e) = copied {
            trace!("error getting plugin: {e}, trying another getter");
            return Ok(FetchOutcome::TryNextGetter);
        }

        if let Err(e) = tmp_file.seek(SeekFrom::Start(0)) {
            trace!("error seeking beginning of temporary file for checksumming: {e}, continuing");
            return Ok(FetchOutcome::TryNextGetter);
        }

        if let Err(e) = checksum.checksummer.checksum(&checksum.expected, &mut tmp_file) {
            trace!("{e}; is the checksum file correct? is the binary file correct? truncating the zipfile");
            if let Err(e) = tmp_file.set_len(0) {
                trace!("could not truncate the zipfile: {e}");
            }
            return Ok(FetchOutcome::TryNextGetter);
        }

        let entry_name = strip_archive_ext(&checksum.filename);
        {
            let mut archive = zip::ZipArchive::new(&mut tmp_file)
                .map_err(|e| Error::Archive(format!("could not read plugin archive: {e}")))?;

            let mut entry = match archive.by_name(entry_name) {
                Ok(entry) => entry,
                Err(zip::result::ZipError::FileNotFound) => {
                    return Err(Error::Archive(format!(
                        "could not find a {} file in the {} archive",
                        entry_name, checksum.filename
                    )));
                }
                Err(e) => {
                    return Err(Error::Archive(format!(
                        "could not open archive entry {}: {e}",
                        entry_name
                    )));
                }
            };

            let mut open_opts = OpenOptions::new();
            open_opts.read(true).write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                open_opts.mode(0o755);
            }
            let mut output_file = open_opts.open(output_file_name).map_err(|e| {
                Error::Io(format!("failed to create {}: {e}", output_file_name.display()))
            })?;

            io::copy(&mut entry, &mut output_file).map_err(|e| {
                Error::Io(format!(
                    "could not extract {} to {}: {e}",
                    entry_name,
                    output_file_name.display()
                ))
            })?;
        }

        // The binary is installed and verified; sidecar persistence is
        // best-effort from here on.
        self.write_sidecar(checksum, output_file_name);

        info!(
            "installed {} {} in {}",
            self.identifier.for_display(),
            get_opts.version_str(),
            output_file_name.display()
        );
        Ok(FetchOutcome::Installed)
    }

    /// Re-checksum the extracted binary and record the digest next to it so
    /// later discovery and idempotence checks can trust the file.
    fn write_sidecar(&self, checksum: &FileChecksum, output_file_name: &Path) {
        let mut output_file = match fs::File::open(output_file_name) {
            Ok(file) => file,
            Err(e) => {
                warn!("could not reopen binary for checksumming: {e}, ignoring");
                return;
            }
        };

        let digest = match checksum.checksummer.sum(&mut output_file) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("failed to checksum binary file: {e}, ignoring");
                return;
            }
        };

        let sidecar = checksum.checksummer.sidecar_path(output_file_name);
        if let Err(e) = fs::write(&sidecar, hex::encode(digest)) {
            warn!("failed to write local binary checksum file: {e}, ignoring");
        }
    }
}

enum FetchOutcome {
    Installed,
    TryNextGetter,
}
