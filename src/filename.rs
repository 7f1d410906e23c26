// src/filename.rs

//! Canonical plugin filename grammar
//!
//! Every plugin binary and archive carries its identity in its name:
//!
//! ```text
//! packer-plugin-<type>_<version>_x<protMajor>.<protMinor>_<os>_<arch>[.<ext>]
//! ```
//!
//! Example: `packer-plugin-amazon_v1.2.3_x5.0_linux_amd64.zip`. The version
//! begins with `v`; the extension is empty for bare binaries, `.zip` for
//! downloaded artifacts, `.exe` for Windows binaries.
//!
//! Parsing strips the exact prefix once, then splits on `_`. Filenames that
//! do not yield the four trailing segments are rejected; callers treat that
//! as a per-candidate soft error.

use std::fmt;
use thiserror::Error;

/// Filename grammar errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    #[error("filename {name:?} does not start with the expected prefix {prefix:?}")]
    WrongPrefix { name: String, prefix: String },

    #[error("malformed filename {0:?}, expected <prefix>_{{version}}_x{{protocol-version}}_{{os}}_{{arch}}")]
    Malformed(String),
}

/// Decoded form of a canonical plugin filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFilename {
    /// Version segment, including the leading `v`, e.g. `v1.2.3`
    pub version: String,
    /// Protocol segment as written, e.g. `x5.0`
    pub protocol: String,
    pub os: String,
    pub arch: String,
    /// Extension including the dot (`.zip`, `.exe`); empty for bare binaries
    pub ext: String,
}

impl PluginFilename {
    /// Decode `name` against the given filename prefix
    /// (e.g. `packer-plugin-amazon`).
    pub fn parse(name: &str, prefix: &str) -> Result<Self, FilenameError> {
        let rest = name
            .strip_prefix(prefix)
            .and_then(|r| r.strip_prefix('_'))
            .ok_or_else(|| FilenameError::WrongPrefix {
                name: name.to_string(),
                prefix: prefix.to_string(),
            })?;

        // rest now looks like v1.2.3_x5.0_linux_amd64.zip
        let parts: Vec<&str> = rest.splitn(4, '_').collect();
        if parts.len() < 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(FilenameError::Malformed(name.to_string()));
        }

        let (arch, ext) = match parts[3].find('.') {
            Some(dot) => parts[3].split_at(dot),
            None => (parts[3], ""),
        };
        if arch.is_empty() {
            return Err(FilenameError::Malformed(name.to_string()));
        }

        Ok(Self {
            version: parts[0].to_string(),
            protocol: parts[1].to_string(),
            os: parts[2].to_string(),
            arch: arch.to_string(),
            ext: ext.to_string(),
        })
    }

    /// Encode a canonical filename from its segments. Inverse of
    /// [`PluginFilename::parse`].
    pub fn format(
        prefix: &str,
        version: &str,
        protocol: &str,
        os: &str,
        arch: &str,
        ext: &str,
    ) -> String {
        format!("{prefix}_{version}_{protocol}_{os}_{arch}{ext}")
    }
}

impl fmt::Display for PluginFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}{}",
            self.version, self.protocol, self.os, self.arch, self.ext
        )
    }
}

/// Strip the archive extension from a canonical filename, yielding the bare
/// binary name: `packer-plugin-foo_v1.2.3_x5.0_linux_amd64.zip` becomes
/// `packer-plugin-foo_v1.2.3_x5.0_linux_amd64`.
///
/// Only a final dot-segment that sits after the arch is an extension; the
/// dots inside the version and protocol segments are left alone.
pub fn strip_archive_ext(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if !name[dot..].contains('_') => &name[..dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "packer-plugin-amazon";

    #[test]
    fn test_parse_archive_filename() {
        let parsed =
            PluginFilename::parse("packer-plugin-amazon_v1.2.3_x5.0_linux_amd64.zip", PREFIX)
                .unwrap();
        assert_eq!(parsed.version, "v1.2.3");
        assert_eq!(parsed.protocol, "x5.0");
        assert_eq!(parsed.os, "linux");
        assert_eq!(parsed.arch, "amd64");
        assert_eq!(parsed.ext, ".zip");
    }

    #[test]
    fn test_parse_bare_binary_filename() {
        let parsed =
            PluginFilename::parse("packer-plugin-amazon_v1.2.3_x5.0_linux_amd64", PREFIX).unwrap();
        assert_eq!(parsed.arch, "amd64");
        assert_eq!(parsed.ext, "");
    }

    #[test]
    fn test_parse_windows_binary_filename() {
        let parsed =
            PluginFilename::parse("packer-plugin-amazon_v1.2.3_x5.0_windows_amd64.exe", PREFIX)
                .unwrap();
        assert_eq!(parsed.os, "windows");
        assert_eq!(parsed.ext, ".exe");
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!(matches!(
            PluginFilename::parse("packer-plugin-google_v1.2.3_x5.0_linux_amd64", PREFIX),
            Err(FilenameError::WrongPrefix { .. })
        ));
    }

    #[test]
    fn test_parse_requires_exact_prefix_strip() {
        // A type sharing characters with the prefix must not be over-trimmed.
        let parsed = PluginFilename::parse(
            "packer-plugin-parallels_v1.0.0_x5.0_linux_amd64",
            "packer-plugin-parallels",
        )
        .unwrap();
        assert_eq!(parsed.version, "v1.0.0");
    }

    #[test]
    fn test_parse_rejects_too_few_segments() {
        assert!(matches!(
            PluginFilename::parse("packer-plugin-amazon_v1.2.3_x5.0_linux", PREFIX),
            Err(FilenameError::Malformed(_))
        ));
        assert!(matches!(
            PluginFilename::parse("packer-plugin-amazon_v1.2.3", PREFIX),
            Err(FilenameError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(PluginFilename::parse("packer-plugin-amazon_v1.2.3__linux_amd64", PREFIX).is_err());
    }

    #[test]
    fn test_format_parse_round_trip() {
        for (version, protocol, os, arch, ext) in [
            ("v1.2.3", "x5.0", "linux", "amd64", ""),
            ("v1.2.3", "x5.0", "linux", "amd64", ".zip"),
            ("v0.2.12", "x5.1", "freebsd", "arm64", ".zip"),
            ("v10.0.0-rc1", "x4.12", "windows", "386", ".exe"),
        ] {
            let name = PluginFilename::format(PREFIX, version, protocol, os, arch, ext);
            let parsed = PluginFilename::parse(&name, PREFIX).unwrap();
            assert_eq!(parsed.version, version);
            assert_eq!(parsed.protocol, protocol);
            assert_eq!(parsed.os, os);
            assert_eq!(parsed.arch, arch);
            assert_eq!(parsed.ext, ext);
        }
    }

    #[test]
    fn test_strip_archive_ext() {
        assert_eq!(
            strip_archive_ext("packer-plugin-foo_v1.2.3_x5.0_linux_amd64.zip"),
            "packer-plugin-foo_v1.2.3_x5.0_linux_amd64"
        );
        // no extension: the remaining dots belong to version and protocol
        assert_eq!(
            strip_archive_ext("packer-plugin-foo_v1.2.3_x5.0_linux_amd64"),
            "packer-plugin-foo_v1.2.3_x5.0_linux_amd64"
        );
        assert_eq!(strip_archive_ext("plain"), "plain");
    }
}
