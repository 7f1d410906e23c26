// src/protocol.rs

//! Wire-protocol compatibility between the host and plugin binaries
//!
//! A plugin advertises the protocol version it speaks as `xMAJOR.MINOR`
//! embedded in its filename. The host can talk to a plugin iff the MAJOR
//! versions are equal and the plugin's MINOR does not exceed the host's:
//! minor releases of the protocol are backwards compatible, major releases
//! are not.

use crate::requirement::BinaryInstallationOptions;
use thiserror::Error;

/// Protocol compatibility errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid remote protocol {remote:?}, expected something like {expected:?}")]
    Invalid { remote: String, expected: String },

    #[error("unsupported remote protocol MAJOR version {remote:?}; the current MAJOR protocol version is {host:?} and the host can only communicate with plugins using that version")]
    MajorMismatch { remote: String, host: String },

    #[error("unsupported remote protocol MINOR version {remote:?}; the supported MINOR protocol versions are {host:?} and below, upgrade the host or use an older version of the plugin")]
    MinorTooNew { remote: String, host: String },

    #[error("protocol MINOR version {0:?} is not a number")]
    MinorNotNumeric(String),
}

impl BinaryInstallationOptions {
    /// Decide whether a plugin advertising `remote` (shaped like
    /// `xMAJOR.MINOR`, leading `x` optional) speaks a protocol this host can
    /// negotiate.
    pub fn check_protocol_version(&self, remote: &str) -> Result<(), ProtocolError> {
        let stripped = remote.strip_prefix('x').unwrap_or(remote);
        let mut parts = stripped.split('.');
        let (major, minor) = match (parts.next(), parts.next()) {
            (Some(major), Some(minor)) => (major, minor),
            _ => {
                return Err(ProtocolError::Invalid {
                    remote: remote.to_string(),
                    expected: format!("{}.{}", self.api_major, self.api_minor),
                })
            }
        };

        if major != self.api_major {
            return Err(ProtocolError::MajorMismatch {
                remote: major.to_string(),
                host: self.api_major.clone(),
            });
        }

        if minor == self.api_minor {
            return Ok(());
        }

        let remote_minor: u64 = minor
            .parse()
            .map_err(|_| ProtocolError::MinorNotNumeric(minor.to_string()))?;
        let host_minor: u64 = self
            .api_minor
            .parse()
            .map_err(|_| ProtocolError::MinorNotNumeric(self.api_minor.clone()))?;

        if remote_minor > host_minor {
            return Err(ProtocolError::MinorTooNew {
                remote: minor.to_string(),
                host: self.api_minor.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(major: &str, minor: &str) -> BinaryInstallationOptions {
        BinaryInstallationOptions {
            api_major: major.to_string(),
            api_minor: minor.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_version_is_compatible() {
        assert!(host("5", "0").check_protocol_version("x5.0").is_ok());
    }

    #[test]
    fn test_leading_x_is_optional() {
        assert!(host("5", "0").check_protocol_version("5.0").is_ok());
    }

    #[test]
    fn test_older_minor_is_compatible() {
        assert!(host("5", "3").check_protocol_version("x5.1").is_ok());
    }

    #[test]
    fn test_newer_minor_needs_host_upgrade() {
        assert!(matches!(
            host("5", "0").check_protocol_version("x5.1"),
            Err(ProtocolError::MinorTooNew { .. })
        ));
    }

    #[test]
    fn test_major_mismatch_is_incompatible_both_ways() {
        assert!(matches!(
            host("5", "0").check_protocol_version("x6.0"),
            Err(ProtocolError::MajorMismatch { .. })
        ));
        assert!(matches!(
            host("5", "0").check_protocol_version("x4.0"),
            Err(ProtocolError::MajorMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_minor_is_invalid() {
        assert!(matches!(
            host("5", "0").check_protocol_version("x5"),
            Err(ProtocolError::Invalid { .. })
        ));
    }

    #[test]
    fn test_non_numeric_minor_is_a_parse_error() {
        assert!(matches!(
            host("5", "0").check_protocol_version("x5.beta"),
            Err(ProtocolError::MinorNotNumeric(_))
        ));
    }

    #[test]
    fn test_equal_minor_strings_skip_numeric_parse() {
        // an equal, non-numeric minor still negotiates
        assert!(host("5", "dev").check_protocol_version("x5.dev").is_ok());
    }
}
