// src/identifier.rs

//! Plugin source addresses
//!
//! A plugin is identified by the triple `hostname/namespace/type`, e.g.
//! `github.com/hashicorp/amazon`. The triple maps directly onto the on-disk
//! install layout (`<root>/<hostname>/<namespace>/<type>/...`) and onto the
//! canonical binary filename prefix (`packer-plugin-<type>`).
//!
//! All three components are non-empty, lowercase, and free of path
//! separators; these invariants are enforced at construction so every other
//! module can build paths and filenames from an identifier without
//! re-validating.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Hostname assumed when a source address omits it.
pub const DEFAULT_HOSTNAME: &str = "github.com";

/// Filename prefix shared by every plugin binary, completed by the plugin
/// type: `packer-plugin-<type>`.
pub const FILENAME_PREFIX: &str = "packer-plugin-";

/// Errors that can occur when parsing a plugin source address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid plugin source address {0:?}, expected \"[hostname/]namespace/type\"")]
    WrongFormat(String),

    #[error("empty {part} in plugin source address {input:?}")]
    EmptyPart { part: &'static str, input: String },

    #[error("invalid {part} {value:?} in plugin source address: only lowercase alphanumerics, '.', '-' and '_' are allowed")]
    InvalidPart { part: &'static str, value: String },
}

/// Canonical tri-part plugin identity
///
/// Format: `hostname/namespace/type`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginIdentifier {
    /// Registry hostname, e.g. `github.com`
    pub hostname: String,
    /// Namespace within the registry, usually the publisher
    pub namespace: String,
    /// Plugin type, e.g. `amazon`
    pub plugin_type: String,
}

impl PluginIdentifier {
    /// Create an identifier, validating every component.
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        plugin_type: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let hostname = hostname.into();
        let namespace = namespace.into();
        let plugin_type = plugin_type.into();

        validate_part("hostname", &hostname)?;
        validate_part("namespace", &namespace)?;
        validate_part("type", &plugin_type)?;

        Ok(Self {
            hostname,
            namespace,
            plugin_type,
        })
    }

    /// Parse a source address of the form `hostname/namespace/type`.
    ///
    /// A two-part address `namespace/type` is accepted and completed with
    /// [`DEFAULT_HOSTNAME`].
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let parts: Vec<&str> = s.split('/').collect();
        let (hostname, namespace, plugin_type) = match parts.as_slice() {
            [namespace, plugin_type] => (DEFAULT_HOSTNAME, *namespace, *plugin_type),
            [hostname, namespace, plugin_type] => (*hostname, *namespace, *plugin_type),
            _ => return Err(IdentifierError::WrongFormat(s.to_string())),
        };

        if hostname.is_empty() {
            return Err(IdentifierError::EmptyPart {
                part: "hostname",
                input: s.to_string(),
            });
        }
        if namespace.is_empty() {
            return Err(IdentifierError::EmptyPart {
                part: "namespace",
                input: s.to_string(),
            });
        }
        if plugin_type.is_empty() {
            return Err(IdentifierError::EmptyPart {
                part: "type",
                input: s.to_string(),
            });
        }

        Self::new(hostname, namespace, plugin_type)
    }

    /// The three components in path order.
    pub fn parts(&self) -> [&str; 3] {
        [&self.hostname, &self.namespace, &self.plugin_type]
    }

    /// `packer-plugin-<type>`, the prefix of every binary and archive
    /// filename of this plugin.
    pub fn filename_prefix(&self) -> String {
        format!("{}{}", FILENAME_PREFIX, self.plugin_type)
    }

    /// Relative install location under a plugin root folder:
    /// `<hostname>/<namespace>/<type>`.
    pub fn install_subpath(&self) -> PathBuf {
        self.parts().iter().collect()
    }

    /// Shortened form for diagnostics: the hostname is omitted when it is
    /// the default one.
    pub fn for_display(&self) -> String {
        if self.hostname == DEFAULT_HOSTNAME {
            format!("{}/{}", self.namespace, self.plugin_type)
        } else {
            self.to_string()
        }
    }
}

fn validate_part(part: &'static str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::EmptyPart {
            part,
            input: value.to_string(),
        });
    }

    let valid = |c: char| {
        (c.is_alphanumeric() && !c.is_uppercase()) || c == '.' || c == '-' || c == '_'
    };
    if !value.chars().all(valid) {
        return Err(IdentifierError::InvalidPart {
            part,
            value: value.to_string(),
        });
    }

    Ok(())
}

impl fmt::Display for PluginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.hostname, self.namespace, self.plugin_type
        )
    }
}

impl FromStr for PluginIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginIdentifier::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_full_address() {
        let id = PluginIdentifier::parse("github.com/hashicorp/amazon").unwrap();
        assert_eq!(id.hostname, "github.com");
        assert_eq!(id.namespace, "hashicorp");
        assert_eq!(id.plugin_type, "amazon");
    }

    #[test]
    fn test_parse_short_address_gets_default_hostname() {
        let id = PluginIdentifier::parse("hashicorp/amazon").unwrap();
        assert_eq!(id.hostname, DEFAULT_HOSTNAME);
        assert_eq!(id.namespace, "hashicorp");
        assert_eq!(id.plugin_type, "amazon");
    }

    #[test]
    fn test_parse_rejects_wrong_part_count() {
        assert!(matches!(
            PluginIdentifier::parse("amazon"),
            Err(IdentifierError::WrongFormat(_))
        ));
        assert!(matches!(
            PluginIdentifier::parse("a/b/c/d"),
            Err(IdentifierError::WrongFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(matches!(
            PluginIdentifier::parse("github.com//amazon"),
            Err(IdentifierError::EmptyPart { part: "namespace", .. })
        ));
        assert!(matches!(
            PluginIdentifier::parse("github.com/hashicorp/"),
            Err(IdentifierError::EmptyPart { part: "type", .. })
        ));
    }

    #[test]
    fn test_new_rejects_uppercase() {
        assert!(matches!(
            PluginIdentifier::new("github.com", "HashiCorp", "amazon"),
            Err(IdentifierError::InvalidPart { part: "namespace", .. })
        ));
    }

    #[test]
    fn test_new_rejects_path_separators() {
        assert!(PluginIdentifier::new("github.com", "a/b", "amazon").is_err());
        assert!(PluginIdentifier::new("github.com", "a\\b", "amazon").is_err());
    }

    #[test]
    fn test_parts_and_subpath() {
        let id = PluginIdentifier::parse("github.com/hashicorp/amazon").unwrap();
        assert_eq!(id.parts(), ["github.com", "hashicorp", "amazon"]);
        assert_eq!(
            id.install_subpath(),
            Path::new("github.com").join("hashicorp").join("amazon")
        );
    }

    #[test]
    fn test_filename_prefix() {
        let id = PluginIdentifier::parse("github.com/hashicorp/amazon").unwrap();
        assert_eq!(id.filename_prefix(), "packer-plugin-amazon");
    }

    #[test]
    fn test_display_and_for_display() {
        let id = PluginIdentifier::parse("github.com/hashicorp/amazon").unwrap();
        assert_eq!(id.to_string(), "github.com/hashicorp/amazon");
        assert_eq!(id.for_display(), "hashicorp/amazon");

        let id = PluginIdentifier::parse("example.com/hashicorp/amazon").unwrap();
        assert_eq!(id.for_display(), "example.com/hashicorp/amazon");
    }

    #[test]
    fn test_from_str_round_trip() {
        let id: PluginIdentifier = "github.com/hashicorp/amazon".parse().unwrap();
        assert_eq!(id.to_string().parse::<PluginIdentifier>().unwrap(), id);
    }
}
