// src/version/mod.rs

//! Version handling and constraint satisfaction for plugin requirements
//!
//! This module provides semantic version parsing and comparison for plugin
//! releases, plus the constraint grammar used in build configurations:
//! `=`, `!=`, `<`, `<=`, `>`, `>=` and the pessimistic operator `~>`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version parsing and constraint errors
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid version {input:?}: {source}")]
    InvalidVersion {
        input: String,
        source: semver::Error,
    },

    #[error("invalid version constraint {0:?}")]
    InvalidConstraint(String),
}

/// A plugin version
///
/// Semantic version with total ordering by semver precedence. A leading `v`
/// is accepted on parse, as found in release filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(semver::Version);

impl Version {
    /// Parse a version string, with or without a leading `v`.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let stripped = s.strip_prefix('v').unwrap_or(s);
        semver::Version::parse(stripped)
            .map(Self)
            .map_err(|source| VersionError::InvalidVersion {
                input: s.to_string(),
                source,
            })
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

/// Parse a constraint operand, which may omit trailing segments:
/// `1.2` reads as `1.2.0`. Returns the version and how many numeric
/// segments were written, which the pessimistic operator needs.
fn parse_operand(s: &str) -> Result<(Version, usize), VersionError> {
    let stripped = s.strip_prefix('v').unwrap_or(s);

    if let Ok(v) = semver::Version::parse(stripped) {
        return Ok((Version(v), 3));
    }

    let parts: Vec<&str> = stripped.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(VersionError::InvalidConstraint(s.to_string()));
    }
    let mut numbers = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        numbers[i] = part
            .parse::<u64>()
            .map_err(|_| VersionError::InvalidConstraint(s.to_string()))?;
    }

    Ok((
        Version(semver::Version::new(numbers[0], numbers[1], numbers[2])),
        parts.len(),
    ))
}

/// A simple version constraint: one operator, one operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exact version match
    Exact(Version),
    /// Not equal
    NotEqual(Version),
    /// Greater than
    GreaterThan(Version),
    /// Greater than or equal
    GreaterOrEqual(Version),
    /// Less than
    LessThan(Version),
    /// Less than or equal
    LessOrEqual(Version),
}

impl Constraint {
    /// Check if a version satisfies this constraint
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(v) => version == v,
            Constraint::NotEqual(v) => version != v,
            Constraint::GreaterThan(v) => version > v,
            Constraint::GreaterOrEqual(v) => version >= v,
            Constraint::LessThan(v) => version < v,
            Constraint::LessOrEqual(v) => version <= v,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exact(v) => write!(f, "= {}", v),
            Constraint::NotEqual(v) => write!(f, "!= {}", v),
            Constraint::GreaterThan(v) => write!(f, "> {}", v),
            Constraint::GreaterOrEqual(v) => write!(f, ">= {}", v),
            Constraint::LessThan(v) => write!(f, "< {}", v),
            Constraint::LessOrEqual(v) => write!(f, "<= {}", v),
        }
    }
}

/// An ordered list of simple constraints, all of which must hold
///
/// The empty set matches every version; this is what an implicit plugin
/// requirement carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstraintSet(Vec<Constraint>);

impl ConstraintSet {
    /// The empty set, matching all versions.
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a comma-separated constraint expression
    ///
    /// Examples:
    /// - `">= 1.2.3"` → GreaterOrEqual(1.2.3)
    /// - `">= 1.0, < 2.0"` → GreaterOrEqual(1.0.0) and LessThan(2.0.0)
    /// - `"~> 1.2.3"` → GreaterOrEqual(1.2.3) and LessThan(1.3.0)
    /// - `"~> 1.2"` → GreaterOrEqual(1.2.0) and LessThan(2.0.0)
    /// - `""` or `"*"` → matches everything
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::default());
        }

        let mut constraints = Vec::new();
        for piece in s.split(',') {
            parse_simple(piece.trim(), &mut constraints)?;
        }
        Ok(Self(constraints))
    }

    /// Check if a version satisfies every constraint in the set
    pub fn check(&self, version: &Version) -> bool {
        self.0.iter().all(|c| c.satisfies(version))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.0.iter()
    }
}

/// Parse one comma-separated piece into simple constraints. The pessimistic
/// operator expands into its two bounds, everything else yields one entry.
fn parse_simple(s: &str, out: &mut Vec<Constraint>) -> Result<(), VersionError> {
    if s.is_empty() {
        return Err(VersionError::InvalidConstraint(s.to_string()));
    }

    if let Some(rest) = s.strip_prefix("~>") {
        let (lower, segments) = parse_operand(rest.trim())?;
        let upper = match segments {
            3 => Version(semver::Version::new(lower.major(), lower.minor() + 1, 0)),
            _ => Version(semver::Version::new(lower.major() + 1, 0, 0)),
        };
        out.push(Constraint::GreaterOrEqual(lower));
        out.push(Constraint::LessThan(upper));
        return Ok(());
    }

    let constraint = if let Some(rest) = s.strip_prefix(">=") {
        Constraint::GreaterOrEqual(parse_operand(rest.trim())?.0)
    } else if let Some(rest) = s.strip_prefix("<=") {
        Constraint::LessOrEqual(parse_operand(rest.trim())?.0)
    } else if let Some(rest) = s.strip_prefix("!=") {
        Constraint::NotEqual(parse_operand(rest.trim())?.0)
    } else if let Some(rest) = s.strip_prefix('>') {
        Constraint::GreaterThan(parse_operand(rest.trim())?.0)
    } else if let Some(rest) = s.strip_prefix('<') {
        Constraint::LessThan(parse_operand(rest.trim())?.0)
    } else if let Some(rest) = s.strip_prefix('=') {
        Constraint::Exact(parse_operand(rest.trim())?.0)
    } else {
        // no operator means exact match
        Constraint::Exact(parse_operand(s)?.0)
    };
    out.push(constraint);
    Ok(())
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        for (i, constraint) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

impl FromStr for ConstraintSet {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintSet::parse(s)
    }
}
