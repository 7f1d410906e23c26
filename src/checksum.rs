// src/checksum.rs

//! Named digest algorithms with sidecar-file conventions
//!
//! Every file the installer could hand over for execution is gated behind a
//! checksum. A [`Checksummer`] couples a hash algorithm with the naming
//! convention of its sidecar file: the digest of `<binary>` lives next to it
//! in `<binary>.<algorithm>` as a single lowercase hex string.
//!
//! Callers supply checksummers as an ordered list; the first one that can
//! produce and verify a digest for a file wins.

use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Checksum computation and verification errors
///
/// A mismatch is distinct from a missing sidecar: the former means the file
/// is unsafe, the latter only that nothing vouches for it.
#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("unknown checksum algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid {algorithm} checksum {input:?}: {source}")]
    InvalidHex {
        algorithm: &'static str,
        input: String,
        source: hex::FromHexError,
    },

    #[error("invalid {algorithm} checksum length: expected {expected} bytes, got {got}")]
    InvalidLength {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{algorithm} mismatch: expected {expected}, got {actual}")]
    Mismatch {
        algorithm: &'static str,
        expected: String,
        actual: String,
    },

    #[error("no {algorithm} checksum file found for {path:?}")]
    SidecarNotFound {
        algorithm: &'static str,
        path: PathBuf,
    },

    #[error("I/O error while checksumming: {0}")]
    Io(#[from] io::Error),
}

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256, the algorithm release checksum manifests are published with
    #[default]
    Sha256,
    /// SHA-512, accepted for locally pinned binaries
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Algorithm name, as used in manifests and sidecar extensions
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(ChecksumError::UnknownAlgorithm(s.to_string())),
        }
    }
}

fn hash_reader<D: Digest, R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().to_vec())
}

/// A named digest algorithm bound to its sidecar-file convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Checksummer {
    pub algorithm: HashAlgorithm,
}

impl Checksummer {
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Short name, used as the artifact kind when fetching a remote
    /// checksum manifest: `sha256`.
    pub fn type_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Sidecar filename suffix: `.sha256`.
    pub fn file_ext(&self) -> String {
        format!(".{}", self.algorithm.name())
    }

    /// Where the sidecar checksum of `path` lives: `<path><file_ext>`.
    pub fn sidecar_path(&self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(self.file_ext());
        PathBuf::from(name)
    }

    /// Digest everything the reader yields.
    pub fn sum<R: Read>(&self, reader: &mut R) -> io::Result<Vec<u8>> {
        match self.algorithm {
            HashAlgorithm::Sha256 => hash_reader::<Sha256, R>(reader),
            HashAlgorithm::Sha512 => hash_reader::<Sha512, R>(reader),
        }
    }

    /// Decode a hex digest, validating its length for this algorithm.
    pub fn parse_checksum(&self, text: &str) -> Result<Vec<u8>, ChecksumError> {
        let bytes = hex::decode(text.trim()).map_err(|source| ChecksumError::InvalidHex {
            algorithm: self.algorithm.name(),
            input: text.to_string(),
            source,
        })?;

        let expected = self.algorithm.output_len();
        if bytes.len() != expected {
            return Err(ChecksumError::InvalidLength {
                algorithm: self.algorithm.name(),
                expected,
                got: bytes.len(),
            });
        }

        Ok(bytes)
    }

    /// Verify that the reader's content digests to `expected`.
    pub fn checksum<R: Read>(&self, expected: &[u8], reader: &mut R) -> Result<(), ChecksumError> {
        let actual = self.sum(reader)?;
        if actual != expected {
            return Err(ChecksumError::Mismatch {
                algorithm: self.algorithm.name(),
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    /// Re-read the file at `path` and verify it digests to `expected`.
    pub fn checksum_file(&self, expected: &[u8], path: &Path) -> Result<(), ChecksumError> {
        let mut file = File::open(path)?;
        self.checksum(expected, &mut file)
    }

    /// Read the digest recorded in the sidecar file next to `path`.
    ///
    /// A missing sidecar yields [`ChecksumError::SidecarNotFound`]; the
    /// binary itself is not touched.
    pub fn checksum_of_file(&self, path: &Path) -> Result<Vec<u8>, ChecksumError> {
        let sidecar = self.sidecar_path(path);
        let text = match std::fs::read_to_string(&sidecar) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ChecksumError::SidecarNotFound {
                    algorithm: self.algorithm.name(),
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        self.parse_checksum(&text)
    }
}

impl fmt::Display for Checksummer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn sha256() -> Checksummer {
        Checksummer::new(HashAlgorithm::Sha256)
    }

    #[test]
    fn test_sum_known_vector() {
        let digest = sha256().sum(&mut Cursor::new(b"hello world")).unwrap();
        assert_eq!(hex::encode(digest), HELLO_SHA256);
    }

    #[test]
    fn test_sha512_digest_length() {
        let checksummer = Checksummer::new(HashAlgorithm::Sha512);
        let digest = checksummer.sum(&mut Cursor::new(b"hello world")).unwrap();
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_parse_checksum_valid() {
        let bytes = sha256().parse_checksum(HELLO_SHA256).unwrap();
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_parse_checksum_tolerates_whitespace() {
        let text = format!("{HELLO_SHA256}\n");
        assert!(sha256().parse_checksum(&text).is_ok());
    }

    #[test]
    fn test_parse_checksum_rejects_bad_hex() {
        assert!(matches!(
            sha256().parse_checksum("zz94d27b"),
            Err(ChecksumError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_parse_checksum_rejects_wrong_length() {
        assert!(matches!(
            sha256().parse_checksum("abcdef"),
            Err(ChecksumError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_checksum_mismatch() {
        let expected = sha256().parse_checksum(HELLO_SHA256).unwrap();
        let err = sha256()
            .checksum(&expected, &mut Cursor::new(b"goodbye world"))
            .unwrap_err();
        assert!(matches!(err, ChecksumError::Mismatch { .. }));
    }

    #[test]
    fn test_checksum_file_ok_and_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary");
        std::fs::write(&path, b"hello world").unwrap();

        let expected = sha256().parse_checksum(HELLO_SHA256).unwrap();
        assert!(sha256().checksum_file(&expected, &path).is_ok());

        std::fs::write(&path, b"tampered").unwrap();
        assert!(matches!(
            sha256().checksum_file(&expected, &path),
            Err(ChecksumError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_checksum_of_file_reads_sidecar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary");
        std::fs::write(&path, b"hello world").unwrap();
        std::fs::write(dir.path().join("binary.sha256"), HELLO_SHA256).unwrap();

        let digest = sha256().checksum_of_file(&path).unwrap();
        assert_eq!(hex::encode(digest), HELLO_SHA256);
    }

    #[test]
    fn test_checksum_of_file_missing_sidecar_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary");
        std::fs::write(&path, b"hello world").unwrap();

        assert!(matches!(
            sha256().checksum_of_file(&path),
            Err(ChecksumError::SidecarNotFound { .. })
        ));
    }

    #[test]
    fn test_sidecar_path() {
        let checksummer = sha256();
        assert_eq!(
            checksummer.sidecar_path(Path::new("/plugins/packer-plugin-amazon_v1.2.3_x5.0_linux_amd64")),
            Path::new("/plugins/packer-plugin-amazon_v1.2.3_x5.0_linux_amd64.sha256")
        );
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(
            "sha256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert_eq!(
            "SHA-512".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha512
        );
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
