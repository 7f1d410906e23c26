// tests/common/mod.rs

//! Shared fixtures for the end-to-end tests
//!
//! Provides an in-memory `Getter` backed by byte buffers, plus helpers to
//! build zip archives, sidecar checksum files, and on-disk plugin layouts.

// not every test binary uses every helper
#![allow(dead_code)]

use quarry::{Checksummer, Error, GetOptions, Getter, HashAlgorithm, KIND_RELEASES, KIND_ZIP};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

pub fn sha256_checksummer() -> Checksummer {
    Checksummer::new(HashAlgorithm::Sha256)
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Build a zip archive holding a single file.
pub fn zip_with_entry(entry_name: &str, content: &[u8]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file(entry_name, options).unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

/// A JSON release index.
pub fn releases_json(versions: &[&str]) -> Vec<u8> {
    let entries: Vec<String> = versions
        .iter()
        .map(|v| format!(r#"{{"version": "{v}"}}"#))
        .collect();
    format!("[{}]", entries.join(",")).into_bytes()
}

/// A JSON checksum manifest.
pub fn manifest_json(entries: &[(&str, &str)]) -> Vec<u8> {
    let entries: Vec<String> = entries
        .iter()
        .map(|(filename, checksum)| {
            format!(r#"{{"filename": "{filename}", "checksum": "{checksum}"}}"#)
        })
        .collect();
    format!("[{}]", entries.join(",")).into_bytes()
}

/// Install a plugin binary under `root/<subpath>/<filename>`, returning its
/// path. Writes a matching `.sha256` sidecar when asked to.
pub fn place_binary(
    root: &Path,
    subpath: &Path,
    filename: &str,
    content: &[u8],
    with_sidecar: bool,
) -> PathBuf {
    let folder = root.join(subpath);
    fs::create_dir_all(&folder).unwrap();
    let path = folder.join(filename);
    fs::write(&path, content).unwrap();
    if with_sidecar {
        fs::write(
            folder.join(format!("{filename}.sha256")),
            sha256_hex(content),
        )
        .unwrap();
    }
    path
}

/// An in-memory release source
///
/// Artifacts are byte buffers keyed by kind; a missing kind behaves like a
/// transport failure. Every served kind is recorded so tests can assert
/// which getter a stream was consumed from.
#[derive(Default)]
pub struct MemoryGetter {
    pub name: String,
    artifacts: HashMap<String, Vec<u8>>,
    pub calls: RefCell<Vec<String>>,
}

impl MemoryGetter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_releases(mut self, body: Vec<u8>) -> Self {
        self.artifacts.insert(KIND_RELEASES.to_string(), body);
        self
    }

    pub fn with_manifest(mut self, kind: &str, body: Vec<u8>) -> Self {
        self.artifacts.insert(kind.to_string(), body);
        self
    }

    pub fn with_archive(mut self, body: Vec<u8>) -> Self {
        self.artifacts.insert(KIND_ZIP.to_string(), body);
        self
    }

    pub fn calls_for(&self, kind: &str) -> usize {
        self.calls.borrow().iter().filter(|k| *k == kind).count()
    }
}

impl Getter for MemoryGetter {
    fn get(&self, kind: &str, _opts: &GetOptions<'_>) -> quarry::Result<Box<dyn Read>> {
        self.calls.borrow_mut().push(kind.to_string());
        match self.artifacts.get(kind) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(Error::Transport(format!(
                "{}: no {kind} artifact available",
                self.name
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
