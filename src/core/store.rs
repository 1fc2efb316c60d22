// src/core/store.rs
//! Named-object vault over a single flat directory
//!
//! Every object lives at `<dir>/<name>.crypta`. The directory itself is the
//! only index: listing metadata comes straight from the filesystem.

use std::ffi::OsStr;
use std::fs::{self, File, Metadata};
use std::io::{BufReader, Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aliases::{MasterKey32, PlainText};
use crate::config::{self, Config};
use crate::consts::{LARGE_FILE_THRESHOLD, OBJECT_EXTENSION, PARTIAL_SUFFIX};
use crate::core::crypto::{decode_container, encode_single_shot, encode_stream, Cipher};
use crate::core::writer::{ensure_dir, remove_if_unlocked, AtomicWriter};
use crate::enums::ContainerFormat;
use crate::error::{CoreError, IoStage, Result};

/// Listing entry for one stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl ObjectInfo {
    /// Platforms without modification times report the Unix epoch
    fn from_metadata(name: String, metadata: &Metadata) -> Self {
        let modified_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self {
            name,
            size_bytes: metadata.len(),
            modified_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
    large_file_threshold: u64,
}

impl ObjectStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            large_file_threshold: LARGE_FILE_THRESHOLD,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.vault.dir.clone())
            .with_large_file_threshold(config.limits.large_file_threshold)
    }

    /// Store rooted at the process-wide configured directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::from_config(config::load()?))
    }

    pub fn with_large_file_threshold(mut self, bytes: u64) -> Self {
        self.large_file_threshold = bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn large_file_threshold(&self) -> u64 {
        self.large_file_threshold
    }

    pub fn object_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{OBJECT_EXTENSION}")))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.object_path(name)?.is_file())
    }

    /// Encrypt a file into the vault under its base name
    pub fn put<P: AsRef<Path>>(&self, source: P, key: &MasterKey32) -> Result<ObjectInfo> {
        let source = source.as_ref();
        let name = source
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| CoreError::InvalidName(source.display().to_string()))?;
        self.put_as(name, source, key)
    }

    /// Encrypt a file into the vault under an explicit name
    pub fn put_as<P: AsRef<Path>>(
        &self,
        name: &str,
        source: P,
        key: &MasterKey32,
    ) -> Result<ObjectInfo> {
        let source = source.as_ref();
        let input = File::open(source).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CoreError::NotFound(source.to_path_buf()),
            _ => CoreError::Io {
                stage: "opening source file",
                source: err,
            },
        })?;
        let size = input.metadata().stage("reading source metadata")?.len();
        self.put_reader(name, BufReader::new(input), size, key)
    }

    /// Encrypt in-memory bytes into the vault
    pub fn put_bytes(&self, name: &str, plaintext: &[u8], key: &MasterKey32) -> Result<ObjectInfo> {
        self.put_reader(name, Cursor::new(plaintext), plaintext.len() as u64, key)
    }

    /// Encrypt `size` bytes from `source`, choosing the container form by size
    ///
    /// Sources above the large-file threshold stream straight into the
    /// partial file; smaller ones are sealed in one AEAD call. Either way the
    /// object only becomes visible once fully written and synced.
    pub fn put_reader<R: Read>(
        &self,
        name: &str,
        mut source: R,
        size: u64,
        key: &MasterKey32,
    ) -> Result<ObjectInfo> {
        let final_path = self.object_path(name)?;
        let cipher = Cipher::from_master_key(key);
        let format = ContainerFormat::for_size(size, self.large_file_threshold);
        debug!(name, size, ?format, "storing object");

        ensure_dir(&self.dir)?;
        let mut writer = AtomicWriter::create(&final_path)?;
        match format {
            ContainerFormat::Streaming => {
                let summary = encode_stream(&cipher, &mut source, &mut writer)?;
                debug!(name, chunks = summary.chunks, "sealed streaming chunks");
            }
            ContainerFormat::SingleShot => {
                let mut buf = Vec::new();
                source
                    .read_to_end(&mut buf)
                    .stage("reading source file")?;
                let plaintext = PlainText::new(buf);
                let container = encode_single_shot(&cipher, plaintext.expose_secret())?;
                writer
                    .write_all(&container)
                    .stage("writing single-shot container")?;
            }
        }
        let metadata = writer.commit()?;

        info!(name, ?format, "object stored");
        Ok(ObjectInfo::from_metadata(name.to_owned(), &metadata))
    }

    /// Decrypt an object into `destination`, published atomically
    ///
    /// Returns the plaintext size. On any failure the destination is left
    /// untouched. The destination's directory must already exist.
    pub fn get<P: AsRef<Path>>(&self, name: &str, destination: P, key: &MasterKey32) -> Result<u64> {
        let destination = destination.as_ref();
        let object = self.open_object(name)?;
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(CoreError::NotFound(parent.to_path_buf()));
            }
        }
        let mut out = AtomicWriter::create(destination)?;
        let written = self.decode_object(name, object, &mut out, key)?;
        out.commit()?;
        Ok(written)
    }

    /// Decrypt an object into any sink
    ///
    /// Streaming objects are written chunk by chunk as they authenticate, so
    /// on failure the sink may already hold earlier chunks.
    pub fn get_to_writer<W: Write>(&self, name: &str, sink: W, key: &MasterKey32) -> Result<u64> {
        let object = self.open_object(name)?;
        self.decode_object(name, object, sink, key)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.object_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(name, "object deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(CoreError::NotFound(path)),
            Err(source) => Err(CoreError::Io {
                stage: "deleting object",
                source,
            }),
        }
    }

    /// Snapshot of stored objects, sorted by name
    ///
    /// A vault directory that does not exist yet lists as empty.
    pub fn list(&self) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        for (file_name, metadata) in self.scan()? {
            if let Some(name) = object_name(&file_name) {
                objects.push(ObjectInfo::from_metadata(name, &metadata));
            }
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    pub fn stat(&self, name: &str) -> Result<ObjectInfo> {
        let path = self.object_path(name)?;
        let metadata = fs::metadata(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CoreError::NotFound(path.clone()),
            _ => CoreError::Io {
                stage: "reading object metadata",
                source: err,
            },
        })?;
        Ok(ObjectInfo::from_metadata(name.to_owned(), &metadata))
    }

    /// Leftover `.partial` files from interrupted writes
    pub fn stale_partials(&self) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{OBJECT_EXTENSION}.{PARTIAL_SUFFIX}");
        let mut partials: Vec<PathBuf> = self
            .scan()?
            .into_iter()
            .filter(|(file_name, _)| file_name.ends_with(&suffix))
            .map(|(file_name, _)| self.dir.join(file_name))
            .collect();
        partials.sort();
        Ok(partials)
    }

    /// Delete stale partials that no live writer holds; returns how many went
    pub fn remove_stale_partials(&self) -> Result<usize> {
        let mut removed = 0;
        for partial in self.stale_partials()? {
            if remove_if_unlocked(&partial)? {
                info!(partial = %partial.display(), "removed stale partial file");
                removed += 1;
            } else {
                debug!(partial = %partial.display(), "partial file in use, kept");
            }
        }
        Ok(removed)
    }

    fn open_object(&self, name: &str) -> Result<File> {
        let path = self.object_path(name)?;
        File::open(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CoreError::NotFound(path.clone()),
            _ => CoreError::Io {
                stage: "opening object",
                source: err,
            },
        })
    }

    fn decode_object<W: Write>(
        &self,
        name: &str,
        object: File,
        sink: W,
        key: &MasterKey32,
    ) -> Result<u64> {
        let cipher = Cipher::from_master_key(key);
        let decoded = decode_container(&cipher, BufReader::new(object), sink)?;
        debug!(name, format = ?decoded.format, bytes = decoded.plaintext_bytes, "object decrypted");
        Ok(decoded.plaintext_bytes)
    }

    /// Regular files in the vault directory with UTF-8 names
    fn scan(&self) -> Result<Vec<(String, Metadata)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CoreError::Io {
                    stage: "reading vault directory",
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.stage("reading vault directory entry")?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            // Entries can vanish between readdir and stat
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(file = %file_name, error = %err, "skipping unreadable vault entry");
                    continue;
                }
            };
            if metadata.is_file() {
                files.push((file_name, metadata));
            }
        }
        Ok(files)
    }
}

/// Strip `.crypta` from a directory entry; `None` for anything else
fn object_name(file_name: &str) -> Option<String> {
    let name = file_name
        .strip_suffix(OBJECT_EXTENSION)?
        .strip_suffix('.')?;
    (!name.is_empty()).then(|| name.to_owned())
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CoreError::InvalidName(name.to_owned()));
    }
    Ok(())
}
