// tests/support.rs
//! Test utilities: throwaway vault directories and fixed keys

use std::fs;
use std::path::{Path, PathBuf};

use crypta_vault::consts::{LENGTH_PREFIX_SIZE, MAGIC_SIZE, NONCE_SIZE, STREAM_MAGIC};
use crypta_vault::{key_from_slice, MasterKey32, ObjectStore};
use tempfile::TempDir;

#[allow(dead_code)] // Not every test binary touches every helper
pub struct TestVault {
    pub store: ObjectStore,
    pub key: MasterKey32,
    dir: TempDir,
}

#[allow(dead_code)]
impl TestVault {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = ObjectStore::new(dir.path().join("crypta"));
        Self {
            store,
            key: fixed_key(0x42),
            dir,
        }
    }

    /// Same vault, but anything larger than `threshold` bytes streams
    pub fn with_threshold(threshold: u64) -> Self {
        let mut vault = Self::new();
        vault.store = vault.store.clone().with_large_file_threshold(threshold);
        vault
    }

    /// Scratch directory outside the vault for sources and destinations
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_source(&self, file_name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(file_name);
        fs::write(&path, contents).expect("write source file");
        path
    }

    pub fn raw_object(&self, name: &str) -> Vec<u8> {
        fs::read(self.store.object_path(name).unwrap()).expect("read stored object")
    }

    pub fn overwrite_raw_object(&self, name: &str, bytes: &[u8]) {
        fs::write(self.store.object_path(name).unwrap(), bytes).expect("overwrite stored object");
    }
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
pub fn fixed_key(byte: u8) -> MasterKey32 {
    key_from_slice(&[byte; 32]).unwrap()
}

/// Walk the framing of a streaming container and return each chunk's ciphertext length
#[allow(dead_code)]
pub fn chunk_lengths(container: &[u8]) -> Vec<usize> {
    assert_eq!(&container[..MAGIC_SIZE], STREAM_MAGIC);
    let mut lengths = Vec::new();
    let mut pos = MAGIC_SIZE;
    while pos < container.len() {
        let prefix: [u8; LENGTH_PREFIX_SIZE] = container[pos..pos + LENGTH_PREFIX_SIZE]
            .try_into()
            .unwrap();
        let len = u32::from_le_bytes(prefix) as usize;
        lengths.push(len);
        pos += LENGTH_PREFIX_SIZE + NONCE_SIZE + len;
    }
    assert_eq!(pos, container.len(), "framing must end exactly at EOF");
    lengths
}
