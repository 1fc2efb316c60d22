// src/core/writer.rs
//! Crash-safe publishing of a file through a `.partial` sibling
//!
//! Write sequence:
//!
//! 1. Open `<final>.partial` and take an exclusive, non-blocking lock on it
//! 2. Write everything through the [`AtomicWriter`]
//! 3. `fsync` the partial file
//! 4. Rename it over `<final>`, then `fsync` the directory
//!
//! The parent directory must already exist; callers that own it (the vault)
//! create it with [`ensure_dir`].
//!
//! Readers only ever open final paths, so they observe the previous file or
//! the new one, never a mix. A writer dropped before [`AtomicWriter::commit`]
//! removes its partial file. A crash leaves at most a stale `.partial`.

use std::fs::{self, File, Metadata, OpenOptions, TryLockError};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::consts::PARTIAL_SUFFIX;
use crate::error::{CoreError, IoStage, Result};

// Reopen attempts when a finished writer renames the partial out from under us
const LOCK_ATTEMPTS: usize = 3;

/// Exclusive writer for one final path
#[derive(Debug)]
pub struct AtomicWriter {
    final_path: PathBuf,
    partial_path: PathBuf,
    out: BufWriter<File>,
    committed: bool,
}

impl AtomicWriter {
    /// Start writing `final_path` via its partial sibling
    ///
    /// Fails with `WriteInProgress` if another live writer holds the same
    /// partial path. The partial is truncated only after the lock is held.
    /// Missing parent directories are not created.
    pub fn create<P: AsRef<Path>>(final_path: P) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();
        let partial_path = partial_path_for(&final_path);

        let file = open_locked(&partial_path)?;
        file.set_len(0).stage("truncating partial file")?;
        debug!(partial = %partial_path.display(), "partial file locked");

        Ok(Self {
            final_path,
            partial_path,
            out: BufWriter::new(file),
            committed: false,
        })
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    /// Flush, sync, and rename into place
    ///
    /// Returns the metadata of the published file, read from the still-open
    /// handle so a concurrent unlink of the final path cannot fail the commit.
    /// Any failure before the rename drops `self`, which removes the partial.
    pub fn commit(mut self) -> Result<Metadata> {
        self.out.flush().stage("flushing partial file")?;
        let file = self.out.get_ref();
        file.sync_all().stage("syncing partial file")?;
        let metadata = file.metadata().stage("reading partial file metadata")?;
        fs::rename(&self.partial_path, &self.final_path).stage("renaming partial into place")?;
        self.committed = true;

        // Published already; a failed directory sync cannot be undone here
        if let Some(parent) = parent_dir(&self.final_path) {
            if let Err(err) = sync_dir(parent) {
                warn!(dir = %parent.display(), error = %err, "directory sync after rename failed");
            }
        }

        debug!(path = %self.final_path.display(), "committed");
        Ok(metadata)
    }
}

impl Write for AtomicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Removal failure must not mask the primary error
        match fs::remove_file(&self.partial_path) {
            Ok(()) => debug!(partial = %self.partial_path.display(), "discarded partial file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                partial = %self.partial_path.display(),
                error = %err,
                "failed to remove partial file"
            ),
        }
    }
}

/// `<final>.partial`, in the same directory so the rename stays on one filesystem
pub fn partial_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Create the directory (and parents) if absent, owner-only on Unix
pub fn ensure_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).stage("creating directory")
}

/// Remove a leftover partial unless a live writer still holds its lock
///
/// Returns whether the file was removed.
pub fn remove_if_unlocked(partial_path: &Path) -> Result<bool> {
    let file = match OpenOptions::new().read(true).open(partial_path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(CoreError::Io {
                stage: "opening stale partial file",
                source,
            })
        }
    };

    match file.try_lock() {
        Ok(()) => {}
        Err(TryLockError::WouldBlock) => return Ok(false),
        Err(TryLockError::Error(source)) => {
            return Err(CoreError::Io {
                stage: "locking stale partial file",
                source,
            })
        }
    }

    match fs::remove_file(partial_path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CoreError::Io {
            stage: "removing stale partial file",
            source,
        }),
    }
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn open_locked(partial_path: &Path) -> Result<File> {
    for _ in 0..LOCK_ATTEMPTS {
        let file = partial_options()
            .open(partial_path)
            .stage("creating partial file")?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(CoreError::WriteInProgress(partial_path.to_path_buf()))
            }
            Err(TryLockError::Error(source)) => {
                return Err(CoreError::Io {
                    stage: "locking partial file",
                    source,
                })
            }
        }

        if still_linked(&file, partial_path)? {
            return Ok(file);
        }
        debug!(partial = %partial_path.display(), "partial file replaced while locking, reopening");
    }
    Err(CoreError::WriteInProgress(partial_path.to_path_buf()))
}

fn partial_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// The locked handle must still be the file at `path`, not one already renamed away
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata().stage("inspecting partial file")?;
    match fs::metadata(path) {
        Ok(current) => Ok(held.dev() == current.dev() && held.ino() == current.ino()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CoreError::Io {
            stage: "inspecting partial path",
            source,
        }),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> Result<bool> {
    Ok(path.exists())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
