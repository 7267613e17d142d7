//! Filesystem helpers for persisting prepared tables and metadata.
//!
//! Output files are written atomically:
//! - the payload goes to a temp file in the destination directory
//! - the temp file is flushed and synced
//! - the temp file is renamed over the destination
//!
//! A writer that fails halfway leaves any existing destination file untouched, so a
//! partially rendered table or document never shows up in the output directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicWriteError<E> {
    #[error("io error: {0}")]
    Io(#[source] io::Error),
    #[error("write error: {0}")]
    Writer(#[source] E),
}

impl<E> From<io::Error> for AtomicWriteError<E> {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare relative file names like `table.csv`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Create `dir` (and its parents) if it does not exist yet and return it as an owned path.
pub fn ensure_dir(dir: impl AsRef<Path>) -> io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Atomically write `dest` with the bytes produced by `write_fn`.
///
/// Parent directories are created on demand. If `write_fn` returns an error the temp
/// file is discarded and `dest` keeps its previous contents (or stays absent).
pub fn atomic_write<T, E>(
    dest: impl AsRef<Path>,
    write_fn: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, AtomicWriteError<E>> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let out = write_fn(tmp.as_file_mut()).map_err(AtomicWriteError::Writer)?;

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    // `persist` renames with replace semantics on every platform std supports.
    tmp.persist(dest).map_err(|err| AtomicWriteError::Io(err.error))?;

    // The file is already in place; directory sync is best-effort.
    let _ = sync_parent_dir(dest);

    Ok(out)
}

/// Convenience wrapper around [`atomic_write`] for an in-memory payload.
pub fn atomic_write_bytes(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write(dest, |file| file.write_all(bytes)).map_err(|err| match err {
        AtomicWriteError::Io(err) | AtomicWriteError::Writer(err) => err,
    })
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    // Opening a directory as a file fails on some platforms; callers ignore the result.
    let dir = File::open(parent_dir_or_dot(path))?;
    dir.sync_all()
}
