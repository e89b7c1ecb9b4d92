//! Advisory ownership lock for a queue directory.
//!
//! The segment directory is process-external shared state; two live
//! collections draining the same chain would corrupt each other's
//! bookkeeping. Holding an exclusive advisory lock on a `LOCK` file for the
//! collection's lifetime turns that misuse into an immediate
//! [`Error::Locked`](crate::Error::Locked) at construction.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Name of the lock file inside the queue directory.
pub(crate) const LOCK_FILE: &str = "LOCK";

/// Exclusive advisory lock on a queue directory.
///
/// The lock is released when the value is dropped (or the owning process
/// exits), never by `close`; a closed queue still owns its directory.
#[derive(Debug)]
pub(crate) struct DirLock {
    _file: File,
}

impl DirLock {
    pub(crate) fn acquire(dir: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { _file: file }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(Error::Locked(dir.to_path_buf()))
            }
            Err(err) => Err(Error::Io(err)),
        }
    }
}
