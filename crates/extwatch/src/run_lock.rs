use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another extwatch run is already in progress")]
    AlreadyRunning,
    #[error("failed to resolve application paths: {0}")]
    Paths(#[from] extwatch_platform::AppPathsError),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Exclusive lock held for the duration of a run. Released on drop.
pub struct RunLock {
    _file: File,
}

impl RunLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| LockError::io("failed to create lock directory", error))?;
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|error| LockError::io("failed to open run lock file", error))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(LockError::AlreadyRunning);
            }
            Err(error) => return Err(LockError::io("failed to acquire run lock", error)),
        }

        lock_file
            .set_len(0)
            .and_then(|()| lock_file.seek(SeekFrom::Start(0)).map(|_| ()))
            .and_then(|()| writeln!(lock_file, "{}", std::process::id()))
            .map_err(|error| LockError::io("failed to write run lock metadata", error))?;

        log::debug!("Acquired run lock at {}", path.display());
        Ok(Self { _file: lock_file })
    }

    /// Lock at the default per-user location.
    pub fn acquire_default() -> Result<Self, LockError> {
        let paths = extwatch_platform::AppPaths::new()?;
        Self::acquire(&paths.lock_file())
    }
}
