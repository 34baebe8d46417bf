use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = ".lock";

/// How long a CLI run waits for another `lb` to finish
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const FIRST_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Exclusive hold on a data directory for the length of one `lb` run.
///
/// The holder writes its pid into the lock file so a blocked run can say who
/// it is waiting for. The file itself is left in place on release: unlinking
/// it would let a later run lock a fresh inode while an earlier waiter still
/// holds the old one.
#[derive(Debug)]
pub struct DataLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data directory {} is busy{}", data_dir.display(), holder_suffix(*holder))]
    Busy {
        data_dir: PathBuf,
        holder: Option<u32>,
    },
}

fn holder_suffix(holder: Option<u32>) -> String {
    match holder {
        Some(pid) => format!(": another lb process (pid {}) is using it", pid),
        None => ": another lb process is using it".to_string(),
    }
}

impl DataLock {
    /// Lock `data_dir`, creating it if needed, waiting up to `wait`.
    pub fn acquire(data_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let open_err = |source| LockError::Open {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(data_dir).map_err(open_err)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(open_err)?;

        let deadline = Instant::now() + wait;
        let mut backoff = FIRST_BACKOFF;
        while !try_lock(&file) {
            let now = Instant::now();
            if now >= deadline {
                let holder = read_holder(&path);
                tracing::warn!(path = %path.display(), ?holder, "data directory busy");
                return Err(LockError::Busy {
                    data_dir: data_dir.to_path_buf(),
                    holder,
                });
            }
            std::thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        let mut lock = DataLock { file, path };
        if let Err(e) = lock.record_holder() {
            tracing::debug!(error = %e, "could not record lock holder");
        }
        tracing::debug!(path = %lock.path.display(), "data directory locked");
        Ok(lock)
    }

    /// Lock with [`DEFAULT_WAIT`].
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_holder(&mut self) -> std::io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        write!(self.file, "{}", std::process::id())?;
        self.file.flush()
    }
}

impl Drop for DataLock {
    fn drop(&mut self) {
        // The flock goes with the handle; only the pid needs clearing.
        let _ = self.file.set_len(0);
    }
}

/// Pid recorded by the current holder, if it wrote one.
fn read_holder(path: &Path) -> Option<u32> {
    let mut text = String::new();
    File::open(path).ok()?.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
fn try_lock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_data_dir_and_records_pid() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("nested/home");
        let lock = DataLock::acquire_default(&data_dir).unwrap();
        assert_eq!(lock.path(), data_dir.join(LOCK_FILE));
        assert_eq!(read_holder(lock.path()), Some(std::process::id()));
    }

    #[test]
    fn release_keeps_file_and_clears_pid() {
        let tmp = TempDir::new().unwrap();
        let lock = DataLock::acquire_default(tmp.path()).unwrap();
        drop(lock);
        let path = tmp.path().join(LOCK_FILE);
        assert!(path.exists());
        assert_eq!(read_holder(&path), None);
        assert!(DataLock::acquire_default(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn busy_directory_names_the_holder() {
        let tmp = TempDir::new().unwrap();
        let _held = DataLock::acquire_default(tmp.path()).unwrap();
        let err = DataLock::acquire(tmp.path(), Duration::from_millis(30)).unwrap_err();
        match &err {
            LockError::Busy { holder, .. } => assert_eq!(*holder, Some(std::process::id())),
            other => panic!("expected Busy, got {other:?}"),
        }
        assert!(err.to_string().contains("another lb process (pid"));
    }
}
