use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use log::{debug, warn};

use super::config::{owner_token, scratch_sibling};
use super::error::StoreError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory cross-process write lock, held as long as the value lives.
///
/// The lock is a sibling file created with `create_new` and holding an owner
/// token. Dropping the guard removes the file only while it still carries
/// that token. Readers never take it.
#[derive(Debug)]
pub(crate) struct WriteLock {
    path: PathBuf,
    token: String,
}

impl WriteLock {
    pub(crate) fn acquire(
        path: &Path,
        timeout: Duration,
        stale_after: Duration,
    ) -> Result<Self, StoreError> {
        let started = Instant::now();
        let mut contended = false;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut f) => {
                    let token = owner_token();
                    if let Err(e) = f.write_all(token.as_bytes()).and_then(|()| f.sync_all()) {
                        drop(f);
                        let _ = fs::remove_file(path);
                        return Err(StoreError::storage(path, e));
                    }
                    if contended {
                        debug!(
                            "Acquired {} after {:?}",
                            path.display(),
                            started.elapsed()
                        );
                    }
                    return Ok(WriteLock {
                        path: path.to_path_buf(),
                        token,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !contended {
                        debug!("Write lock {} is held; waiting", path.display());
                        contended = true;
                    }
                    if is_stale(path, stale_after) {
                        break_stale(path, stale_after)?;
                        continue;
                    }
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(StoreError::storage(path, e)),
            }
        }
    }
}

/// Move a stale lock out of the way without ever deleting a live one.
///
/// The rename is atomic, so of several waiters that saw the same stale lock
/// only one moves it. A waiter that lost that race may instead move the
/// winner's fresh lock; the moved file is then still fresh and is linked back.
fn break_stale(path: &Path, stale_after: Duration) -> Result<(), StoreError> {
    let moved = scratch_sibling(path, "stale");
    match fs::rename(path, &moved) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::storage(path, e)),
    }

    if is_stale(&moved, stale_after) {
        warn!("Broke stale write lock {}", path.display());
    } else {
        match fs::hard_link(&moved, path) {
            Ok(()) => debug!("Restored live write lock {}", path.display()),
            Err(e) => warn!("Could not restore write lock {}: {e}", path.display()),
        }
    }

    if let Err(e) = fs::remove_file(&moved) {
        warn!("Failed to remove {}: {e}", moved.display());
    }
    Ok(())
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!("Failed to release write lock {}: {e}", self.path.display());
                }
            }
            Ok(_) => warn!(
                "Write lock {} was taken over by another writer",
                self.path.display()
            ),
            Err(e) => warn!("Failed to release write lock {}: {e}", self.path.display()),
        }
    }
}
