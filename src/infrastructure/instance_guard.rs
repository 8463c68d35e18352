use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::PathBuf,
    process,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::infrastructure::directories::ResolvedPaths;

const LOCK_FILENAME: &str = ".sweeper.lock";

/// Exclusive lock on the data directory so two sweepers never share a token
/// file or moderate the same channel at once.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn acquire(paths: &ResolvedPaths) -> Result<Self> {
        let lock_path = paths.data_dir.join(LOCK_FILENAME);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                let holder = fs::read_to_string(&lock_path)
                    .ok()
                    .and_then(|raw| serde_json::from_str::<LockInfo>(&raw).ok());
                return Err(anyhow!(
                    "another sweeper is already running (pid {})",
                    holder
                        .map(|info| info.pid.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ));
            }
            Err(err) => return Err(err.into()),
        }

        write_lock_info(&mut file, process::id())?;
        tracing::info!(
            target: "lifecycle",
            pid = process::id(),
            path = %lock_path.display(),
            "acquired sweeper lock"
        );
        Ok(Self {
            file,
            path: lock_path,
        })
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    target: "lifecycle",
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove lock file on shutdown"
                );
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    started_at: i64,
}

fn write_lock_info(file: &mut File, pid: u32) -> Result<()> {
    let info = LockInfo {
        pid,
        started_at: Utc::now().timestamp_millis(),
    };
    let payload = serde_json::to_vec(&info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(root: &tempfile::TempDir) -> ResolvedPaths {
        ResolvedPaths {
            logs_dir: root.path().to_path_buf(),
            data_dir: root.path().to_path_buf(),
            token_file: root.path().join("token.json"),
        }
    }

    #[test]
    fn second_instance_is_refused_until_release() {
        let root = tempfile::tempdir().unwrap();
        let first = InstanceGuard::acquire(&paths(&root)).unwrap();
        let err = InstanceGuard::acquire(&paths(&root)).unwrap_err();
        assert!(err.to_string().contains(&process::id().to_string()));

        drop(first);
        assert!(!root.path().join(LOCK_FILENAME).exists());
        InstanceGuard::acquire(&paths(&root)).unwrap();
    }
}
