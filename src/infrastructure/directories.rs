use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

/// Locations the sweeper writes to, checked once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub token_file: PathBuf,
}

/// Creates the log and data directories and the token file's parent, and
/// fails early if the sweeper could not persist its lock or a refreshed token.
pub fn ensure_directories(cfg: &DirectoryConfig, token_path: &str) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(Path::new(&cfg.logs_dir))?;
    let data_dir = ensure_dir(Path::new(&cfg.data_dir))?;
    ensure_writable(&data_dir)?;

    let token_file = PathBuf::from(token_path);
    let token_dir = match token_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent)?,
        _ => PathBuf::from("."),
    };
    ensure_writable(&token_dir)
        .with_context(|| format!("token file {} cannot be written", token_file.display()))?;

    Ok(ResolvedPaths {
        logs_dir,
        data_dir,
        token_file,
    })
}

fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    Ok(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))
}

fn ensure_writable(dir: &Path) -> Result<()> {
    let probe_file = dir.join(".write-test");
    fs::write(&probe_file, b"ok")
        .with_context(|| format!("directory {} is not writable", dir.display()))?;
    fs::remove_file(&probe_file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> DirectoryConfig {
        DirectoryConfig {
            logs_dir: root.join("logs").display().to_string(),
            data_dir: root.join("nested/data").display().to_string(),
        }
    }

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let token = root.path().join("secrets/token.json");
        let paths = ensure_directories(&config(root.path()), &token.display().to_string()).unwrap();

        assert!(paths.logs_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert!(root.path().join("secrets").is_dir());
        assert_eq!(paths.token_file, token);
        assert!(!paths.data_dir.join(".write-test").exists());
    }

    #[test]
    fn bare_token_filename_resolves_against_working_directory() {
        let root = tempfile::tempdir().unwrap();
        let paths = ensure_directories(&config(root.path()), "token.json").unwrap();
        assert_eq!(paths.token_file, PathBuf::from("token.json"));
    }

    #[test]
    fn token_path_under_a_file_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let token = blocker.join("token.json");

        let err = ensure_directories(&config(root.path()), &token.display().to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("not-a-dir"));
    }
}
