use super::traits::{BoxFuture, PrivilegedFs};
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command;

/// Runs destination writes through `sudo`, as installing into
/// `/Applications` normally requires. Scratch cleanup and directory
/// listings happen as the current user.
pub struct SudoFs;

impl SudoFs {
    async fn run_privileged(program: &str, args: &[&OsStr]) -> Result<()> {
        log::debug!("sudo {} {:?}", program, args);

        let output = Command::new("sudo")
            .arg(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to spawn sudo {}", program))?;

        if !output.status.success() {
            anyhow::bail!(
                "sudo {} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl PrivilegedFs for SudoFs {
    fn create_dir_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
                return Ok(());
            }
            Self::run_privileged("mkdir", &[OsStr::new("-p"), path.as_os_str()]).await
        })
    }

    fn move_path<'a>(&'a self, src: &'a Path, dest: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            Self::run_privileged("mv", &[src.as_os_str(), dest.as_os_str()]).await
        })
    }

    fn remove_path<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(remove_local(path))
    }

    fn list_dir<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(list_local(dir))
    }
}

/// Plain filesystem access as the current user. Used with `--no-sudo` and in
/// tests.
pub struct LocalFs;

impl PrivilegedFs for LocalFs {
    fn create_dir_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create {:?}", path))
        })
    }

    fn move_path<'a>(&'a self, src: &'a Path, dest: &'a Path) -> BoxFuture<'a, Result<()>> {
        let (src, dest) = (src.to_path_buf(), dest.to_path_buf());
        Box::pin(async move {
            tokio::task::spawn_blocking(move || move_path_blocking(&src, &dest))
                .await
                .context("Move task panicked")?
        })
    }

    fn remove_path<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(remove_local(path))
    }

    fn list_dir<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(list_local(dir))
    }
}

async fn remove_local(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to stat {:?}", path)),
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.with_context(|| format!("Failed to remove {:?}", path))
}

async fn list_local(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", dir)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

fn move_path_blocking(src: &Path, dest: &Path) -> Result<()> {
    match std::fs::rename(src, dest) {
        Ok(_) => Ok(()),
        Err(err) if is_cross_device_link(&err) => {
            log::debug!("Cross-device move, copying {:?} -> {:?}", src, dest);
            copy_recursive(src, dest)?;
            let removed = if src.is_dir() {
                std::fs::remove_dir_all(src)
            } else {
                std::fs::remove_file(src)
            };
            removed.with_context(|| format!("Remove source {:?}", src))
        }
        Err(err) => Err(err).with_context(|| format!("Move {:?} -> {:?}", src, dest)),
    }
}

fn copy_recursive(src: &Path, dest: &Path) -> Result<()> {
    let file_type = std::fs::symlink_metadata(src)
        .with_context(|| format!("Stat {:?}", src))?
        .file_type();

    if file_type.is_symlink() {
        #[cfg(unix)]
        {
            let target = std::fs::read_link(src)?;
            std::os::unix::fs::symlink(&target, dest)
                .with_context(|| format!("Link {:?} -> {:?}", dest, target))?;
            return Ok(());
        }
    }

    if file_type.is_dir() {
        std::fs::create_dir_all(dest).with_context(|| format!("Create copy dest {:?}", dest))?;
        for entry in std::fs::read_dir(src).with_context(|| format!("Read dir {:?}", src))? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(src, dest).with_context(|| format!("Copy file {:?} -> {:?}", src, dest))?;
    }
    Ok(())
}

fn is_cross_device_link(err: &std::io::Error) -> bool {
    #[cfg(target_family = "unix")]
    {
        // EXDEV
        err.raw_os_error() == Some(18)
    }

    #[cfg(not(target_family = "unix"))]
    {
        let _ = err;
        false
    }
}
