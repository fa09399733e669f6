use anyhow::Result;
use std::path::{Path, PathBuf};

pub use futures::future::BoxFuture;

/// Byte-level download progress callback: `(transferred, total)`
pub type ByteProgress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Fetches an archive to a local path.
pub trait ArchiveDownloader: Send + Sync {
    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        progress: ByteProgress<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Unpacks an archive into a directory.
pub trait ArchiveExtractor: Send + Sync {
    fn extract<'a>(&'a self, archive: &'a Path, dest_dir: &'a Path) -> BoxFuture<'a, Result<()>>;
}

/// Filesystem operations on the destination, some of which may need
/// elevated privileges.
pub trait PrivilegedFs: Send + Sync {
    /// Create a directory and its parents; existing directories are fine
    fn create_dir_all<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>>;

    /// Move `src` to exactly `dest`
    fn move_path<'a>(&'a self, src: &'a Path, dest: &'a Path) -> BoxFuture<'a, Result<()>>;

    /// Remove a file or directory tree; a missing path is not an error
    fn remove_path<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>>;

    /// Names of the entries directly inside `dir`, sorted. A missing
    /// directory lists as empty.
    fn list_dir<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// Paths of the scratch artifacts for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempWorkspace {
    pub archive: PathBuf,
    pub extract_dir: PathBuf,
}

impl TempWorkspace {
    /// `<temp>/setapp-<random>-<id>.zip` and `<temp>/setapp-<random>-<id>/`.
    /// The random token keeps concurrent pipelines, including two for the
    /// same id, from sharing scratch paths.
    pub fn new(temp_dir: &Path, target_id: u64) -> Self {
        let stem = format!("setapp-{}-{}", uuid::Uuid::new_v4().simple(), target_id);
        Self {
            archive: temp_dir.join(format!("{}.zip", stem)),
            extract_dir: temp_dir.join(stem),
        }
    }
}
