pub mod downloader;
pub mod extractor;
pub mod fs;
pub mod traits;

pub use downloader::HttpDownloader;
pub use extractor::ZipExtractor;
pub use fs::{LocalFs, SudoFs};
pub use traits::{
    ArchiveDownloader, ArchiveExtractor, BoxFuture, ByteProgress, PrivilegedFs, TempWorkspace,
};
