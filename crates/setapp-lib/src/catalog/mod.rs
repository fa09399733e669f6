pub mod cache;
pub mod fetcher;
pub mod index;
pub mod resolver;
pub mod types;

pub use cache::*;
pub use fetcher::*;
pub use index::*;
pub use resolver::*;
pub use types::*;
