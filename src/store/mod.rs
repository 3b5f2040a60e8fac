mod cache;
mod document;
mod index;
mod pool;
mod retry;
mod shard_store;
mod sqlite;

pub use cache::*;
pub use document::*;
pub use index::*;
pub use pool::*;
pub use retry::*;
pub use shard_store::*;
pub use sqlite::*;
