mod media;
mod permissions;
mod shard;

pub use media::*;
pub use permissions::*;
pub use shard::*;
