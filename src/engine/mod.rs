mod access;
mod analytics;
mod query;
mod search;

pub use access::*;
pub use analytics::*;
pub use query::*;
pub use search::*;
