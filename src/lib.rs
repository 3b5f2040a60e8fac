pub mod config;
pub mod constants;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;
pub mod vault;

#[cfg(test)]
pub mod test_utils;

pub const VERSION: &str = "0.1.0";
