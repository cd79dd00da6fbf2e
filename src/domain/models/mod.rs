pub mod config;
pub mod entry;

pub use config::{CacheConfig, Config, LockStrategy, LoggingConfig};
pub use entry::{CacheEntry, EntrySnapshot};
