//! vettest-store — Result persistence and configuration.
//!
//! Implements the `ResultStore` trait for a JSON-file directory and an
//! in-memory backend, provides the retrying persistence helper, and loads
//! `vettest.toml`.

pub mod config;
pub mod file;
pub mod memory;
pub mod retry;

pub use config::{create_store, load_config, load_config_from, StoreConfig, VettestConfig};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use retry::persist_with_retry;
pub use vettest_core::error::StoreError;
