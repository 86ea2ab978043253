//! Filesystem primitives for the TechKwiz sync engine
//!
//! Provides locked, atomic file I/O, content checksums, and format-agnostic
//! configuration loading. Everything the sync engine persists (store
//! snapshots, the sync history, engine configuration) goes through here.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use checksum::compute_content_checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
