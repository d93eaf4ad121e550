pub mod autosave;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fallback;

pub use autosave::AutosaveChannel;
pub use client::{Collector, HttpCollector};
pub use config::SyncConfig;
pub use error::SyncError;
pub use export::{export_file_name, write_snapshot};
pub use fallback::StimulusProvider;
