//! # Film Roll Archive
//!
//! Gives every scanned film exposure a stable identity.
//!
//! Each roll is a directory of exported scans plus the RAW files they came
//! from. The engine groups exports that share a capture timestamp, picks
//! one master per group, numbers masters 1..N in capture order and binds
//! them to their RAW files. Nothing on disk is changed.
//!
//! ## Architecture
//! - `core` - The resolution engine
//! - `config` - Per-roll policies and scanner settings
//! - `events` - Progress events and per-roll diagnostics
//! - `error` - Error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::{ArchiveConfig, RollPolicy};
pub use error::{ArchiveError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides `default_directive`. Output goes to stderr.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
