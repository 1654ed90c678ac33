//! # Core Module
//!
//! The front-end agnostic roll resolution engine.
//!
//! ## Modules
//! - `scanner` - Lists export and RAW files of a roll
//! - `metadata` - Reads embedded tags through a pluggable source
//! - `exposure` - Builds exposure records from names and tags
//! - `grouping` - Picks one master per capture timestamp
//! - `reindex` - Assigns dense final frame numbers
//! - `raw_match` - Binds exposures to RAW files
//! - `aggregate` - Roll attributes and reference lookups
//! - `reporter` - Audit summaries and exports
//! - `pipeline` - Runs rolls through every stage

pub mod aggregate;
pub mod exposure;
pub mod grouping;
pub mod metadata;
pub mod pipeline;
pub mod raw_match;
pub mod reindex;
pub mod reporter;
pub mod roll;
pub mod scanner;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use aggregate::{ReferenceTables, RollAttributes};
pub use exposure::{Exposure, ExposureId};
pub use grouping::{GroupResolution, SelectionReason};
pub use reporter::RollAudit;
pub use roll::{Roll, RollId};
