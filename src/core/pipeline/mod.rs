//! # Pipeline Module
//!
//! Runs every roll of a manifest through the resolution stages.
//!
//! ## Per-Roll Stages
//! 1. **Listing** - Find export and RAW files in the roll's directories
//! 2. **Metadata** - Read all tags for the roll in one batch
//! 3. **Records** - Build exposure records and resolve the film stock
//! 4. **Grouping** - Pick a master per capture timestamp
//! 5. **Reindexing** - Number masters 1..N, copies inherit
//! 6. **RawMatching** - Bind exposures to RAW files
//! 7. **Aggregating** - Roll attributes and write-back
//!
//! ## Parallelism
//! Rolls are independent and run in parallel with rayon. Stages within a
//! roll run in order. A failing roll is reported and left out of the result;
//! the other rolls are unaffected.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineResult, RollFailure, RollInput};
