//! # roll-index CLI
//!
//! Command-line interface for the film roll archive.
//!
//! ## Usage
//! ```bash
//! roll-index resolve --manifest rolls.json --references references.json
//! roll-index resolve --manifest rolls.json --references references.json --output json
//! ```

mod cli;

use film_roll_archive::Result;

fn main() -> Result<()> {
    cli::run()
}
