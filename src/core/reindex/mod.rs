//! # Reindex Module
//!
//! Assigns final frame numbers after duplicate resolution.
//!
//! Masters are numbered 1..N in the order grouping left them (capture
//! timestamp order) and each copy takes its master's number. Filename frame
//! numbers are only inspected for collisions; they never influence the
//! result.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::exposure::ExposureId;
use crate::core::roll::Roll;
use crate::events::{DiagnosticKind, RollLog, Subject};

/// What reindexing found and changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexOutcome {
    /// Filename frame numbers used by more than one exposure group
    pub duplicate_provisional: Vec<u32>,
    /// Masters whose final index differs from their filename number
    pub renumbered: usize,
    /// Number of masters, the highest final index
    pub total: usize,
}

/// Number the roll's masters densely from 1 and propagate to copies
pub fn reindex(roll: &mut Roll, log: &mut RollLog) -> ReindexOutcome {
    let duplicate_provisional = detect_collisions(roll, log);

    let mut renumbered = 0;
    let masters = roll.masters.clone();
    for (position, master_id) in masters.iter().enumerate() {
        let index = (position + 1) as u32;

        let master = roll.exposure_mut(*master_id);
        if master.provisional_index() != Some(index) {
            renumbered += 1;
        }
        master.index = Some(index);

        let copies = master.copies.clone();
        for copy_id in copies {
            roll.exposure_mut(copy_id).index = Some(index);
        }
    }

    let outcome = ReindexOutcome {
        duplicate_provisional,
        renumbered,
        total: masters.len(),
    };

    tracing::debug!(
        roll = roll.id.0,
        total = outcome.total,
        renumbered = outcome.renumbered,
        "Reindexed roll"
    );

    roll.reindex = outcome.clone();
    outcome
}

/// Filename numbers claimed by exposures of different groups
fn detect_collisions(roll: &Roll, log: &mut RollLog) -> Vec<u32> {
    let mut claims: BTreeMap<u32, BTreeSet<ExposureId>> = BTreeMap::new();
    for exposure in &roll.exposures {
        if let Some(index) = exposure.provisional_index() {
            let group = exposure.original.unwrap_or(exposure.id);
            claims.entry(index).or_default().insert(group);
        }
    }

    let mut duplicates = Vec::new();
    for (index, groups) in claims {
        if groups.len() < 2 {
            continue;
        }
        let names: Vec<&str> = roll
            .exposures
            .iter()
            .filter(|e| e.provisional_index() == Some(index))
            .map(|e| e.file_name.as_str())
            .collect();
        log.warn(
            DiagnosticKind::DuplicateIndex,
            Subject::index(index),
            format!("frame number {} used by {} exposures: {}", index, groups.len(), names.join(", ")),
        );
        duplicates.push(index);
    }
    duplicates
}
