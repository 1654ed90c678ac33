//! # Roll Module
//!
//! A roll owns its exposure table. Exposures refer to each other (master and
//! copies) by [`ExposureId`], the position in that table, so the roll can be
//! moved between threads and serialized without reference cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::aggregate::RollAttributes;
use crate::core::exposure::{Exposure, ExposureId};
use crate::core::grouping::GroupResolution;
use crate::core::raw_match::{RawFile, RawMatchReport};
use crate::core::reindex::ReindexOutcome;
use crate::core::reporter::RollAudit;
use crate::events::Diagnostic;

/// Numeric roll identifier, the leading number of the roll directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollId(pub u32);

impl RollId {
    /// Parse the id from a roll directory name such as `72_23-09-07 F3 P400 Flims`
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let (prefix, _) = name.split_once('_')?;
        prefix.trim().parse().ok().map(RollId)
    }
}

impl fmt::Display for RollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical film roll and everything resolved about it
#[derive(Debug, Clone, Serialize)]
pub struct Roll {
    pub id: RollId,
    pub name: String,
    /// Every exposure file of the roll, addressed by `ExposureId`
    pub exposures: Vec<Exposure>,
    /// Masters in final index order
    pub masters: Vec<ExposureId>,
    /// RAW files discovered in the roll's raw directories
    pub raw_files: Vec<RawFile>,
    /// Duplicate groups and how each master was chosen
    pub groups: Vec<GroupResolution>,
    /// Grouping was skipped by a roll policy
    pub grouping_overridden: bool,
    pub reindex: ReindexOutcome,
    pub raw_report: RawMatchReport,
    pub attributes: RollAttributes,
    pub diagnostics: Vec<Diagnostic>,
}

impl Roll {
    /// Create a roll whose exposures have not been resolved yet
    pub fn new(id: RollId, name: impl Into<String>, exposures: Vec<Exposure>, raw_files: Vec<RawFile>) -> Self {
        Self {
            id,
            name: name.into(),
            exposures,
            masters: Vec::new(),
            raw_files,
            groups: Vec::new(),
            grouping_overridden: false,
            reindex: ReindexOutcome::default(),
            raw_report: RawMatchReport::default(),
            attributes: RollAttributes::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn exposure(&self, id: ExposureId) -> &Exposure {
        &self.exposures[id.0]
    }

    pub fn exposure_mut(&mut self, id: ExposureId) -> &mut Exposure {
        &mut self.exposures[id.0]
    }

    /// Masters in final index order
    pub fn masters(&self) -> impl Iterator<Item = &Exposure> + '_ {
        self.masters.iter().map(|id| self.exposure(*id))
    }

    /// Copies grouped under their masters, masters in final index order
    pub fn copies(&self) -> impl Iterator<Item = &Exposure> + '_ {
        self.masters()
            .flat_map(|m| m.copies.iter())
            .map(|id| self.exposure(*id))
    }

    /// Exposure ids in resolution order: all masters, then all copies
    pub fn resolution_order(&self) -> Vec<ExposureId> {
        let mut order = self.masters.clone();
        for master in &self.masters {
            order.extend(self.exposure(*master).copies.iter().copied());
        }
        order
    }

    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    pub fn copy_count(&self) -> usize {
        self.exposures.iter().filter(|e| e.is_copy()).count()
    }

    /// Find an exposure by its file name
    pub fn find(&self, file_name: &str) -> Option<&Exposure> {
        self.exposures.iter().find(|e| e.file_name == file_name)
    }

    /// Master carrying the given final index
    pub fn by_index(&self, index: u32) -> Option<&Exposure> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.masters.get(position).map(|id| self.exposure(*id))
    }

    /// Structured audit summary of the roll's current state
    pub fn audit(&self) -> RollAudit {
        RollAudit::from_roll(self)
    }
}
