//! Master selection within a duplicate-timestamp group.
//!
//! Members are ranked by a key tuple, compared lexicographically; the
//! smallest key wins:
//!
//! | # | Criterion            | Preferred                                   |
//! |---|----------------------|---------------------------------------------|
//! | a | grayscale penalty    | not a grayscale conversion of a colour film |
//! | b | panorama penalty     | not a stitched panorama                     |
//! | c | resolution           | more pixels                                 |
//! | d | file size            | larger                                      |
//! | e | creation timestamp   | earlier, unknown last                       |
//! | f | file name            | ascending                                   |

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::path::PathBuf;

use crate::core::exposure::{Exposure, ExposureId};

/// Colour class of the roll's film stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmKind {
    Color,
    BlackAndWhite,
    /// Stock could not be resolved; ranked like colour
    Unknown,
}

impl FilmKind {
    pub fn from_is_color(is_color: Option<bool>) -> Self {
        match is_color {
            Some(true) => FilmKind::Color,
            Some(false) => FilmKind::BlackAndWhite,
            None => FilmKind::Unknown,
        }
    }

    /// Whether a grayscale conversion is a lesser rendition on this film
    pub fn penalizes_grayscale(self) -> bool {
        !matches!(self, FilmKind::BlackAndWhite)
    }
}

/// Why a master won its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Only member of its group
    Singleton,
    /// No capture timestamp, never grouped
    NoTimestamp,
    /// Grouping skipped by a roll policy
    Overridden,
    ColorOverGrayscale,
    NonPanorama,
    HigherResolution,
    LargerFile,
    EarlierCreation,
    /// Full tie on every ranking criterion
    FilenameOrder,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SelectionReason::Singleton => "only member",
            SelectionReason::NoTimestamp => "no capture timestamp",
            SelectionReason::Overridden => "grouping skipped by policy",
            SelectionReason::ColorOverGrayscale => "colour preferred over grayscale conversion",
            SelectionReason::NonPanorama => "non-panorama preferred",
            SelectionReason::HigherResolution => "higher resolution",
            SelectionReason::LargerFile => "larger file",
            SelectionReason::EarlierCreation => "created earlier",
            SelectionReason::FilenameOrder => "filename order (tie)",
        };
        write!(f, "{}", text)
    }
}

/// Ranking key; the derived ordering compares fields top to bottom
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
    pub grayscale_penalty: u8,
    pub panorama_penalty: u8,
    pub resolution: Reverse<u64>,
    pub file_size: Reverse<u64>,
    /// `(unknown, timestamp)` so unknown sorts last
    pub created: (bool, Option<NaiveDateTime>),
    pub file_name: String,
    /// Only separates identical names from different export folders
    pub path: PathBuf,
}

impl RankKey {
    pub fn of(exposure: &Exposure, film: FilmKind) -> Self {
        let created = exposure.date_created();
        Self {
            grayscale_penalty: u8::from(film.penalizes_grayscale() && exposure.is_grayscale_conversion()),
            panorama_penalty: u8::from(exposure.is_stitched_panorama()),
            resolution: Reverse(exposure.pixel_count()),
            file_size: Reverse(exposure.file_size),
            created: (created.is_none(), created),
            file_name: exposure.file_name.clone(),
            path: exposure.path.clone(),
        }
    }

    /// First criterion on which `self` beats `other`
    pub fn deciding_criterion(&self, other: &RankKey) -> SelectionReason {
        if self.grayscale_penalty != other.grayscale_penalty {
            SelectionReason::ColorOverGrayscale
        } else if self.panorama_penalty != other.panorama_penalty {
            SelectionReason::NonPanorama
        } else if self.resolution != other.resolution {
            SelectionReason::HigherResolution
        } else if self.file_size != other.file_size {
            SelectionReason::LargerFile
        } else if self.created != other.created {
            SelectionReason::EarlierCreation
        } else {
            SelectionReason::FilenameOrder
        }
    }
}

/// Outcome of ranking one group
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub master: ExposureId,
    /// Remaining members, best ranked first
    pub copies: Vec<ExposureId>,
    pub reason: SelectionReason,
}

/// Rank the members of one group and pick the master
pub fn select_master(members: &[&Exposure], film: FilmKind) -> Option<Selection> {
    let mut ranked: Vec<(RankKey, ExposureId)> = members
        .iter()
        .map(|e| (RankKey::of(e, film), e.id))
        .collect();
    ranked.sort();

    let mut iter = ranked.iter();
    let (best_key, master) = iter.next()?;
    let reason = match iter.as_slice().first() {
        Some((runner_up, _)) => best_key.deciding_criterion(runner_up),
        None => SelectionReason::Singleton,
    };

    Some(Selection {
        master: *master,
        copies: iter.map(|(_, id)| *id).collect(),
        reason,
    })
}
