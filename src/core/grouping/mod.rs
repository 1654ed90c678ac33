//! # Grouping Module
//!
//! Resolves a roll's exposures into masters and copies.
//!
//! ## Algorithm
//! 1. Clear any previous roles, so a second run starts from scratch
//! 2. Group exposures by exact capture timestamp; exposures without one are
//!    never grouped
//! 3. Pick one master per group with [`select_master`]; the rest become its
//!    copies
//! 4. Order masters by capture timestamp, untimed masters last
//!
//! A roll policy with `skip_grouping` makes every exposure its own master.

mod ranking;

pub use ranking::{select_master, FilmKind, RankKey, Selection, SelectionReason};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RollPolicy;
use crate::core::exposure::{Exposure, ExposureId};
use crate::core::roll::Roll;
use crate::events::{DiagnosticKind, RollLog, Subject};

/// One resolved capture-timestamp group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResolution {
    pub timestamp: Option<NaiveDateTime>,
    pub master: ExposureId,
    pub copies: Vec<ExposureId>,
    pub reason: SelectionReason,
}

impl GroupResolution {
    pub fn size(&self) -> usize {
        1 + self.copies.len()
    }
}

/// Group a roll's exposures and assign master/copy roles.
///
/// Sets `roll.masters` (timestamp order), `roll.groups` and
/// `roll.grouping_overridden`.
pub fn resolve_duplicates(roll: &mut Roll, film: FilmKind, policy: &RollPolicy, log: &mut RollLog) {
    for exposure in &mut roll.exposures {
        exposure.clear_role();
    }

    let mut by_timestamp: BTreeMap<NaiveDateTime, Vec<ExposureId>> = BTreeMap::new();
    let mut untimed: Vec<ExposureId> = Vec::new();
    for exposure in &roll.exposures {
        match exposure.date_exposed() {
            Some(ts) => by_timestamp.entry(ts).or_default().push(exposure.id),
            None => untimed.push(exposure.id),
        }
    }

    let mut groups = Vec::with_capacity(by_timestamp.len() + untimed.len());

    for (timestamp, members) in &by_timestamp {
        let member_refs: Vec<&Exposure> = members.iter().map(|id| roll.exposure(*id)).collect();

        if policy.skip_grouping {
            groups.extend(overridden_groups(*timestamp, &member_refs, policy, log));
            continue;
        }

        let Some(selection) = select_master(&member_refs, film) else {
            continue;
        };

        if selection.reason == SelectionReason::FilenameOrder {
            let master = roll.exposure(selection.master);
            log.info(
                DiagnosticKind::AmbiguousSelection,
                Subject::exposure(&master.file_name, master.provisional_index()),
                format!(
                    "{} files captured {} tie on every criterion; chose by filename",
                    members.len(),
                    timestamp
                ),
            );
        }

        if !selection.copies.is_empty() {
            tracing::debug!(
                roll = roll.id.0,
                master = %roll.exposure(selection.master).file_name,
                copies = selection.copies.len(),
                reason = %selection.reason,
                "Resolved duplicate group"
            );
        }

        groups.push(GroupResolution {
            timestamp: Some(*timestamp),
            master: selection.master,
            copies: selection.copies,
            reason: selection.reason,
        });
    }

    untimed.sort_by_key(|id| {
        let e = roll.exposure(*id);
        let index = e.provisional_index();
        (index.is_none(), index, e.file_name.clone())
    });
    groups.extend(untimed.into_iter().map(|id| GroupResolution {
        timestamp: None,
        master: id,
        copies: Vec::new(),
        reason: SelectionReason::NoTimestamp,
    }));

    apply_roles(roll, &groups);
    roll.masters = groups.iter().map(|g| g.master).collect();
    roll.groups = groups;
    roll.grouping_overridden = policy.skip_grouping;
}

/// Every member of a timestamp group becomes its own master, ordered by name
fn overridden_groups(
    timestamp: NaiveDateTime,
    members: &[&Exposure],
    policy: &RollPolicy,
    log: &mut RollLog,
) -> Vec<GroupResolution> {
    let mut members = members.to_vec();
    members.sort_by(|a, b| a.file_name.cmp(&b.file_name).then_with(|| a.path.cmp(&b.path)));

    if members.len() > 1 {
        let names: Vec<&str> = members.iter().map(|e| e.file_name.as_str()).collect();
        let note = policy.note.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default();
        log.info(
            DiagnosticKind::GroupingOverridden,
            Subject::roll(),
            format!(
                "grouping skipped for {} files captured {}{}: {}",
                members.len(),
                timestamp,
                note,
                names.join(", ")
            ),
        );
    }

    let reason = if members.len() > 1 {
        SelectionReason::Overridden
    } else {
        SelectionReason::Singleton
    };

    members
        .into_iter()
        .map(|e| GroupResolution {
            timestamp: Some(timestamp),
            master: e.id,
            copies: Vec::new(),
            reason,
        })
        .collect()
}

fn apply_roles(roll: &mut Roll, groups: &[GroupResolution]) {
    for group in groups {
        let master = roll.exposure_mut(group.master);
        master.is_master = true;
        master.original = Some(group.master);
        master.copies = group.copies.clone();

        for copy_id in &group.copies {
            let copy = roll.exposure_mut(*copy_id);
            copy.is_master = false;
            copy.original = Some(group.master);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exposure::keys;
    use crate::core::fixtures::RollFixture;
    use serde_json::json;

    fn policy() -> RollPolicy {
        RollPolicy::default()
    }

    #[test]
    fn same_timestamp_forms_one_group() {
        let (mut roll, mut log) = RollFixture::new(1)
            .export("a 1.jpg", 200, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("a 2.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("a 3.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 11:00:00"))])
            .build();

        resolve_duplicates(&mut roll, FilmKind::Color, &policy(), &mut log);

        assert_eq!(roll.master_count(), 2);
        let master = roll.find("a 1.jpg").unwrap();
        let copy = roll.find("a 2.jpg").unwrap();
        assert!(master.is_master);
        assert_eq!(master.original, Some(master.id));
        assert_eq!(master.copies, vec![copy.id]);
        assert_eq!(copy.original, Some(master.id));
        assert!(copy.copies.is_empty());
        assert_eq!(roll.groups[0].reason, SelectionReason::LargerFile);
    }

    #[test]
    fn masters_sorted_by_timestamp_untimed_last() {
        let (mut roll, mut log) = RollFixture::new(1)
            .export("x 9.jpg", 100, &[(keys::CITY, json!("Bern"))])
            .export("x 5.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:02 10:00:00"))])
            .export("x 4.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("x 2.jpg", 100, &[])
            .build();

        resolve_duplicates(&mut roll, FilmKind::Color, &policy(), &mut log);

        let order: Vec<&str> = roll.masters().map(|e| e.file_name.as_str()).collect();
        assert_eq!(order, vec!["x 4.jpg", "x 5.jpg", "x 2.jpg", "x 9.jpg"]);
        assert_eq!(roll.groups[2].reason, SelectionReason::NoTimestamp);
    }

    #[test]
    fn override_skips_grouping() {
        let (mut roll, mut log) = RollFixture::new(12)
            .export("b 2.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("a 1.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .build();
        let policy = RollPolicy {
            skip_grouping: true,
            ..Default::default()
        };

        resolve_duplicates(&mut roll, FilmKind::Color, &policy, &mut log);

        assert_eq!(roll.master_count(), 2);
        assert_eq!(roll.copy_count(), 0);
        assert!(roll.grouping_overridden);
        let order: Vec<&str> = roll.masters().map(|e| e.file_name.as_str()).collect();
        assert_eq!(order, vec!["a 1.jpg", "b 2.jpg"]);
        assert_eq!(log.count(DiagnosticKind::GroupingOverridden), 1);
    }

    #[test]
    fn full_tie_is_logged() {
        let (mut roll, mut log) = RollFixture::new(1)
            .export("b 1.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("a 1.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .build();

        resolve_duplicates(&mut roll, FilmKind::Color, &policy(), &mut log);

        assert!(roll.find("a 1.jpg").unwrap().is_master);
        assert_eq!(log.count(DiagnosticKind::AmbiguousSelection), 1);
    }

    #[test]
    fn rerun_recomputes_from_scratch() {
        let (mut roll, mut log) = RollFixture::new(1)
            .export("a 1.jpg", 200, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .export("a 2.jpg", 100, &[(keys::DATE_EXPOSED, json!("2023:01:01 10:00:00"))])
            .build();

        resolve_duplicates(&mut roll, FilmKind::Color, &policy(), &mut log);
        let first = roll.groups.clone();
        resolve_duplicates(&mut roll, FilmKind::Color, &policy(), &mut log);

        assert_eq!(roll.groups, first);
        assert_eq!(roll.find("a 1.jpg").unwrap().copies.len(), 1);
    }
}
