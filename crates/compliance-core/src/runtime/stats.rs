// crates/compliance-core/src/runtime/stats.rs
// ============================================================================
// Module: Stats Aggregator
// Description: Reduces test runs into overall and per-group counters.
// Purpose: Provide pass/fail totals that drive reporting and exit status.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Skipped runs are "undetermined": they are counted in `skipped` only and
//! never contribute to `total`, `passed`, or `failed`. A group is failed when
//! at least one member run failed, passed when it has executed runs and none
//! failed, and undetermined when every member was skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::GroupLabel;
use crate::core::Outcome;
use crate::core::TestRun;

// ============================================================================
// SECTION: Group Stats
// ============================================================================

/// Aggregate status of one reporting group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// At least one run executed and none failed.
    Passed,
    /// At least one run failed.
    Failed,
    /// Every run was skipped.
    Undetermined,
}

/// Counters for one reporting group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Passed runs.
    pub passed: usize,
    /// Failed runs.
    pub failed: usize,
    /// Skipped runs.
    pub skipped: usize,
}

impl GroupStats {
    /// Returns the aggregate group status.
    #[must_use]
    pub const fn status(&self) -> GroupStatus {
        if self.failed > 0 {
            GroupStatus::Failed
        } else if self.passed > 0 {
            GroupStatus::Passed
        } else {
            GroupStatus::Undetermined
        }
    }
}

// ============================================================================
// SECTION: Stats
// ============================================================================

/// Aggregate statistics for one suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Executed (non-skipped) runs.
    pub total: usize,
    /// Runs without a failure.
    pub passed: usize,
    /// Runs with a failure.
    pub failed: usize,
    /// Runs skipped by cascade; excluded from `total`.
    pub skipped: usize,
    /// Per-group counters keyed by group label.
    pub groups: BTreeMap<GroupLabel, GroupStats>,
}

impl Stats {
    /// Reduces an ordered sequence of runs.
    #[must_use]
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a TestRun>) -> Self {
        let mut stats = Self::default();
        for run in runs {
            stats.add(run);
        }
        stats
    }

    /// Folds one run into the counters.
    pub fn add(&mut self, run: &TestRun) {
        let group = self.groups.entry(run.group.clone()).or_default();
        match run.outcome {
            Outcome::Passed {
                ..
            } => {
                self.total += 1;
                self.passed += 1;
                group.passed += 1;
            }
            Outcome::Failed {
                ..
            } => {
                self.total += 1;
                self.failed += 1;
                group.failed += 1;
            }
            Outcome::Skipped {
                ..
            } => {
                self.skipped += 1;
                group.skipped += 1;
            }
        }
    }

    /// Returns true when no executed run failed.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed == 0
    }

    /// Returns the number of groups with at least one failed run.
    #[must_use]
    pub fn groups_failed(&self) -> usize {
        self.count_groups(GroupStatus::Failed)
    }

    /// Returns the number of groups whose executed runs all passed.
    #[must_use]
    pub fn groups_passed(&self) -> usize {
        self.count_groups(GroupStatus::Passed)
    }

    /// Returns the status of a group, if present.
    #[must_use]
    pub fn group_status(&self, group: &GroupLabel) -> Option<GroupStatus> {
        self.groups.get(group).map(GroupStats::status)
    }

    /// Counts groups with the given status.
    fn count_groups(&self, status: GroupStatus) -> usize {
        self.groups.values().filter(|group| group.status() == status).count()
    }
}
