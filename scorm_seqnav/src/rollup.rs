// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rollup: aggregating children's tracking state into their ancestors.
//!
//! ## Overview
//!
//! [`overall_rollup`](Sequencer::overall_rollup) walks from an activity up to
//! the root. At each step a cluster first recomputes its weighted measure,
//! then its primary objective (by measure or by rules), then its completion,
//! and finally publishes its objectives to the global objective map.
//!
//! [`extended_rollup`](Sequencer::extended_rollup) covers the branches that
//! read a global objective the activity writes: each affected branch is
//! rolled up once, bottom-up.
//!
//! Whenever the root is touched its status is mirrored into the session.

use alloc::vec::Vec;

use scorm_activity_tree::{ActivityId, CompletionStatus, RollupAction, SuccessStatus};
use tracing::trace;

use crate::error::SequencingError;
use crate::scorm2004::Sequencer;
use crate::types::{ActivityDataStore, GlobalObjectiveMap, SequencingEventType, SequencingLog};

impl<G, S, L, R> Sequencer<'_, G, S, L, R>
where
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
    R: ?Sized,
{
    /// Roll up from `activity` to the root (RB.1.5).
    pub(crate) fn overall_rollup(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        self.nav.log.log_sequencing(
            SequencingEventType::Rollup,
            self.command,
            format_args!("overall rollup from {}", self.nav.tree[activity].key()),
        );
        let path: Vec<ActivityId> = self.nav.tree.ancestors(activity).collect();
        for act in path {
            if !self.nav.tree.is_leaf(act) {
                self.measure_rollup(act);
            }
            let by_measure = self.nav.tree[act]
                .data()
                .primary_objective()
                .definition()
                .satisfied_by_measure;
            if by_measure {
                self.rollup_by_measure(act);
            } else {
                self.rollup_by_rules(act)?;
            }
            self.activity_progress_rollup(act)?;
            self.nav.write_global_objectives(act);
        }
        Ok(())
    }

    /// Weighted average of the tracked children's measures (RB.1.1).
    fn measure_rollup(&mut self, activity: ActivityId) {
        let mut total = 0.0;
        let mut counted = 0.0;
        let mut valid = false;
        {
            let tree = &self.nav.tree;
            let rules = self.rules();
            for &child in tree.children(activity) {
                let node = tree.get(child);
                if !node.data().tracked() {
                    continue;
                }
                let weight = node.sequencing().objective_measure_weight;
                counted += weight;
                let primary = node.data().primary_objective();
                let measure = if primary.measure_status() {
                    Some(primary.normalized_measure())
                } else {
                    rules.read_global_measure(primary)
                };
                if let Some(m) = measure {
                    total += m * weight;
                    valid = true;
                }
            }
        }

        if !valid || counted <= 0.0 {
            self.set_primary_measure(activity, None);
        } else {
            let measure = total / counted;
            self.set_primary_measure(activity, Some(measure));
            trace!(activity = %self.nav.tree[activity].key(), measure, "measure rollup");
            self.nav.log.log_sequencing(
                SequencingEventType::Rollup,
                self.command,
                format_args!(
                    "setting normalized measure {measure} on {}",
                    self.nav.tree[activity].key()
                ),
            );
        }
    }

    fn set_primary_measure(&mut self, activity: ActivityId, measure: Option<f64>) {
        self.nav
            .tree
            .advanced_access(activity)
            .primary_objective_mut()
            .set_scaled_score(measure);
        if activity == self.nav.root()
            && let Some(m) = measure
        {
            self.nav.total_points = Some(m * 100.0);
        }
    }

    /// Primary objective from the measure (RB.1.2a).
    fn rollup_by_measure(&mut self, activity: ActivityId) {
        let status = {
            let node = self.nav.tree.get(activity);
            let data = node.data();
            let primary = data.primary_objective();
            let measure = if primary.measure_status() {
                Some(primary.normalized_measure())
            } else if data.tracked() {
                self.rules().read_global_measure(primary)
            } else {
                None
            };
            match measure {
                None => SuccessStatus::Unknown,
                Some(_) if data.is_active() && !node.sequencing().measure_satisfaction_if_active() => {
                    SuccessStatus::Unknown
                }
                Some(m) if m >= primary.definition().min_normalized_measure => SuccessStatus::Passed,
                Some(_) => SuccessStatus::Failed,
            }
        };
        self.set_primary_success(activity, status);
    }

    /// Primary objective from the rollup rules (RB.1.2b). Satisfied is
    /// checked last so it wins a tie.
    fn rollup_by_rules(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        if self.rules().rollup_rule_check(activity, RollupAction::NotSatisfied)? {
            self.nav
                .tree
                .advanced_access(activity)
                .primary_objective_mut()
                .set_success_status(SuccessStatus::Failed);
        }
        if self.rules().rollup_rule_check(activity, RollupAction::Satisfied)? {
            self.nav
                .tree
                .advanced_access(activity)
                .primary_objective_mut()
                .set_success_status(SuccessStatus::Passed);
        }
        self.mirror_success(activity);
        Ok(())
    }

    fn set_primary_success(&mut self, activity: ActivityId, status: SuccessStatus) {
        self.nav
            .tree
            .advanced_access(activity)
            .primary_objective_mut()
            .set_success_status(status);
        self.mirror_success(activity);
    }

    pub(crate) fn mirror_success(&mut self, activity: ActivityId) {
        if activity == self.nav.root() {
            self.nav.success_status = self.nav.tree[activity]
                .data()
                .primary_objective()
                .success_status();
        }
    }

    /// Completion from the rollup rules (RB.1.3). Completed is checked last.
    fn activity_progress_rollup(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        if self.rules().rollup_rule_check(activity, RollupAction::Incomplete)? {
            self.set_completion(activity, CompletionStatus::Incomplete);
        }
        if self.rules().rollup_rule_check(activity, RollupAction::Completed)? {
            self.set_completion(activity, CompletionStatus::Completed);
        }
        if activity == self.nav.root() {
            self.nav.completion_status = self.nav.tree[activity].data().completion_status();
        }
        Ok(())
    }

    pub(crate) fn set_completion(&mut self, activity: ActivityId, status: CompletionStatus) {
        trace!(activity = %self.nav.tree[activity].key(), ?status, "completion rollup");
        self.nav
            .tree
            .advanced_access(activity)
            .set_completion_status(status);
    }

    /// Roll up every branch that reads a global objective `activity` writes.
    pub(crate) fn extended_rollup(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        let mut rollup_set = self.extended_rollup_set(activity);
        while let Some(&first) = rollup_set.first() {
            self.overall_rollup(first)?;
            let tree = &self.nav.tree;
            rollup_set.retain(|a| *a != first && !tree.is_ancestor_of(*a, first));
        }
        Ok(())
    }

    fn extended_rollup_set(&self, activity: ActivityId) -> Vec<ActivityId> {
        let writers: Vec<_> = self.nav.tree[activity]
            .data()
            .objectives()
            .iter()
            .map(|o| o.definition())
            .filter(|d| d.has_write_maps())
            .collect();
        let mut set = Vec::new();
        if writers.is_empty() {
            return set;
        }
        self.add_branch(self.nav.root(), &writers, &mut set);
        set
    }

    // Depth first, clusters before leaves.
    fn add_branch(
        &self,
        node: ActivityId,
        writers: &[&scorm_activity_tree::ObjectiveDefinition],
        set: &mut Vec<ActivityId>,
    ) {
        let tree = &self.nav.tree;
        if !tree[node].data().tracked() {
            return;
        }
        let children = tree.children(node);
        for &child in children.iter().filter(|c| !tree.is_leaf(**c)) {
            self.add_branch(child, writers, set);
        }
        for &child in children.iter().filter(|c| tree.is_leaf(**c)) {
            self.add_branch(child, writers, set);
        }

        let reads_shared = tree[node].data().objectives().iter().any(|o| {
            let def = o.definition();
            let measure = def.read_normalized_measure.as_deref().is_some_and(|key| {
                writers
                    .iter()
                    .any(|w| w.write_normalized_measure.iter().any(|k| k == key))
            });
            let satisfied = def.read_satisfied_status.as_deref().is_some_and(|key| {
                writers
                    .iter()
                    .any(|w| w.write_satisfied_status.iter().any(|k| k == key))
            });
            measure || satisfied
        });
        if reads_shared
            && let Some(parent) = tree.parent(node)
            && !set.contains(&parent)
        {
            set.push(parent);
        }
    }
}
