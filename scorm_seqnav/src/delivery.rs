// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delivery: validating a delivery target and starting its attempts.

use alloc::vec::Vec;

use scorm_activity_tree::{ActivityId, PackageFormat, SuccessStatus};
use tracing::debug;

use crate::error::{SequencingError, SequencingExceptionCode as Code};
use crate::scorm2004::Sequencer;
use crate::types::{ActivityDataStore, GlobalObjectiveMap, SequencingLog};

impl<G, S, L, R> Sequencer<'_, G, S, L, R>
where
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
    R: ?Sized,
{
    /// Validate `activity` for delivery (DB.1.1).
    ///
    /// Clusters entered fresh on the way down have their attempt data reset
    /// according to their own use-current-attempt flags.
    pub(crate) fn process_delivery_request(
        &mut self,
        activity: ActivityId,
    ) -> Result<(), SequencingError> {
        if !self.nav.tree.is_leaf(activity) {
            return Err(Code::DB_1_1__1.into());
        }
        for a in self.nav.tree.path_to_root(activity) {
            let node = &self.nav.tree[a];
            let data = node.data();
            if !node.is_leaf() && !data.is_active() && !data.is_suspended() {
                let progress = node.sequencing().use_current_attempt_progress_info();
                let objective = node.sequencing().use_current_attempt_objective_info();
                let children = node.children().to_vec();
                for child in children {
                    self.nav
                        .tree
                        .advanced_access(child)
                        .reset_attempt_data(progress, objective);
                }
                self.nav
                    .tree
                    .advanced_access(a)
                    .reset_attempt_data(progress, objective);
            }
            if self.rules().check_activity(a)? {
                return Err(Code::DB_1_1__3.into());
            }
        }
        Ok(())
    }

    /// Make `activity` current and begin or resume the attempts on its path (DB.2).
    pub(crate) fn content_delivery_environment(
        &mut self,
        activity: ActivityId,
    ) -> Result<(), SequencingError> {
        if let Some(current) = self.nav.current
            && self.nav.tree[current].data().is_active()
        {
            return Err(Code::DB_2__1.into());
        }
        if self.nav.suspended == Some(activity) {
            self.nav.suspended = None;
        } else {
            self.clear_suspended_activity(activity);
        }
        if let Some(current) = self.nav.current {
            self.terminate_descendant_attempts(current, activity)?;
        }
        self.nav.current = Some(activity);
        debug!(activity = %self.nav.tree[activity].key(), "delivering");

        for a in self.nav.tree.path_to_root(activity) {
            if self.nav.tree[a].data().is_active() {
                continue;
            }
            let mut t = self.nav.tree.advanced_access(a);
            t.set_active(true);
            if !t.tracked() {
                continue;
            }
            if t.is_suspended() {
                t.set_suspended(false);
                t.initialize_for_delivery_after_suspend(PackageFormat::Scorm2004);
            } else {
                if t.increment_attempt_count() == 1 {
                    t.set_activity_progress_status(true);
                }
                let progress = t.sequencing().use_current_attempt_progress_info();
                let objective = t.sequencing().use_current_attempt_objective_info();
                t.reset_attempt_data(progress, objective);
                self.initialize_for_delivery(a);
            }
        }
        Ok(())
    }

    /// Clear the suspended flags from the old suspended activity up to its
    /// common ancestor with `activity` (DB.2.1).
    fn clear_suspended_activity(&mut self, activity: ActivityId) {
        let Some(suspended) = self.nav.suspended else {
            return;
        };
        let tree = &self.nav.tree;
        let common = tree.common_ancestor(activity, suspended);
        let mut path: Vec<_> = tree.ancestors(suspended).take_while(|a| *a != common).collect();
        path.push(common);
        for a in path {
            let tree = &self.nav.tree;
            let clear = tree.is_leaf(a)
                || !tree
                    .children(a)
                    .iter()
                    .any(|c| tree[*c].data().is_suspended());
            if clear {
                self.nav.tree.advanced_access(a).set_suspended(false);
            }
        }
        self.nav.suspended = None;
    }

    /// Load persisted state, reset the data model for a new attempt, and pull
    /// shared objective values into the activity's objectives.
    fn initialize_for_delivery(&mut self, activity: ActivityId) {
        self.nav.update_activity_data(activity);
        self.nav
            .tree
            .advanced_access(activity)
            .initialize_for_delivery(PackageFormat::Scorm2004);

        if !self.nav.tree[activity].data().tracked() {
            return;
        }
        let is_root = activity == self.nav.root();
        let reads: Vec<(Option<bool>, Option<f64>)> = {
            let rules = self.rules();
            self.nav.tree[activity]
                .data()
                .objectives()
                .iter()
                .map(|o| (rules.read_global_satisfied(o), rules.read_global_measure(o)))
                .collect()
        };
        let mut t = self.nav.tree.advanced_access(activity);
        for (objective, (satisfied, measure)) in t.objectives_mut().iter_mut().zip(reads) {
            if let Some(satisfied) = satisfied {
                let status = if satisfied {
                    SuccessStatus::Passed
                } else {
                    SuccessStatus::Failed
                };
                objective.set_success_status(status);
                if is_root && objective.is_primary() {
                    self.nav.success_status = status;
                }
            }
            if let Some(measure) = measure {
                objective.set_scaled_score(Some(measure));
                if is_root {
                    self.nav.total_points = Some(measure * 100.0);
                }
            }
        }
    }
}
