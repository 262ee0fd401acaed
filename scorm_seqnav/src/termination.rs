// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Termination requests and ending attempts.

use alloc::vec::Vec;

use scorm_activity_tree::{ActivityId, CompletionStatus, SequencingRuleAction, SuccessStatus};
use tracing::debug;

use crate::error::{SequencingError, SequencingExceptionCode as Code};
use crate::scorm2004::Sequencer;
use crate::types::{
    ActivityDataStore, GlobalObjectiveMap, SequencingEventType, SequencingLog, SequencingRequest,
    TerminationRequest,
};

impl<G, S, L, R> Sequencer<'_, G, S, L, R>
where
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
    R: ?Sized,
{
    /// Carry out a termination request (TB.2.3).
    ///
    /// Returns a sequencing request that replaces the pending one, if any.
    pub(crate) fn process_termination_request(
        &mut self,
        request: TerminationRequest,
    ) -> Result<Option<SequencingRequest>, SequencingError> {
        if request == TerminationRequest::AbandonAll {
            let path: Vec<_> = match self.nav.current {
                Some(current) => self.nav.tree.ancestors(current).collect(),
                None => Vec::new(),
            };
            for a in path {
                self.nav.tree.advanced_access(a).set_active(false);
                self.extended_rollup(a)?;
            }
            self.nav.current = Some(self.nav.root());
            return Ok(Some(SequencingRequest::Exit));
        }
        let current = self.nav.current.ok_or(Code::TB_2_3__1)?;
        if matches!(request, TerminationRequest::Exit | TerminationRequest::Abandon)
            && !self.nav.tree[current].data().is_active()
        {
            return Err(Code::TB_2_3__2.into());
        }
        debug!(?request, activity = %self.nav.tree[current].key(), "termination request");

        match request {
            TerminationRequest::Exit => self.terminate_exit(current),
            TerminationRequest::ExitAll => self.terminate_exit_all(None),
            TerminationRequest::SuspendAll => self.terminate_suspend_all(current).map(Some),
            TerminationRequest::Abandon => {
                self.nav.tree.advanced_access(current).set_active(false);
                self.extended_rollup(current)?;
                Ok(None)
            }
            TerminationRequest::ExitParent | TerminationRequest::AbandonAll => Err(
                SequencingError::Internal("termination request only valid from postcondition rules"),
            ),
        }
    }

    fn terminate_exit(
        &mut self,
        current: ActivityId,
    ) -> Result<Option<SequencingRequest>, SequencingError> {
        self.end_attempt(current)?;
        self.exit_action_rules(current)?;

        loop {
            let current = self.current()?;
            let (sequencing, termination) = self.post_condition_rules(current)?;
            match termination {
                Some(TerminationRequest::ExitAll) => return self.terminate_exit_all(sequencing),
                Some(TerminationRequest::ExitParent) => {
                    let parent = self.nav.tree.parent(current).ok_or(Code::TB_2_3__4)?;
                    self.nav.current = Some(parent);
                    self.end_attempt(parent)?;
                }
                _ => {
                    if current == self.nav.root() && sequencing != Some(SequencingRequest::Retry) {
                        return Ok(Some(SequencingRequest::Exit));
                    }
                    return Ok(sequencing);
                }
            }
        }
    }

    fn terminate_exit_all(
        &mut self,
        sequencing: Option<SequencingRequest>,
    ) -> Result<Option<SequencingRequest>, SequencingError> {
        let current = self.current()?;
        let root = self.nav.root();
        if self.nav.tree[current].data().is_active() {
            self.end_attempt(current)?;
        }
        self.terminate_descendant_attempts(current, root)?;
        self.end_attempt(root)?;
        self.nav.current = Some(root);
        Ok(Some(sequencing.unwrap_or(SequencingRequest::Exit)))
    }

    fn terminate_suspend_all(
        &mut self,
        current: ActivityId,
    ) -> Result<SequencingRequest, SequencingError> {
        let data = self.nav.tree[current].data();
        let suspended = if data.is_active() || data.is_suspended() {
            current
        } else {
            self.nav.tree.parent(current).ok_or(Code::TB_2_3__3)?
        };
        self.nav.suspended = Some(suspended);

        let path: Vec<_> = self.nav.tree.ancestors(suspended).collect();
        for a in path {
            {
                let mut t = self.nav.tree.advanced_access(a);
                t.set_suspended(true);
                t.set_active(false);
            }
            self.extended_rollup(a)?;
        }
        if self.nav.tree.is_leaf(suspended) {
            self.finalize_data_model_prior_to_exit(suspended);
        }
        self.nav.current = Some(self.nav.root());
        Ok(SequencingRequest::Exit)
    }

    fn current(&self) -> Result<ActivityId, SequencingError> {
        self.nav
            .current
            .ok_or(SequencingError::Internal("termination lost the current activity"))
    }

    /// Exit action rules on the ancestors of `activity` (TB.2.1).
    ///
    /// The outermost ancestor whose exit rule fires ends its attempt and
    /// becomes current.
    fn exit_action_rules(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        let mut path = self.nav.tree.path_to_root(activity);
        path.pop();
        for act in path {
            let rules = &self.nav.tree[act].sequencing().exit_condition_rules;
            if self
                .rules()
                .check_for_action(act, rules, SequencingRuleAction::Exit)?
            {
                self.nav.log.log_sequencing(
                    SequencingEventType::IntermediateNavigation,
                    self.command,
                    format_args!("exit rule fired on {}", self.nav.tree[act].key()),
                );
                let current = self.current()?;
                self.terminate_descendant_attempts(current, act)?;
                self.end_attempt(act)?;
                self.nav.current = Some(act);
                return Ok(());
            }
        }
        Ok(())
    }

    /// Postcondition rules of `activity` (TB.2.2). Suspended activities are left alone.
    fn post_condition_rules(
        &mut self,
        activity: ActivityId,
    ) -> Result<(Option<SequencingRequest>, Option<TerminationRequest>), SequencingError> {
        if self.nav.tree[activity].data().is_suspended() {
            return Ok((None, None));
        }
        let rules = &self.nav.tree[activity].sequencing().post_condition_rules;
        let Some(action) = self.rules().check_returning_action(activity, rules)? else {
            return Ok((None, None));
        };
        let requests = match action {
            SequencingRuleAction::Retry => (Some(SequencingRequest::Retry), None),
            SequencingRuleAction::Continue => (Some(SequencingRequest::Continue), None),
            SequencingRuleAction::Previous => (Some(SequencingRequest::Previous), None),
            SequencingRuleAction::ExitParent => (None, Some(TerminationRequest::ExitParent)),
            SequencingRuleAction::ExitAll => (None, Some(TerminationRequest::ExitAll)),
            SequencingRuleAction::RetryAll => (
                Some(SequencingRequest::Retry),
                Some(TerminationRequest::ExitAll),
            ),
            // Other actions have no meaning as postconditions.
            _ => return Ok((None, None)),
        };
        self.nav.log.log_sequencing(
            SequencingEventType::IntermediateNavigation,
            self.command,
            format_args!(
                "postcondition rule on {} requested {action:?}",
                self.nav.tree[activity].key()
            ),
        );
        Ok(requests)
    }

    /// End the attempts strictly between `current` and its common ancestor
    /// with `activity` (UP.3).
    pub(crate) fn terminate_descendant_attempts(
        &mut self,
        current: ActivityId,
        activity: ActivityId,
    ) -> Result<(), SequencingError> {
        let common = self.nav.tree.common_ancestor(current, activity);
        if common == current {
            return Ok(());
        }
        let path: Vec<_> = self
            .nav
            .tree
            .ancestors(current)
            .skip(1)
            .take_while(|a| *a != common)
            .collect();
        for a in path {
            self.end_attempt(a)?;
        }
        Ok(())
    }

    /// Copy what the content reported into the primary objective and apply
    /// the default completion and satisfaction of content that reported
    /// nothing. Session time always folds into total time.
    pub(crate) fn finalize_data_model_prior_to_exit(&mut self, activity: ActivityId) {
        let is_root = activity == self.nav.root();
        let mut t = self.nav.tree.advanced_access(activity);
        if t.tracked() {
            let reported = t.success_status();
            if reported != SuccessStatus::Unknown {
                t.primary_objective_mut().set_success_status(reported);
                if is_root {
                    self.nav.success_status = reported;
                }
            }
            if let Some(scaled) = t.score().scaled {
                t.primary_objective_mut().set_scaled_score(Some(scaled));
                if is_root {
                    self.nav.total_points = Some(scaled * 100.0);
                }
            }
            if !t.is_suspended() {
                let seq = t.sequencing();
                let completion_by_content = seq.completion_set_by_content();
                let objective_by_content = seq.objective_set_by_content();
                if !t.attempt_progress_status() && !completion_by_content {
                    t.set_completion_status(CompletionStatus::Completed);
                    if is_root {
                        self.nav.completion_status = CompletionStatus::Completed;
                    }
                }
                if !t.primary_objective().progress_status() && !objective_by_content {
                    t.primary_objective_mut()
                        .set_success_status(SuccessStatus::Passed);
                    if is_root {
                        self.nav.success_status = SuccessStatus::Passed;
                    }
                }
            }
        }
        t.fold_session_time();
    }

    /// End the attempt on `activity` (UP.4).
    pub(crate) fn end_attempt(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        if self.nav.tree.is_leaf(activity) {
            self.finalize_data_model_prior_to_exit(activity);
        } else {
            let tree = &self.nav.tree;
            let any_suspended = tree
                .children(activity)
                .iter()
                .any(|c| tree[*c].data().is_suspended());
            self.nav
                .tree
                .advanced_access(activity)
                .set_suspended(any_suspended);
        }
        self.nav.tree.advanced_access(activity).set_active(false);
        self.overall_rollup(activity)?;
        self.extended_rollup(activity)
    }

    /// Finalize a leaf, then roll up from it.
    pub(crate) fn rollup(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        if self.nav.tree.is_leaf(activity) {
            self.finalize_data_model_prior_to_exit(activity);
        }
        self.overall_rollup(activity)?;
        self.extended_rollup(activity)
    }
}
