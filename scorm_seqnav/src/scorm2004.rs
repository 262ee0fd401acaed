// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The SCORM 2004 sequencing engine.
//!
//! ## Overview
//!
//! [`Scorm2004SeqNav`] runs the overall sequencing process (OP.1) for one
//! navigation command:
//!
//! 1. The navigation request process (NB.2.1) turns the command into an
//!    optional termination request and an optional sequencing request, or
//!    rejects it.
//! 2. A termination request ends, abandons, or suspends attempts. It may
//!    replace the pending sequencing request (postcondition rules can ask for
//!    a retry, continue, or previous instead).
//! 3. The sequencing request process (SB.2.12) either picks an activity to
//!    deliver or ends the session.
//! 4. A picked activity is validated and delivered (DB.1.1, DB.2).
//!
//! The engine holds nothing but its random source. All session state lives
//! in the [`NavigatorData`] passed to each call.

use alloc::vec::Vec;
use core::fmt;

use rand::RngCore;
use scorm_activity_tree::{ActivityId, PackageFormat, SequencingRuleAction};
use tracing::debug;

use crate::error::{SequencingError, SequencingExceptionCode as Code};
use crate::navigator::SeqNav;
use crate::rules::RuleEvaluator;
use crate::session::NavigatorData;
use crate::types::{
    ActivityDataStore, GlobalObjectiveMap, NavigationCommand, SequencingEventType, SequencingLog,
    SequencingRequest, TerminationRequest, TraversalDirection,
};

use TraversalDirection::{Backward, Forward};

/// SCORM 2004 sequencing and navigation.
///
/// `R` is the random source used when a cluster reorders its children on a
/// new attempt. Seed it for reproducible sessions.
#[derive(Clone)]
pub struct Scorm2004SeqNav<R> {
    rng: R,
    last_command: NavigationCommand,
}

impl<R> fmt::Debug for Scorm2004SeqNav<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorm2004SeqNav")
            .field("last_command", &self.last_command)
            .finish_non_exhaustive()
    }
}

impl<R: RngCore> Scorm2004SeqNav<R> {
    /// Create an engine drawing randomization from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            last_command: NavigationCommand::Start,
        }
    }

    /// The random source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    fn sequencer<'a, G, S, L>(
        &'a mut self,
        nav: &'a mut NavigatorData<G, S, L>,
    ) -> Sequencer<'a, G, S, L, R> {
        Sequencer {
            nav,
            rng: &mut self.rng,
            command: self.last_command,
        }
    }
}

impl<R: RngCore> SeqNav for Scorm2004SeqNav<R> {
    fn package_format(&self) -> PackageFormat {
        PackageFormat::Scorm2004
    }

    fn overall_sequencing_process<G, S, L>(
        &mut self,
        nav: &mut NavigatorData<G, S, L>,
        command: NavigationCommand,
        destination: Option<ActivityId>,
    ) -> Result<bool, SequencingError>
    where
        G: GlobalObjectiveMap,
        S: ActivityDataStore,
        L: SequencingLog,
    {
        self.last_command = command;
        self.sequencer(nav).overall_sequencing_process(destination)
    }

    fn rollup<G, S, L>(
        &mut self,
        nav: &mut NavigatorData<G, S, L>,
        activity: ActivityId,
    ) -> Result<(), SequencingError>
    where
        G: GlobalObjectiveMap,
        S: ActivityDataStore,
        L: SequencingLog,
    {
        self.sequencer(nav).rollup(activity)
    }
}

/// One navigation in progress: the session, the random source, and the
/// command being processed.
///
/// The sequencing processes are split across the `rollup`, `traversal`,
/// `termination` and `delivery` modules as further `impl` blocks.
pub(crate) struct Sequencer<'a, G, S, L, R: ?Sized> {
    pub(crate) nav: &'a mut NavigatorData<G, S, L>,
    pub(crate) rng: &'a mut R,
    pub(crate) command: NavigationCommand,
}

/// What the sequencing request process decided.
enum Outcome {
    Deliver(ActivityId),
    ExitSession,
    Nothing,
}

impl<G: GlobalObjectiveMap, S, L, R: ?Sized> Sequencer<'_, G, S, L, R> {
    pub(crate) fn rules(&self) -> RuleEvaluator<'_, G> {
        RuleEvaluator::new(&self.nav.tree, &self.nav.globals)
    }
}

impl<G, S, L, R> Sequencer<'_, G, S, L, R>
where
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
    R: RngCore + ?Sized,
{
    /// Run one navigation command to completion (OP.1). Returns whether the
    /// session ended.
    fn overall_sequencing_process(
        &mut self,
        destination: Option<ActivityId>,
    ) -> Result<bool, SequencingError> {
        debug!(command = ?self.command, "navigation request");
        let (mut sequencing, termination) = self.process_navigation_request(destination)?;
        if let Some(termination) = termination
            && let Some(replacement) = self.process_termination_request(termination)?
        {
            sequencing = Some(replacement);
        }

        let outcome = match sequencing {
            Some(request) => self.process_sequencing_request(request, destination)?,
            None => Outcome::Nothing,
        };
        match outcome {
            Outcome::ExitSession => {
                self.nav.current = None;
                self.nav.log.log_sequencing(
                    SequencingEventType::FinalNavigation,
                    self.command,
                    format_args!("navigation finished, session ended"),
                );
                Ok(true)
            }
            Outcome::Deliver(activity) => {
                self.process_delivery_request(activity)?;
                self.content_delivery_environment(activity)?;
                self.nav.log.log_sequencing(
                    SequencingEventType::FinalNavigation,
                    self.command,
                    format_args!(
                        "navigation finished, delivered {}",
                        self.nav.tree[activity].key()
                    ),
                );
                Ok(false)
            }
            Outcome::Nothing => {
                self.nav.log.log_sequencing(
                    SequencingEventType::FinalNavigation,
                    self.command,
                    format_args!("navigation finished"),
                );
                Ok(false)
            }
        }
    }

    /// Classify the command (NB.2.1).
    fn process_navigation_request(
        &self,
        destination: Option<ActivityId>,
    ) -> Result<(Option<SequencingRequest>, Option<TerminationRequest>), SequencingError> {
        use NavigationCommand as Nav;
        use SequencingRequest as Seq;
        use TerminationRequest as Term;

        let tree = &self.nav.tree;
        let current = self.nav.current;
        let is_active = |a: ActivityId| tree[a].data().is_active();
        // Flow and forward-only are controls of the current activity's parent.
        let parent_of_current = current.and_then(|c| tree.parent(c));

        match self.command {
            Nav::Start => {
                if current.is_some() {
                    return Err(Code::NB_2_1__1.into());
                }
                Ok((Some(Seq::Start), None))
            }
            Nav::ResumeAll => {
                if current.is_some() {
                    return Err(Code::NB_2_1__1.into());
                }
                if self.nav.suspended.is_none() {
                    return Err(Code::NB_2_1__3.into());
                }
                Ok((Some(Seq::ResumeAll), None))
            }
            Nav::Continue => {
                let current = current.ok_or(Code::NB_2_1__2)?;
                match parent_of_current {
                    Some(parent) if tree[parent].sequencing().flow() => {
                        let termination = is_active(current).then_some(Term::Exit);
                        Ok((Some(Seq::Continue), termination))
                    }
                    _ => Err(Code::NB_2_1__4.into()),
                }
            }
            Nav::Previous => {
                let current = current.ok_or(Code::NB_2_1__2)?;
                let parent = parent_of_current.ok_or(Code::NB_2_1__6)?;
                let seq = tree[parent].sequencing();
                if !seq.flow() || seq.forward_only() {
                    return Err(Code::NB_2_1__5.into());
                }
                let termination = is_active(current).then_some(Term::Exit);
                Ok((Some(Seq::Previous), termination))
            }
            Nav::Choose => {
                let destination = destination
                    .filter(|d| tree.contains(*d))
                    .ok_or(Code::NB_2_1__11)?;
                if let Some(parent) = tree.parent(destination)
                    && !tree[parent].sequencing().choice()
                {
                    return Err(Code::NB_2_1__10.into());
                }
                let Some(current) = current else {
                    return Ok((Some(Seq::Choice), None));
                };
                // Choosing must not end an active attempt that forbids choice exit.
                // The common ancestor keeps running unless it is the current activity.
                let ancestor = tree.common_ancestor(current, destination);
                let stop = if ancestor == current {
                    tree.parent(ancestor)
                } else {
                    Some(ancestor)
                };
                for a in tree.ancestors(current).take_while(|a| Some(*a) != stop) {
                    if is_active(a) && !tree[a].sequencing().choice_exit() {
                        return Err(Code::NB_2_1__8.into());
                    }
                }
                let termination = is_active(current).then_some(Term::Exit);
                Ok((Some(Seq::Choice), termination))
            }
            Nav::UnqualifiedExit => {
                let current = current.ok_or(Code::NB_2_1__2)?;
                if !is_active(current) {
                    return Err(Code::NB_2_1__12.into());
                }
                Ok((Some(Seq::Exit), Some(Term::Exit)))
            }
            Nav::Abandon => {
                let current = current.ok_or(Code::NB_2_1__2)?;
                if !is_active(current) {
                    return Err(Code::NB_2_1__12.into());
                }
                Ok((Some(Seq::Exit), Some(Term::Abandon)))
            }
            Nav::ExitAll => {
                current.ok_or(Code::NB_2_1__2)?;
                Ok((Some(Seq::Exit), Some(Term::ExitAll)))
            }
            Nav::SuspendAll => {
                current.ok_or(Code::NB_2_1__2)?;
                Ok((Some(Seq::Exit), Some(Term::SuspendAll)))
            }
            // Always accepted, even before the session starts.
            Nav::AbandonAll => Ok((Some(Seq::Exit), Some(Term::AbandonAll))),
        }
    }

    /// Dispatch a sequencing request (SB.2.12).
    fn process_sequencing_request(
        &mut self,
        request: SequencingRequest,
        destination: Option<ActivityId>,
    ) -> Result<Outcome, SequencingError> {
        debug!(?request, "sequencing request");
        let deliver = match request {
            SequencingRequest::Start => self.start()?,
            SequencingRequest::ResumeAll => self.resume_all()?,
            SequencingRequest::Continue => self.continue_()?,
            SequencingRequest::Previous => self.previous()?,
            SequencingRequest::Retry => self.retry()?,
            SequencingRequest::Choice => {
                let destination = destination.ok_or(Code::SB_2_9__1)?;
                if !self.nav.tree.contains(destination) {
                    return Err(Code::SB_2_9__2.into());
                }
                self.choice(destination)?
            }
            SequencingRequest::Exit => {
                return Ok(if self.exit()? {
                    Outcome::ExitSession
                } else {
                    Outcome::Nothing
                });
            }
        };
        Ok(Outcome::Deliver(deliver))
    }

    // SB.2.5
    fn start(&mut self) -> Result<ActivityId, SequencingError> {
        if self.nav.current.is_some() {
            return Err(Code::SB_2_5__1.into());
        }
        let root = self.nav.root();
        if self.nav.tree.is_leaf(root) {
            return Ok(root);
        }
        self.flow(root, Forward, true)
    }

    // SB.2.6
    fn resume_all(&mut self) -> Result<ActivityId, SequencingError> {
        if self.nav.current.is_some() {
            return Err(Code::SB_2_6__1.into());
        }
        Ok(self.nav.suspended.ok_or(Code::SB_2_6__2)?)
    }

    // SB.2.7
    fn continue_(&mut self) -> Result<ActivityId, SequencingError> {
        let current = self.nav.current.ok_or(Code::SB_2_7__1)?;
        if let Some(parent) = self.nav.tree.parent(current)
            && !self.nav.tree[parent].sequencing().flow()
        {
            return Err(Code::SB_2_7__2.into());
        }
        self.flow(current, Forward, false)
    }

    // SB.2.8
    fn previous(&mut self) -> Result<ActivityId, SequencingError> {
        let current = self.nav.current.ok_or(Code::SB_2_8__1)?;
        if let Some(parent) = self.nav.tree.parent(current)
            && !self.nav.tree[parent].sequencing().flow()
        {
            return Err(Code::SB_2_8__2.into());
        }
        self.flow(current, Backward, false)
    }

    // SB.2.10
    fn retry(&mut self) -> Result<ActivityId, SequencingError> {
        let current = self.nav.current.ok_or(Code::SB_2_10__1)?;
        let data = self.nav.tree[current].data();
        if data.is_active() || data.is_suspended() {
            return Err(Code::SB_2_10__2.into());
        }
        if self.nav.tree.is_leaf(current) {
            return Ok(current);
        }
        self.flow(current, Forward, true)
    }

    /// SB.2.11: the session ends when exiting from the root.
    fn exit(&self) -> Result<bool, SequencingError> {
        let current = self.nav.current.ok_or(Code::SB_2_11__1)?;
        if self.nav.tree[current].data().is_active() {
            return Err(Code::SB_2_11__2.into());
        }
        Ok(current == self.nav.root())
    }

    /// Choice sequencing request (SB.2.9).
    ///
    /// Validates the path from the current activity to `destination` and
    /// returns the activity to deliver: the destination itself if it is a
    /// leaf, otherwise the first activity flow reaches inside it.
    fn choice(&mut self, destination: ActivityId) -> Result<ActivityId, SequencingError> {
        let tree = &self.nav.tree;
        for a in tree.path_to_root(destination) {
            if self
                .rules()
                .precondition(a, SequencingRuleAction::HiddenFromChoice)?
            {
                return Err(Code::SB_2_9__3.into());
            }
        }
        if let Some(parent) = tree.parent(destination)
            && !tree[parent].sequencing().choice()
        {
            return Err(Code::SB_2_9__4.into());
        }

        let current = self.nav.current;
        let ancestor = match current {
            Some(c) => tree.common_ancestor(c, destination),
            None => self.nav.root(),
        };

        match current {
            // Case 1: the current activity itself, delivered as is.
            Some(c) if c == destination => return Ok(destination),
            // Case 2: a sibling of the current activity.
            Some(c) if tree.parent(c).is_some() && tree.parent(c) == tree.parent(destination) => {
                self.choose_sibling(c, destination)?;
            }
            // Case 3: forward, below the current activity (or from nothing).
            None => self.choose_descendant(ancestor, destination)?,
            Some(c) if c == ancestor => self.choose_descendant(ancestor, destination)?,
            // Case 4: backward, to an ancestor of the current activity.
            Some(c) if destination == ancestor => {
                for a in tree.ancestors(c).take_while(|a| *a != ancestor) {
                    if !tree[a].sequencing().choice_exit() {
                        return Err(Code::SB_2_9__7.into());
                    }
                }
            }
            // Case 5: across the tree, through the common ancestor.
            Some(c) => self.choose_across(c, ancestor, destination)?,
        }

        if self.nav.tree.is_leaf(destination) {
            return Ok(destination);
        }
        self.flow(destination, Forward, true)
    }

    fn choose_sibling(
        &self,
        current: ActivityId,
        destination: ActivityId,
    ) -> Result<(), SequencingError> {
        let tree = &self.nav.tree;
        let (Some(from), Some(to)) = (tree.index_in_parent(current), tree.index_in_parent(destination))
        else {
            return Err(SequencingError::Internal("sibling without a parent"));
        };
        let Some(parent) = tree.parent(destination) else {
            return Err(SequencingError::Internal("sibling without a parent"));
        };
        let siblings = tree.children(parent);
        if from < to {
            for &a in &siblings[from..to] {
                self.choice_activity_traversal(a, Forward)?;
            }
        } else {
            for &a in siblings[to + 1..=from].iter().rev() {
                self.choice_activity_traversal(a, Backward)?;
            }
        }
        Ok(())
    }

    /// Activities from `ancestor` down to the parent of `destination`.
    fn path_from(&self, ancestor: ActivityId, destination: ActivityId) -> Vec<ActivityId> {
        let tree = &self.nav.tree;
        let mut path: Vec<_> = tree
            .ancestors(destination)
            .skip(1)
            .take_while(|a| tree.is_ancestor_of(ancestor, *a) || *a == ancestor)
            .collect();
        path.reverse();
        path
    }

    fn check_prevent_activation(
        &self,
        activity: ActivityId,
        ancestor: ActivityId,
    ) -> Result<(), SequencingError> {
        let node = &self.nav.tree[activity];
        if activity != ancestor && !node.data().is_active() && node.sequencing().prevent_activation()
        {
            return Err(Code::SB_2_9__6.into());
        }
        Ok(())
    }

    fn choose_descendant(
        &self,
        ancestor: ActivityId,
        destination: ActivityId,
    ) -> Result<(), SequencingError> {
        for a in self.path_from(ancestor, destination) {
            self.choice_activity_traversal(a, Forward)?;
            self.check_prevent_activation(a, ancestor)?;
        }
        Ok(())
    }

    fn choose_across(
        &self,
        current: ActivityId,
        ancestor: ActivityId,
        destination: ActivityId,
    ) -> Result<(), SequencingError> {
        let tree = &self.nav.tree;
        let mut constrained = None;
        for a in tree.ancestors(current) {
            let seq = tree[a].sequencing();
            if a != ancestor && !seq.choice_exit() {
                return Err(Code::SB_2_9__7.into());
            }
            if constrained.is_none() && seq.constrain_choice() {
                constrained = Some(a);
            }
            if a == ancestor {
                break;
            }
        }

        if let Some(constrained) = constrained
            && constrained != destination
        {
            let direction = if tree.comes_before_in_preorder(constrained, destination) {
                Forward
            } else {
                Backward
            };
            let consider = self.choice_flow(constrained, direction);
            if destination != consider && !tree.is_ancestor_of(consider, destination) {
                return Err(Code::SB_2_9__8.into());
            }
        }

        let forward = tree.comes_before_in_preorder(current, destination);
        for a in self.path_from(ancestor, destination) {
            if forward {
                self.choice_activity_traversal(a, Forward)?;
            }
            self.check_prevent_activation(a, ancestor)?;
        }
        Ok(())
    }
}
