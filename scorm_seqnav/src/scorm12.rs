// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The SCORM 1.2 navigation engine.
//!
//! SCORM 1.2 has no sequencing rules and no rollup. Navigation walks the tree
//! in preorder and stops at the next item that has a resource; `Choose` jumps
//! straight to any item with a resource. Delivery is gated only by the item's
//! prerequisite script.
//!
//! Leaving an item marks it completed unless the content reported a lesson
//! status itself, then derives passed or failed from the raw score when the
//! item has a mastery score and the learner takes it for credit.

use scorm_activity_tree::{ActivityId, ActivityTree, LessonStatus, PackageFormat};
use tracing::debug;

use crate::error::{SequencingError, SequencingExceptionCode as Code};
use crate::navigator::SeqNav;
use crate::prerequisites::ScriptPrerequisites;
use crate::session::NavigatorData;
use crate::types::{
    ActivityDataStore, GlobalObjectiveMap, NavigationCommand, Prerequisites, SequencingEventType,
    SequencingLog,
};

/// SCORM 1.2 navigation, with prerequisites evaluated by `P`.
#[derive(Clone, Debug, Default)]
pub struct Scorm12SeqNav<P = ScriptPrerequisites> {
    prerequisites: P,
}

impl Scorm12SeqNav {
    /// An engine using the AICC script evaluator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: Prerequisites> Scorm12SeqNav<P> {
    /// An engine using a custom prerequisite evaluator.
    pub fn with_prerequisites(prerequisites: P) -> Self {
        Self { prerequisites }
    }

    /// The prerequisite evaluator.
    pub fn prerequisites(&self) -> &P {
        &self.prerequisites
    }

    /// Exit the current activity (if any) and deliver `activity`.
    ///
    /// Prerequisites are evaluated after the exit, so they see the status the
    /// exit assigned. A refused delivery does not undo that exit: the old
    /// activity stays current but inactive.
    fn deliver<G, S: ActivityDataStore, L>(
        &self,
        nav: &mut NavigatorData<G, S, L>,
        activity: ActivityId,
    ) -> Result<(), SequencingError> {
        if let Some(current) = nav.current {
            exit_activity(&mut nav.tree, current);
        }
        let tree = &nav.tree;
        let lesson_status = |key: &str| tree.find(key).map(|id| tree[id].data().lesson_status());
        if !self
            .prerequisites
            .evaluate(tree[activity].prerequisites(), &lesson_status)
        {
            return Err(Code::DB_1_1__3.into());
        }

        debug!(activity = %nav.tree[activity].key(), "delivering");
        nav.current = Some(activity);
        nav.suspended = None;
        nav.update_activity_data(activity);
        let mut t = nav.tree.advanced_access(activity);
        if t.is_suspended() {
            t.set_suspended(false);
            t.initialize_for_delivery_after_suspend(PackageFormat::Scorm12);
        } else {
            t.increment_attempt_count();
            t.initialize_for_delivery(PackageFormat::Scorm12);
        }
        t.set_active(true);
        Ok(())
    }

    /// Walk preorder from the current activity to the next (or previous) one
    /// with a resource and deliver it.
    fn flow<G, S, L>(
        &self,
        nav: &mut NavigatorData<G, S, L>,
        command: NavigationCommand,
        forward: bool,
    ) -> Result<(), SequencingError>
    where
        S: ActivityDataStore,
        L: SequencingLog,
    {
        let current = nav.current.ok_or(Code::NB_2_1__2)?;
        let step = |tree: &ActivityTree, a| {
            if forward {
                tree.next_in_preorder(a)
            } else {
                tree.previous_in_preorder(a)
            }
        };
        let mut candidate = step(&nav.tree, current);
        while let Some(a) = candidate
            && !is_valid_to_navigate_to(&nav.tree, a)
        {
            nav.log.log_sequencing(
                SequencingEventType::IntermediateNavigation,
                command,
                format_args!("flowing past {}", nav.tree[a].key()),
            );
            candidate = step(&nav.tree, a);
        }
        let Some(target) = candidate else {
            let code = if forward { Code::SB_2_1__1 } else { Code::SB_2_1__3 };
            return Err(code.into());
        };
        self.deliver(nav, target)?;
        log_delivered(nav, command, target);
        Ok(())
    }
}

impl<P: Prerequisites> SeqNav for Scorm12SeqNav<P> {
    fn package_format(&self) -> PackageFormat {
        PackageFormat::Scorm12
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
        use NavigationCommand as Nav;

        debug!(?command, "navigation request");
        match command {
            Nav::Start => {
                if nav.current.is_some() {
                    return Err(Code::NB_2_1__1.into());
                }
                let first = nav
                    .tree
                    .preorder()
                    .find(|a| is_valid_to_navigate_to(&nav.tree, *a));
                match first {
                    Some(first) => {
                        self.deliver(nav, first)?;
                        log_delivered(nav, command, first);
                    }
                    None => log_finished(nav, command),
                }
                Ok(false)
            }
            Nav::ResumeAll => {
                if nav.current.is_some() {
                    return Err(Code::NB_2_1__1.into());
                }
                let suspended = nav.suspended.ok_or(Code::NB_2_1__3)?;
                self.deliver(nav, suspended)?;
                log_delivered(nav, command, suspended);
                Ok(false)
            }
            Nav::Continue => self.flow(nav, command, true).map(|()| false),
            Nav::Previous => self.flow(nav, command, false).map(|()| false),
            Nav::Choose => {
                let destination = destination
                    .filter(|d| nav.tree.contains(*d))
                    .ok_or(Code::NB_2_1__11)?;
                if !is_valid_to_navigate_to(&nav.tree, destination) {
                    return Err(Code::NB_2_1__10.into());
                }
                self.deliver(nav, destination)?;
                log_delivered(nav, command, destination);
                Ok(false)
            }
            Nav::UnqualifiedExit | Nav::Abandon => {
                let current = nav.current.ok_or(Code::NB_2_1__2)?;
                exit_activity(&mut nav.tree, current);
                nav.current = None;
                log_finished(nav, command);
                Ok(false)
            }
            Nav::SuspendAll => {
                let current = nav.current.ok_or(Code::NB_2_1__2)?;
                exit_activity(&mut nav.tree, current);
                nav.tree.advanced_access(current).set_suspended(true);
                nav.suspended = Some(current);
                nav.current = None;
                log_finished(nav, command);
                Ok(true)
            }
            Nav::ExitAll | Nav::AbandonAll => {
                if command == Nav::ExitAll && nav.current.is_none() {
                    return Err(Code::NB_2_1__2.into());
                }
                for a in [nav.current, nav.suspended].into_iter().flatten() {
                    exit_activity(&mut nav.tree, a);
                }
                nav.current = None;
                nav.suspended = None;
                log_finished(nav, command);
                Ok(true)
            }
        }
    }

    fn rollup<G, S, L>(
        &mut self,
        _nav: &mut NavigatorData<G, S, L>,
        _activity: ActivityId,
    ) -> Result<(), SequencingError>
    where
        G: GlobalObjectiveMap,
        S: ActivityDataStore,
        L: SequencingLog,
    {
        Ok(())
    }
}

/// Only items with a resource can be delivered.
pub(crate) fn is_valid_to_navigate_to(tree: &ActivityTree, activity: ActivityId) -> bool {
    tree[activity].has_resource()
}

fn exit_activity(tree: &mut ActivityTree, activity: ActivityId) {
    let mut t = tree.advanced_access(activity);
    // A status the content set is never overwritten.
    if t.lesson_status() == LessonStatus::NotAttempted {
        t.set_lesson_status(LessonStatus::Completed);
    }
    if t.credit()
        && let Some(mastery) = t.mastery_score()
        && let Some(raw) = t.score().raw
    {
        let status = if raw >= mastery {
            LessonStatus::Passed
        } else {
            LessonStatus::Failed
        };
        t.set_lesson_status(status);
    }
    t.set_active(false);
    t.fold_session_time();
}

fn log_delivered<G, S, L: SequencingLog>(
    nav: &mut NavigatorData<G, S, L>,
    command: NavigationCommand,
    activity: ActivityId,
) {
    nav.log.log_sequencing(
        SequencingEventType::FinalNavigation,
        command,
        format_args!("navigation finished, delivered {}", nav.tree[activity].key()),
    );
}

fn log_finished<G, S, L: SequencingLog>(nav: &mut NavigatorData<G, S, L>, command: NavigationCommand) {
    nav.log.log_sequencing(
        SequencingEventType::FinalNavigation,
        command,
        format_args!("navigation finished"),
    );
}
