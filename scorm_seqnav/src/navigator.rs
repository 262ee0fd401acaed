// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine contract and the navigator facade.
//!
//! ## Overview
//!
//! [`SeqNav`] is implemented by both engines, [`Scorm2004SeqNav`] and
//! [`Scorm12SeqNav`]. An engine carries no session state; everything lives in
//! the [`NavigatorData`] it is handed.
//!
//! [`Navigator`] pairs a session with an engine and adds what a player needs
//! around raw sequencing: navigation by activity key, dry-run validity checks,
//! a table of contents, and acting on the navigation requests content leaves
//! in its data model.
//!
//! [`Scorm2004SeqNav`]: crate::Scorm2004SeqNav
//! [`Scorm12SeqNav`]: crate::Scorm12SeqNav

use alloc::vec::Vec;

use scorm_activity_tree::{
    ActivityId, ActivityTree, ContentNavigationRequest, ExitMode, PackageFormat,
};
use tracing::debug;

use crate::error::SequencingError;
use crate::scorm12::is_valid_to_navigate_to;
use crate::session::NavigatorData;
use crate::types::{ActivityDataStore, GlobalObjectiveMap, NavigationCommand, SequencingLog};

/// A sequencing engine.
pub trait SeqNav {
    /// The package format the engine sequences.
    fn package_format(&self) -> PackageFormat;

    /// Run one navigation command against `nav`.
    ///
    /// `destination` is the target of [`NavigationCommand::Choose`] and is
    /// ignored otherwise. Returns `true` when the session has ended.
    ///
    /// On error the session keeps whatever was changed before the failure.
    fn overall_sequencing_process<G, S, L>(
        &mut self,
        nav: &mut NavigatorData<G, S, L>,
        command: NavigationCommand,
        destination: Option<ActivityId>,
    ) -> Result<bool, SequencingError>
    where
        G: GlobalObjectiveMap,
        S: ActivityDataStore,
        L: SequencingLog;

    /// Roll up from `activity` outside of a navigation.
    fn rollup<G, S, L>(
        &mut self,
        nav: &mut NavigatorData<G, S, L>,
        activity: ActivityId,
    ) -> Result<(), SequencingError>
    where
        G: GlobalObjectiveMap,
        S: ActivityDataStore,
        L: SequencingLog;
}

/// One row of a table of contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// The activity.
    pub activity: ActivityId,
    /// Depth below the root.
    pub depth: usize,
    /// Whether the learner may choose it now.
    pub valid: bool,
}

/// A session together with the engine that sequences it.
#[derive(Debug)]
pub struct Navigator<E, G, S, L> {
    nav: NavigatorData<G, S, L>,
    engine: E,
}

impl<E, G, S, L> Navigator<E, G, S, L>
where
    E: SeqNav,
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
{
    /// Pair `nav` with `engine`.
    pub fn new(nav: NavigatorData<G, S, L>, engine: E) -> Self {
        Self { nav, engine }
    }

    /// The session.
    pub fn data(&self) -> &NavigatorData<G, S, L> {
        &self.nav
    }

    /// The session, mutably, for content writes and collaborator access.
    pub fn data_mut(&mut self) -> &mut NavigatorData<G, S, L> {
        &mut self.nav
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Split back into session and engine.
    pub fn into_parts(self) -> (NavigatorData<G, S, L>, E) {
        (self.nav, self.engine)
    }

    /// The activity tree.
    pub fn tree(&self) -> &ActivityTree {
        &self.nav.tree
    }

    /// Run `command`. Use [`navigate_to`](Self::navigate_to) for choice.
    ///
    /// Returns `true` when the session has ended.
    pub fn navigate(&mut self, command: NavigationCommand) -> Result<bool, SequencingError> {
        self.engine
            .overall_sequencing_process(&mut self.nav, command, None)
    }

    /// Choose `destination`.
    pub fn navigate_to(&mut self, destination: ActivityId) -> Result<bool, SequencingError> {
        self.engine.overall_sequencing_process(
            &mut self.nav,
            NavigationCommand::Choose,
            Some(destination),
        )
    }

    /// Choose the activity with `key`.
    pub fn navigate_to_key(&mut self, key: &str) -> Result<bool, SequencingError> {
        let destination = self
            .nav
            .tree
            .find(key)
            .ok_or_else(|| SequencingError::UnknownActivity(key.into()))?;
        self.navigate_to(destination)
    }

    /// Roll up from `activity`, finalizing it first if it is a leaf.
    ///
    /// Hosts may roll up at any time; SCORM 1.2 has nothing to roll up.
    pub fn rollup(&mut self, activity: ActivityId) -> Result<(), SequencingError> {
        self.engine.rollup(&mut self.nav, activity)
    }

    /// Act on what the current activity's content asked for through its data
    /// model.
    ///
    /// An exit mode takes precedence over a navigation request. A suspend exit
    /// only changes state and returns `false`. Otherwise the resulting command
    /// is run and `true` returned; with nothing to do, `false`.
    pub fn process_data_model_navigation(&mut self) -> Result<bool, SequencingError> {
        let current = self.nav.current.ok_or(SequencingError::NoCurrentActivity)?;
        let data = self.nav.tree[current].data();
        let format = self.engine.package_format();

        let from_exit = match (data.exit(), format) {
            (Some(ExitMode::TimeOut), PackageFormat::Scorm2004) => Some(NavigationCommand::ExitAll),
            (Some(ExitMode::Logout), _) => Some(NavigationCommand::SuspendAll),
            (Some(ExitMode::Suspended), _) => {
                debug!(activity = %self.nav.tree[current].key(), "content suspended itself");
                {
                    let mut t = self.nav.tree.advanced_access(current);
                    t.set_active(false);
                    t.set_suspended(true);
                }
                self.engine.rollup(&mut self.nav, current)?;
                return Ok(false);
            }
            _ => None,
        };

        let request = match from_exit {
            Some(command) => Some((command, None)),
            None => match data.navigation_request() {
                None => None,
                Some(ContentNavigationRequest::Choice(key)) => {
                    let destination = self
                        .nav
                        .tree
                        .find(key)
                        .ok_or_else(|| SequencingError::UnknownActivity(key.clone()))?;
                    Some((NavigationCommand::Choose, Some(destination)))
                }
                Some(other) => Some((content_command(other), None)),
            },
        };
        let Some((command, destination)) = request else {
            return Ok(false);
        };
        self.engine
            .overall_sequencing_process(&mut self.nav, command, destination)?;
        Ok(true)
    }
}

impl<E, G, S, L> Navigator<E, G, S, L>
where
    E: SeqNav + Clone,
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
{
    /// Whether `command` would succeed now. Nothing in the session changes.
    pub fn is_navigation_valid(&self, command: NavigationCommand) -> bool {
        self.dry_run(command, None)
    }

    /// Whether choosing `destination` would succeed now.
    pub fn is_navigation_to_valid(&self, destination: ActivityId) -> bool {
        self.dry_run(NavigationCommand::Choose, Some(destination))
    }

    fn dry_run(&self, command: NavigationCommand, destination: Option<ActivityId>) -> bool {
        let mut scratch = self.nav.clone_for_navigation_test();
        let mut engine = self.engine.clone();
        engine
            .overall_sequencing_process(&mut scratch, command, destination)
            .is_ok()
    }

    /// The tree in preorder, each activity marked with whether it may be
    /// chosen now.
    ///
    /// For SCORM 2004 only the subtree the learner can reach is considered:
    /// with a current activity, choice cannot leave its nearest ancestor (or
    /// itself) that forbids choice exit. Activities whose parent forbids
    /// choice are never valid. With `evaluate_rules`, every remaining
    /// activity is checked with a dry-run choice; without, they are all
    /// valid.
    ///
    /// For SCORM 1.2 an activity is valid when it has a resource.
    pub fn table_of_contents(&self, evaluate_rules: bool) -> Vec<TocEntry> {
        let tree = &self.nav.tree;
        let entry = |activity, valid| TocEntry {
            activity,
            depth: tree.depth(activity),
            valid,
        };

        if self.engine.package_format() == PackageFormat::Scorm12 {
            return tree
                .preorder()
                .map(|a| entry(a, is_valid_to_navigate_to(tree, a)))
                .collect();
        }

        let top = self
            .nav
            .current
            .and_then(|c| tree.ancestors(c).find(|a| !tree[*a].sequencing().choice_exit()))
            .unwrap_or_else(|| tree.root());
        tree.preorder()
            .map(|a| {
                let in_scope = a == top || tree.is_ancestor_of(top, a);
                let parent_allows = tree
                    .parent(a)
                    .is_none_or(|p| tree[p].sequencing().choice());
                let valid = in_scope
                    && parent_allows
                    && (!evaluate_rules || self.is_navigation_to_valid(a));
                entry(a, valid)
            })
            .collect()
    }
}

fn content_command(request: &ContentNavigationRequest) -> NavigationCommand {
    match request {
        ContentNavigationRequest::Continue => NavigationCommand::Continue,
        ContentNavigationRequest::Previous => NavigationCommand::Previous,
        ContentNavigationRequest::Choice(_) => NavigationCommand::Choose,
        ContentNavigationRequest::Exit => NavigationCommand::UnqualifiedExit,
        ContentNavigationRequest::ExitAll => NavigationCommand::ExitAll,
        ContentNavigationRequest::Abandon => NavigationCommand::Abandon,
        ContentNavigationRequest::AbandonAll => NavigationCommand::AbandonAll,
        ContentNavigationRequest::SuspendAll => NavigationCommand::SuspendAll,
    }
}
