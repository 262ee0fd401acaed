// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session state shared by both engines.

use scorm_activity_tree::{
    ActivityId, ActivityTree, CompletionStatus, ContentWrites, SuccessStatus, TreeError,
};

use crate::types::{
    ActivityDataStore, GlobalObjectiveMap, NoActivityStore, NoGlobalObjectives, NoLog,
    ReadOnlyGlobals, TracingLog,
};

/// One learner's sequencing session over one activity tree.
///
/// Holds the tree, the current and suspended activities, the session-level
/// status mirrored from the root, and the collaborators the engine consults:
/// `G` for global objectives, `S` for persisted activity data, and `L` for the
/// sequencing log.
///
/// A session is single-threaded: every engine call takes it by `&mut`.
pub struct NavigatorData<G = NoGlobalObjectives, S = NoActivityStore, L = TracingLog> {
    pub(crate) tree: ActivityTree,
    pub(crate) current: Option<ActivityId>,
    pub(crate) suspended: Option<ActivityId>,
    pub(crate) success_status: SuccessStatus,
    pub(crate) completion_status: CompletionStatus,
    pub(crate) total_points: Option<f64>,
    pub(crate) globals: G,
    pub(crate) store: S,
    pub(crate) log: L,
}

impl<G, S, L> core::fmt::Debug for NavigatorData<G, S, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavigatorData")
            .field("tree", &self.tree)
            .field("current", &self.current)
            .field("suspended", &self.suspended)
            .field("success_status", &self.success_status)
            .field("completion_status", &self.completion_status)
            .field("total_points", &self.total_points)
            .finish_non_exhaustive()
    }
}

impl<G: Default, S: Default, L: Default> NavigatorData<G, S, L> {
    /// Start a fresh session with default collaborators.
    pub fn new(tree: ActivityTree) -> Self {
        Self::with_collaborators(tree, G::default(), S::default(), L::default())
    }
}

impl<G, S, L> NavigatorData<G, S, L> {
    /// Start a fresh session with explicit collaborators.
    pub fn with_collaborators(tree: ActivityTree, globals: G, store: S, log: L) -> Self {
        Self {
            tree,
            current: None,
            suspended: None,
            success_status: SuccessStatus::Unknown,
            completion_status: CompletionStatus::Unknown,
            total_points: None,
            globals,
            store,
            log,
        }
    }

    /// Restore the current and suspended activities of a persisted session.
    pub fn with_session_state(
        mut self,
        current: Option<ActivityId>,
        suspended: Option<ActivityId>,
    ) -> Self {
        self.current = current;
        self.suspended = suspended;
        self
    }

    /// The activity tree.
    pub fn tree(&self) -> &ActivityTree {
        &self.tree
    }

    /// Consume the session and return its tree.
    pub fn into_tree(self) -> ActivityTree {
        self.tree
    }

    /// The root activity.
    pub fn root(&self) -> ActivityId {
        self.tree.root()
    }

    /// The activity currently delivered, if any.
    pub fn current_activity(&self) -> Option<ActivityId> {
        self.current
    }

    /// The activity a later ResumeAll returns to, if any.
    pub fn suspended_activity(&self) -> Option<ActivityId> {
        self.suspended
    }

    /// Session success status, mirrored from the root's primary objective.
    pub fn success_status(&self) -> SuccessStatus {
        self.success_status
    }

    /// Session completion status, mirrored from the root.
    pub fn completion_status(&self) -> CompletionStatus {
        self.completion_status
    }

    /// Session score: the root's scaled measure times 100.
    pub fn total_points(&self) -> Option<f64> {
        self.total_points
    }

    /// The global objective collaborator.
    pub fn globals(&self) -> &G {
        &self.globals
    }

    /// The global objective collaborator, mutably.
    pub fn globals_mut(&mut self) -> &mut G {
        &mut self.globals
    }

    /// The activity data store collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The sequencing log collaborator.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// The content runtime surface of an active activity.
    pub fn content_writes(&mut self, id: ActivityId) -> Result<ContentWrites<'_>, TreeError> {
        self.tree.content_writes(id)
    }

    /// A copy of this session for a dry-run navigation: global objectives
    /// are read through but never written, nothing is loaded, nothing logged.
    pub(crate) fn clone_for_navigation_test(
        &self,
    ) -> NavigatorData<ReadOnlyGlobals<'_, G>, NoActivityStore, NoLog> {
        NavigatorData {
            tree: self.tree.clone(),
            current: self.current,
            suspended: self.suspended,
            success_status: self.success_status,
            completion_status: self.completion_status,
            total_points: self.total_points,
            globals: ReadOnlyGlobals(&self.globals),
            store: NoActivityStore,
            log: NoLog,
        }
    }
}

impl<G, S: ActivityDataStore, L> NavigatorData<G, S, L> {
    /// Load persisted state for `id` through the data store.
    pub(crate) fn update_activity_data(&mut self, id: ActivityId) {
        let key = self.tree[id].key();
        // The key is borrowed from the tree, which the store also needs mutably.
        let key = alloc::string::String::from(key);
        self.store
            .update_activity_data(&key, self.tree.advanced_access(id));
    }
}

impl<G: GlobalObjectiveMap, S, L> NavigatorData<G, S, L> {
    /// Push `id`'s objectives to the global objective map.
    pub(crate) fn write_global_objectives(&mut self, id: ActivityId) {
        self.globals
            .write_global_objectives(self.tree[id].data().objectives());
    }
}
