// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the engine: commands, requests, directions, and collaborator traits.
//!
//! ## Overview
//!
//! A [`NavigationCommand`] from the learner (or from content) is classified into
//! an optional [`TerminationRequest`] and an optional [`SequencingRequest`].
//! The engine talks to the outside world only through the collaborator traits
//! defined here, each with a no-op default:
//!
//! - [`GlobalObjectiveMap`] / [`NoGlobalObjectives`]: shared objectives.
//! - [`ActivityDataStore`] / [`NoActivityStore`]: lazy loading of persisted state.
//! - [`SequencingLog`] / [`TracingLog`] / [`NoLog`]: sequencing event sink.
//! - [`Prerequisites`]: SCORM 1.2 prerequisite scripts.

use core::fmt;

use scorm_activity_tree::{LessonStatus, Objective, TrackingMut};

/// Navigation commands accepted by the engines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavigationCommand {
    /// Abandon the current activity.
    Abandon,
    /// Abandon the whole tree.
    AbandonAll,
    /// Choose a specific activity.
    Choose,
    /// Continue to the next activity.
    Continue,
    /// Exit the whole tree.
    ExitAll,
    /// Go to the previous activity.
    Previous,
    /// Resume a suspended session.
    ResumeAll,
    /// Start a new session.
    Start,
    /// Suspend the whole tree.
    SuspendAll,
    /// Exit the current activity.
    UnqualifiedExit,
}

/// Sequencing requests produced by navigation and termination processing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequencingRequest {
    /// Choose the destination.
    Choice,
    /// Flow forward.
    Continue,
    /// End the session if at the root.
    Exit,
    /// Flow backward.
    Previous,
    /// Resume the suspended activity.
    ResumeAll,
    /// Restart the current activity.
    Retry,
    /// Begin the session.
    Start,
}

/// Termination requests produced by navigation processing and postcondition rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerminationRequest {
    /// Deactivate the current activity without ending its attempt.
    Abandon,
    /// Deactivate every activity up to the root.
    AbandonAll,
    /// End the current attempt.
    Exit,
    /// End every attempt up to the root.
    ExitAll,
    /// End the parent's attempt.
    ExitParent,
    /// Suspend every activity up to the root.
    SuspendAll,
}

/// Direction of a flow traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Toward later activities in preorder.
    Forward,
    /// Toward earlier activities in preorder.
    Backward,
}

/// Category of a sequencing log event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequencingEventType {
    /// A step inside a navigation.
    IntermediateNavigation,
    /// The outcome of a navigation.
    FinalNavigation,
    /// A rollup step.
    Rollup,
}

/// Shared (global) objectives that activities read and write through their
/// objective maps.
pub trait GlobalObjectiveMap {
    /// Satisfied status stored under `objective`, if known.
    fn read_satisfied_status(&self, objective: &str) -> Option<bool>;

    /// Normalized measure stored under `objective`, if known.
    fn read_normalized_measure(&self, objective: &str) -> Option<f64>;

    /// Push the values of `objectives` to every key in their write maps.
    fn write_global_objectives(&mut self, objectives: &[Objective]);
}

/// A [`GlobalObjectiveMap`] with nothing in it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGlobalObjectives;

impl GlobalObjectiveMap for NoGlobalObjectives {
    fn read_satisfied_status(&self, _objective: &str) -> Option<bool> {
        None
    }

    fn read_normalized_measure(&self, _objective: &str) -> Option<f64> {
        None
    }

    fn write_global_objectives(&mut self, _objectives: &[Objective]) {}
}

/// Read-through view of another map that drops every write.
///
/// Used for dry-run navigations that must not publish objective changes.
#[derive(Clone, Copy, Debug)]
pub struct ReadOnlyGlobals<'a, G>(pub &'a G);

impl<G: GlobalObjectiveMap> GlobalObjectiveMap for ReadOnlyGlobals<'_, G> {
    fn read_satisfied_status(&self, objective: &str) -> Option<bool> {
        self.0.read_satisfied_status(objective)
    }

    fn read_normalized_measure(&self, objective: &str) -> Option<f64> {
        self.0.read_normalized_measure(objective)
    }

    fn write_global_objectives(&mut self, _objectives: &[Objective]) {}
}

/// Lazily loads persisted tracking state into an activity.
///
/// Called before the engine first mutates an activity in a session; must be
/// idempotent.
pub trait ActivityDataStore {
    /// Load persisted state for the activity with `key`, if any.
    fn update_activity_data(&mut self, key: &str, tracking: TrackingMut<'_>);
}

/// An [`ActivityDataStore`] with nothing persisted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoActivityStore;

impl ActivityDataStore for NoActivityStore {
    fn update_activity_data(&mut self, _key: &str, _tracking: TrackingMut<'_>) {}
}

/// Write-only sink for sequencing events.
pub trait SequencingLog {
    /// Record one event.
    fn log_sequencing(
        &mut self,
        event: SequencingEventType,
        command: NavigationCommand,
        message: fmt::Arguments<'_>,
    );
}

/// Forwards sequencing events to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl SequencingLog for TracingLog {
    fn log_sequencing(
        &mut self,
        event: SequencingEventType,
        command: NavigationCommand,
        message: fmt::Arguments<'_>,
    ) {
        tracing::debug!(?event, ?command, "{message}");
    }
}

/// Discards sequencing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLog;

impl SequencingLog for NoLog {
    fn log_sequencing(
        &mut self,
        _event: SequencingEventType,
        _command: NavigationCommand,
        _message: fmt::Arguments<'_>,
    ) {
    }
}

/// Evaluates SCORM 1.2 prerequisite expressions.
pub trait Prerequisites {
    /// Whether `expression` is satisfied. `lesson_status` maps an item
    /// identifier to its lesson status, `None` for unknown identifiers.
    fn evaluate(
        &self,
        expression: Option<&str>,
        lesson_status: &dyn Fn(&str) -> Option<LessonStatus>,
    ) -> bool;
}
