// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-activity tracking state and the two views that may write it.
//!
//! ## Write access
//!
//! A [`DataModel`] is only ever handed out by shared reference. Mutation goes
//! through one of two capability views obtained from the
//! [`ActivityTree`](crate::ActivityTree):
//!
//! - [`TrackingMut`], from [`ActivityTree::advanced_access`](crate::ActivityTree::advanced_access):
//!   full access, for the sequencing engine and for persistence layers that
//!   restore saved state. It dereferences to the data model.
//! - [`ContentWrites`], from [`ActivityTree::content_writes`](crate::ActivityTree::content_writes):
//!   the fields a delivered SCO may set, only while the activity is active.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};
use core::time::Duration;

use crate::error::TreeError;
use crate::sequencing::{ObjectiveDefinition, Sequencing};
use crate::types::PackageFormat;

/// Objective success.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SuccessStatus {
    /// Not known.
    #[default]
    Unknown,
    /// Satisfied.
    Passed,
    /// Not satisfied.
    Failed,
}

/// Attempt completion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompletionStatus {
    /// Not known.
    #[default]
    Unknown,
    /// Reported as not attempted.
    NotAttempted,
    /// In progress.
    Incomplete,
    /// Completed.
    Completed,
}

/// SCORM 1.2 `cmi.core.lesson_status`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LessonStatus {
    /// Not attempted yet.
    #[default]
    NotAttempted,
    /// Started but not finished.
    Incomplete,
    /// Finished.
    Completed,
    /// Finished and mastered.
    Passed,
    /// Finished and not mastered.
    Failed,
    /// Viewed without credit.
    Browsed,
}

impl LessonStatus {
    /// Passed or completed, the statuses that satisfy a SCORM 1.2 prerequisite.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Passed | Self::Completed)
    }
}

/// How the content is being entered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryMode {
    /// First entry of a new attempt.
    #[default]
    AbInitio,
    /// Resuming a suspended attempt.
    Resume,
    /// Anything else.
    AllOtherConditions,
}

/// How the content says it is exiting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitMode {
    /// Normal exit.
    Normal,
    /// Suspend the attempt.
    Suspended,
    /// Leave the whole session, suspending it.
    Logout,
    /// The time limit was hit.
    TimeOut,
}

/// A navigation request posted by the content (`adl.nav.request`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentNavigationRequest {
    /// Continue.
    Continue,
    /// Previous.
    Previous,
    /// Choose the activity with this key.
    Choice(String),
    /// Exit the current activity.
    Exit,
    /// Exit the whole tree.
    ExitAll,
    /// Abandon the current activity.
    Abandon,
    /// Abandon the whole tree.
    AbandonAll,
    /// Suspend the whole tree.
    SuspendAll,
}

/// Score as reported by content; every part is optional.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    /// Raw score.
    pub raw: Option<f64>,
    /// Scaled score in `-1..=1`.
    pub scaled: Option<f64>,
    /// Minimum possible raw score.
    pub min: Option<f64>,
    /// Maximum possible raw score.
    pub max: Option<f64>,
}

/// Tracking state of one objective.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    definition: ObjectiveDefinition,
    primary: bool,
    tracked: bool,
    success_status: SuccessStatus,
    scaled_score: Option<f64>,
}

impl Objective {
    fn from_definition(definition: ObjectiveDefinition, primary: bool, tracked: bool) -> Self {
        Self {
            definition,
            primary,
            tracked,
            success_status: SuccessStatus::Unknown,
            scaled_score: None,
        }
    }

    /// Identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.definition.id.as_deref()
    }

    /// Whether this is the activity's primary objective.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// The static definition this objective was created from.
    pub fn definition(&self) -> &ObjectiveDefinition {
        &self.definition
    }

    /// Recorded success.
    pub fn success_status(&self) -> SuccessStatus {
        self.success_status
    }

    /// Recorded scaled score.
    pub fn scaled_score(&self) -> Option<f64> {
        self.scaled_score
    }

    /// Objective progress status: tracked and success known.
    pub fn progress_status(&self) -> bool {
        self.tracked && self.success_status != SuccessStatus::Unknown
    }

    /// Objective satisfied status.
    pub fn satisfied_status(&self) -> bool {
        self.success_status == SuccessStatus::Passed
    }

    /// Objective measure status: tracked and a scaled score recorded.
    pub fn measure_status(&self) -> bool {
        self.tracked && self.scaled_score.is_some()
    }

    /// Objective normalized measure; zero when unknown.
    pub fn normalized_measure(&self) -> f64 {
        self.scaled_score.unwrap_or(0.0)
    }

    /// Set the recorded success.
    pub fn set_success_status(&mut self, status: SuccessStatus) {
        self.success_status = status;
    }

    /// Set the recorded scaled score.
    pub fn set_scaled_score(&mut self, scaled: Option<f64>) {
        self.scaled_score = scaled;
    }
}

/// Tracking state of one activity.
///
/// Read-only outside of [`TrackingMut`] and [`ContentWrites`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataModel {
    tracked: bool,
    active: bool,
    suspended: bool,
    attempt_count: u32,
    activity_progress_status: bool,
    completion_status: CompletionStatus,
    success_status: SuccessStatus,
    score: Score,
    progress_measure: Option<f64>,
    total_time: Duration,
    session_time: Duration,
    mastery_score: Option<f64>,
    credit: bool,
    lesson_status: LessonStatus,
    entry: EntryMode,
    exit: Option<ExitMode>,
    navigation_request: Option<ContentNavigationRequest>,
    suspend_data: Option<String>,
    location: Option<String>,
    objectives: Vec<Objective>,
}

impl DataModel {
    pub(crate) fn new(sequencing: &Sequencing, mastery_score: Option<f64>, credit: bool) -> Self {
        Self {
            tracked: sequencing.tracked(),
            active: false,
            suspended: false,
            attempt_count: 0,
            activity_progress_status: false,
            completion_status: CompletionStatus::Unknown,
            success_status: SuccessStatus::Unknown,
            score: Score::default(),
            progress_measure: None,
            total_time: Duration::ZERO,
            session_time: Duration::ZERO,
            mastery_score,
            credit,
            lesson_status: LessonStatus::NotAttempted,
            entry: EntryMode::AbInitio,
            exit: None,
            navigation_request: None,
            suspend_data: None,
            location: None,
            objectives: objectives_from(sequencing),
        }
    }

    /// Whether the activity is tracked.
    pub fn tracked(&self) -> bool {
        self.tracked
    }

    /// Activity is active (an attempt is in progress).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activity is suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Number of attempts begun on this activity.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Activity progress status; always false when not tracked.
    pub fn activity_progress_status(&self) -> bool {
        self.tracked && self.activity_progress_status
    }

    /// Attempt progress status: tracked and completion known.
    pub fn attempt_progress_status(&self) -> bool {
        self.tracked && self.completion_status != CompletionStatus::Unknown
    }

    /// Attempt completion status.
    pub fn attempt_completion_status(&self) -> bool {
        self.completion_status == CompletionStatus::Completed
    }

    /// Completion status.
    pub fn completion_status(&self) -> CompletionStatus {
        self.completion_status
    }

    /// Success status as reported by the content.
    pub fn success_status(&self) -> SuccessStatus {
        self.success_status
    }

    /// Score as reported by the content.
    pub fn score(&self) -> &Score {
        &self.score
    }

    /// Progress measure in `0..=1`.
    pub fn progress_measure(&self) -> Option<f64> {
        self.progress_measure
    }

    /// Accumulated time over finished sessions.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Time of the session in progress.
    pub fn session_time(&self) -> Duration {
        self.session_time
    }

    /// Mastery score (SCORM 1.2).
    pub fn mastery_score(&self) -> Option<f64> {
        self.mastery_score
    }

    /// Whether the attempt is for credit.
    pub fn credit(&self) -> bool {
        self.credit
    }

    /// SCORM 1.2 lesson status.
    pub fn lesson_status(&self) -> LessonStatus {
        self.lesson_status
    }

    /// Entry mode of the current attempt.
    pub fn entry(&self) -> EntryMode {
        self.entry
    }

    /// Exit mode reported by the content.
    pub fn exit(&self) -> Option<ExitMode> {
        self.exit
    }

    /// Pending navigation request posted by the content.
    pub fn navigation_request(&self) -> Option<&ContentNavigationRequest> {
        self.navigation_request.as_ref()
    }

    /// Suspend data.
    pub fn suspend_data(&self) -> Option<&str> {
        self.suspend_data.as_deref()
    }

    /// Bookmark location.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The primary objective. Always present; implicit when not defined.
    pub fn primary_objective(&self) -> &Objective {
        &self.objectives[0]
    }

    /// All objectives, primary first.
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Look up an objective by id.
    pub fn objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id() == Some(id))
    }

    /// Mark the activity active or inactive.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Mark the activity suspended or not.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    /// Overwrite the attempt count.
    pub fn set_attempt_count(&mut self, count: u32) {
        self.attempt_count = count;
    }

    /// Begin a new attempt: increments the attempt count and returns the new value.
    pub fn increment_attempt_count(&mut self) -> u32 {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.attempt_count
    }

    /// Set the activity progress status.
    pub fn set_activity_progress_status(&mut self, status: bool) {
        self.activity_progress_status = status;
    }

    /// Set the completion status.
    pub fn set_completion_status(&mut self, status: CompletionStatus) {
        self.completion_status = status;
    }

    /// Set the content-reported success status.
    pub fn set_success_status(&mut self, status: SuccessStatus) {
        self.success_status = status;
    }

    /// Set the SCORM 1.2 lesson status.
    pub fn set_lesson_status(&mut self, status: LessonStatus) {
        self.lesson_status = status;
    }

    /// Replace the score.
    pub fn set_score(&mut self, score: Score) {
        self.score = score;
    }

    /// Set the session time.
    pub fn set_session_time(&mut self, time: Duration) {
        self.session_time = time;
    }

    /// Set the entry mode.
    pub fn set_entry(&mut self, entry: EntryMode) {
        self.entry = entry;
    }

    /// Set the exit mode.
    pub fn set_exit(&mut self, exit: Option<ExitMode>) {
        self.exit = exit;
    }

    /// Set or clear the pending content navigation request.
    pub fn set_navigation_request(&mut self, request: Option<ContentNavigationRequest>) {
        self.navigation_request = request;
    }

    /// Mutable access to the primary objective.
    pub fn primary_objective_mut(&mut self) -> &mut Objective {
        &mut self.objectives[0]
    }

    /// Mutable access to all objectives.
    pub fn objectives_mut(&mut self) -> &mut [Objective] {
        &mut self.objectives
    }

    /// Fold the session time into the total and reset it.
    pub fn fold_session_time(&mut self) {
        self.total_time += self.session_time;
        self.session_time = Duration::ZERO;
    }

    /// Reset attempt data for a new attempt on a cluster.
    ///
    /// With `progress`, completion becomes unknown. With `objective`, every
    /// objective loses its measure and success, as does the content-reported
    /// success status.
    pub fn reset_attempt_data(&mut self, progress: bool, objective: bool) {
        if progress {
            self.completion_status = CompletionStatus::Unknown;
        }
        if objective {
            for o in &mut self.objectives {
                o.scaled_score = None;
                o.success_status = SuccessStatus::Unknown;
            }
            self.success_status = SuccessStatus::Unknown;
        }
    }

    /// Prepare for delivery of a resumed (previously suspended) attempt.
    pub fn initialize_for_delivery_after_suspend(&mut self, format: PackageFormat) {
        self.entry = if format == PackageFormat::Scorm12 && self.exit == Some(ExitMode::Logout) {
            // Data is preserved, but a logged-out SCORM 1.2 SCO must not see "resume".
            EntryMode::AllOtherConditions
        } else {
            EntryMode::Resume
        };
        self.exit = None;
    }
}

fn objectives_from(sequencing: &Sequencing) -> Vec<Objective> {
    let tracked = sequencing.tracked();
    let primary = sequencing.primary_objective.clone().unwrap_or_default();
    let mut out = Vec::with_capacity(1 + sequencing.objectives.len());
    out.push(Objective::from_definition(primary, true, tracked));
    out.extend(
        sequencing
            .objectives
            .iter()
            .cloned()
            .map(|d| Objective::from_definition(d, false, tracked)),
    );
    out
}

/// Full write access to one activity's tracking state.
///
/// Obtained from [`ActivityTree::advanced_access`](crate::ActivityTree::advanced_access).
/// Dereferences to [`DataModel`], whose setters are only reachable through this view.
#[derive(Debug)]
pub struct TrackingMut<'a> {
    pub(crate) sequencing: &'a Sequencing,
    pub(crate) data: &'a mut DataModel,
}

impl TrackingMut<'_> {
    /// Static configuration of the activity.
    pub fn sequencing(&self) -> &Sequencing {
        self.sequencing
    }

    /// Prepare the data model for delivery of a new attempt.
    ///
    /// Clears score, success, progress measure, exit, and the pending
    /// navigation request, and recreates objectives from their definitions.
    /// SCORM 2004 additionally clears suspend data and total time; SCORM 1.2
    /// enters ab-initio only on the first attempt.
    pub fn initialize_for_delivery(&mut self, format: PackageFormat) {
        let data = &mut *self.data;
        data.entry = if format == PackageFormat::Scorm2004 || data.attempt_count == 1 {
            EntryMode::AbInitio
        } else {
            EntryMode::AllOtherConditions
        };
        data.score = Score::default();
        data.success_status = SuccessStatus::Unknown;
        data.progress_measure = None;
        data.exit = None;
        data.navigation_request = None;
        data.objectives = objectives_from(self.sequencing);
        if format == PackageFormat::Scorm2004 {
            data.suspend_data = None;
            data.total_time = Duration::ZERO;
        }
    }

    /// Replace the whole tracking state with a persisted snapshot.
    ///
    /// The tracked flag always follows the activity's configuration.
    pub fn restore(&mut self, mut snapshot: DataModel) {
        snapshot.tracked = self.sequencing.tracked();
        *self.data = snapshot;
    }
}

impl Deref for TrackingMut<'_> {
    type Target = DataModel;

    fn deref(&self) -> &DataModel {
        self.data
    }
}

impl DerefMut for TrackingMut<'_> {
    fn deref_mut(&mut self) -> &mut DataModel {
        self.data
    }
}

/// The runtime surface a delivered SCO may write.
///
/// Obtained from [`ActivityTree::content_writes`](crate::ActivityTree::content_writes),
/// which refuses inactive activities.
#[derive(Debug)]
pub struct ContentWrites<'a> {
    pub(crate) data: &'a mut DataModel,
}

impl ContentWrites<'_> {
    /// `cmi.completion_status`.
    pub fn set_completion_status(&mut self, status: CompletionStatus) -> &mut Self {
        self.data.completion_status = status;
        self
    }

    /// `cmi.success_status`.
    pub fn set_success_status(&mut self, status: SuccessStatus) -> &mut Self {
        self.data.success_status = status;
        self
    }

    /// `cmi.core.lesson_status` (SCORM 1.2).
    pub fn set_lesson_status(&mut self, status: LessonStatus) -> &mut Self {
        self.data.lesson_status = status;
        self
    }

    /// `cmi.score.raw`.
    pub fn set_score_raw(&mut self, raw: Option<f64>) -> &mut Self {
        self.data.score.raw = raw;
        self
    }

    /// `cmi.score.min` and `cmi.score.max`.
    pub fn set_score_range(&mut self, min: Option<f64>, max: Option<f64>) -> &mut Self {
        self.data.score.min = min;
        self.data.score.max = max;
        self
    }

    /// `cmi.score.scaled`, which must lie in `-1..=1`.
    pub fn set_score_scaled(&mut self, scaled: Option<f64>) -> Result<&mut Self, TreeError> {
        check_scaled(scaled)?;
        self.data.score.scaled = scaled;
        Ok(self)
    }

    /// `cmi.progress_measure`, which must lie in `0..=1`.
    pub fn set_progress_measure(&mut self, measure: Option<f64>) -> Result<&mut Self, TreeError> {
        if let Some(m) = measure
            && !(0.0..=1.0).contains(&m)
        {
            return Err(TreeError::ProgressMeasureOutOfRange(m));
        }
        self.data.progress_measure = measure;
        Ok(self)
    }

    /// `cmi.session_time`.
    pub fn set_session_time(&mut self, time: Duration) -> &mut Self {
        self.data.session_time = time;
        self
    }

    /// `cmi.exit`.
    pub fn set_exit(&mut self, exit: Option<ExitMode>) -> &mut Self {
        self.data.exit = exit;
        self
    }

    /// `cmi.suspend_data`.
    pub fn set_suspend_data(&mut self, data: Option<String>) -> &mut Self {
        self.data.suspend_data = data;
        self
    }

    /// `cmi.location`.
    pub fn set_location(&mut self, location: Option<String>) -> &mut Self {
        self.data.location = location;
        self
    }

    /// `adl.nav.request`.
    pub fn set_navigation_request(
        &mut self,
        request: Option<ContentNavigationRequest>,
    ) -> &mut Self {
        self.data.navigation_request = request;
        self
    }

    /// `cmi.objectives.n.success_status` for the objective with this id.
    pub fn set_objective_success_status(
        &mut self,
        id: &str,
        status: SuccessStatus,
    ) -> Result<&mut Self, TreeError> {
        self.objective_mut(id)?.success_status = status;
        Ok(self)
    }

    /// `cmi.objectives.n.score.scaled` for the objective with this id.
    pub fn set_objective_scaled_score(
        &mut self,
        id: &str,
        scaled: Option<f64>,
    ) -> Result<&mut Self, TreeError> {
        check_scaled(scaled)?;
        self.objective_mut(id)?.scaled_score = scaled;
        Ok(self)
    }

    fn objective_mut(&mut self, id: &str) -> Result<&mut Objective, TreeError> {
        self.data
            .objectives
            .iter_mut()
            .find(|o| o.id() == Some(id))
            .ok_or_else(|| TreeError::UnknownObjective(id.into()))
    }
}

fn check_scaled(scaled: Option<f64>) -> Result<(), TreeError> {
    match scaled {
        Some(s) if !(-1.0..=1.0).contains(&s) => Err(TreeError::ScaledScoreOutOfRange(s)),
        _ => Ok(()),
    }
}
