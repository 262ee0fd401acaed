// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the activity tree: identifiers, control-mode flags, and small enums.

/// Identifier for an activity in an [`ActivityTree`](crate::ActivityTree).
///
/// A small, copyable handle. The shape of a tree never changes once a session
/// starts, so an `ActivityId` stays valid for the lifetime of the tree that
/// issued it. Handles from one tree must not be used with another.
///
/// The ordering of `ActivityId`s is insertion order, which is *not* the
/// preorder of the tree once children have been reordered; use
/// [`ActivityTree::comes_before_in_preorder`](crate::ActivityTree::comes_before_in_preorder)
/// for tree order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub(crate) u32);

impl ActivityId {
    pub(crate) const fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index of this activity, stable for the life of the tree.
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Which SCORM flavour a tree is being sequenced as.
///
/// Affects only data-model initialization on delivery (entry mode and which
/// fields are cleared for a new attempt).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageFormat {
    /// SCORM 2004 (any edition).
    #[default]
    Scorm2004,
    /// SCORM 1.2.
    Scorm12,
}

bitflags::bitflags! {
    /// Sequencing control modes of a cluster.
    ///
    /// These govern how the *children* of the activity may be navigated,
    /// except for the `USE_CURRENT_ATTEMPT_*` pair, which govern how the
    /// activity's own attempt data is reset on re-entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ControlModes: u16 {
        /// Children may be targeted by a Choose request.
        const CHOICE = 1 << 0;
        /// An active child may be left by a Choose request elsewhere.
        const CHOICE_EXIT = 1 << 1;
        /// Children may be walked with Continue/Previous.
        const FLOW = 1 << 2;
        /// Flow is forward only; Previous is refused.
        const FORWARD_ONLY = 1 << 3;
        /// Choice into this cluster is limited to the flow neighbours of the current path.
        const CONSTRAIN_CHOICE = 1 << 4;
        /// Choice may not start an attempt on an inactive descendant.
        const PREVENT_ACTIVATION = 1 << 5;
        /// Objective info is reset when a new attempt on this cluster begins.
        const USE_CURRENT_ATTEMPT_OBJECTIVE_INFO = 1 << 6;
        /// Progress info is reset when a new attempt on this cluster begins.
        const USE_CURRENT_ATTEMPT_PROGRESS_INFO = 1 << 7;
    }
}

impl Default for ControlModes {
    fn default() -> Self {
        Self::CHOICE
            | Self::CHOICE_EXIT
            | Self::USE_CURRENT_ATTEMPT_OBJECTIVE_INFO
            | Self::USE_CURRENT_ATTEMPT_PROGRESS_INFO
    }
}

bitflags::bitflags! {
    /// Delivery controls of an activity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DeliveryControls: u8 {
        /// Tracking state is maintained for this activity.
        const TRACKED = 1 << 0;
        /// Content reports completion itself; the sequencer never defaults it.
        const COMPLETION_SET_BY_CONTENT = 1 << 1;
        /// Content reports objective success itself; the sequencer never defaults it.
        const OBJECTIVE_SET_BY_CONTENT = 1 << 2;
    }
}

impl Default for DeliveryControls {
    fn default() -> Self {
        Self::TRACKED
    }
}

bitflags::bitflags! {
    /// Rollup controls of an activity (how it contributes to its parent).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RollupControls: u8 {
        /// Contributes to the parent's satisfied/not-satisfied rollup.
        const ROLLUP_OBJECTIVE_SATISFIED = 1 << 0;
        /// Contributes to the parent's completed/incomplete rollup.
        const ROLLUP_PROGRESS_COMPLETION = 1 << 1;
        /// Measure-based satisfaction is evaluated even while the activity is active.
        const MEASURE_SATISFACTION_IF_ACTIVE = 1 << 2;
    }
}

impl Default for RollupControls {
    fn default() -> Self {
        Self::ROLLUP_OBJECTIVE_SATISFIED
            | Self::ROLLUP_PROGRESS_COMPLETION
            | Self::MEASURE_SATISFACTION_IF_ACTIVE
    }
}

/// When a child participates in its parent's rollup.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollupConsideration {
    /// Always participates.
    #[default]
    Always,
    /// Only once it has been attempted.
    IfAttempted,
    /// Only if its precondition Skip rule does not fire.
    IfNotSkipped,
    /// Only if it is not an attempted, suspended activity.
    IfNotSuspended,
}

/// When selection or randomization is applied to a cluster's children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RandomizationTiming {
    /// Never.
    #[default]
    Never,
    /// Once, when the tree is first created for an attempt.
    Once,
    /// On every new attempt of the cluster.
    OnEachNewAttempt,
}
