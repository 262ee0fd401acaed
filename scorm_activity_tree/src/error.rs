// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while building a tree or writing tracking state.

use alloc::string::String;

use crate::types::ActivityId;

/// Errors from [`ActivityTree`](crate::ActivityTree) construction and content writes.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// Two activities share a key.
    #[error("duplicate activity key `{0}`")]
    DuplicateKey(String),
    /// Two objectives of one activity share an id.
    #[error("activity `{activity}` defines objective `{objective}` more than once")]
    DuplicateObjective {
        /// Key of the offending activity.
        activity: String,
        /// The repeated objective id.
        objective: String,
    },
    /// A handle does not belong to this tree.
    #[error("unknown activity {0:?}")]
    UnknownActivity(ActivityId),
    /// A proposed child order is not a permutation of the cluster's children.
    #[error("child order for {0:?} is not a permutation of its children")]
    InvalidChildOrder(ActivityId),
    /// Content tried to write to an activity that is not being delivered.
    #[error("activity {0:?} is not active")]
    NotActive(ActivityId),
    /// Content referenced an objective the activity does not define.
    #[error("unknown objective `{0}`")]
    UnknownObjective(String),
    /// Scaled scores live in `-1..=1`.
    #[error("scaled score {0} is outside -1..=1")]
    ScaledScoreOutOfRange(f64),
    /// Progress measures live in `0..=1`.
    #[error("progress measure {0} is outside 0..=1")]
    ProgressMeasureOutOfRange(f64),
}
