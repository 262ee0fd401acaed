// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequencing exceptions and engine errors.
//!
//! ## Overview
//!
//! Every invalid navigation is reported with a [`SequencingExceptionCode`]
//! naming the exact clause of the sequencing pseudocode that refused it:
//! `NB` navigation request, `TB` termination request, `SB` sequencing request,
//! `DB` delivery request. Codes display in their dotted form, for example
//! `NB.2.1-10`.
//!
//! These are invalid-use or invalid-package outcomes, not transient failures.
//! The engine never retries them and never rolls back state mutated before
//! the failure point.

use alloc::string::String;

macro_rules! exception_codes {
    ($($code:ident => $dotted:literal, $message:literal;)*) => {
        /// Closed set of sequencing exception codes.
        #[allow(
            non_camel_case_types,
            reason = "codes mirror the numbered clauses of the sequencing pseudocode."
        )]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum SequencingExceptionCode {
            $(
                #[doc = $message]
                $code,
            )*
        }

        impl SequencingExceptionCode {
            /// Every code, in clause order.
            pub const ALL: &'static [Self] = &[$(Self::$code),*];

            /// Dotted form, e.g. `SB.2.1-1`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$code => $dotted,)*
                }
            }

            /// Fixed English description.
            pub const fn message(self) -> &'static str {
                match self {
                    $(Self::$code => $message,)*
                }
            }
        }
    };
}

exception_codes! {
    NB_2_1__1 => "NB.2.1-1", "The sequencing session has already begun.";
    NB_2_1__2 => "NB.2.1-2", "The sequencing session has not begun.";
    NB_2_1__3 => "NB.2.1-3", "There is no suspended activity to resume.";
    NB_2_1__4 => "NB.2.1-4", "Flow is not enabled for the current activity's parent.";
    NB_2_1__5 => "NB.2.1-5", "Flow is disabled or forward-only is set for the current activity's parent.";
    NB_2_1__6 => "NB.2.1-6", "There is no activity before the root.";
    NB_2_1__7 => "NB.2.1-7", "The navigation request is not supported.";
    NB_2_1__8 => "NB.2.1-8", "An active activity on the path does not allow choice exit.";
    NB_2_1__9 => "NB.2.1-9", "There are no activities to consider.";
    NB_2_1__10 => "NB.2.1-10", "Choice is not enabled for the target's parent.";
    NB_2_1__11 => "NB.2.1-11", "The target activity does not exist.";
    NB_2_1__12 => "NB.2.1-12", "The current activity has already been terminated.";
    NB_2_1__13 => "NB.2.1-13", "The navigation request is undefined.";
    TB_2_3__1 => "TB.2.3-1", "There is no current activity to terminate.";
    TB_2_3__2 => "TB.2.3-2", "The current activity has already been terminated.";
    TB_2_3__3 => "TB.2.3-3", "An inactive root cannot be suspended.";
    TB_2_3__4 => "TB.2.3-4", "The root has no parent to exit.";
    TB_2_3__5 => "TB.2.3-5", "There is nothing to suspend.";
    TB_2_3__6 => "TB.2.3-6", "There is nothing to abandon.";
    TB_2_3__7 => "TB.2.3-7", "The termination request is undefined.";
    SB_2_1__1 => "SB.2.1-1", "The last activity in the tree has been reached.";
    SB_2_1__2 => "SB.2.1-2", "The cluster has no available children.";
    SB_2_1__3 => "SB.2.1-3", "There is no activity before the root.";
    SB_2_1__4 => "SB.2.1-4", "Forward-only prevents moving backward.";
    SB_2_2__1 => "SB.2.2-1", "Flow is not enabled for the parent.";
    SB_2_2__2 => "SB.2.2-2", "The activity is not available.";
    SB_2_4__1 => "SB.2.4-1", "Forward traversal is blocked.";
    SB_2_4__2 => "SB.2.4-2", "Forward-only prevents moving backward.";
    SB_2_4__3 => "SB.2.4-3", "There is no activity before the root.";
    SB_2_5__1 => "SB.2.5-1", "The sequencing session has already begun.";
    SB_2_6__1 => "SB.2.6-1", "The sequencing session has already begun.";
    SB_2_6__2 => "SB.2.6-2", "There is no suspended activity to resume.";
    SB_2_7__1 => "SB.2.7-1", "The sequencing session has not begun.";
    SB_2_7__2 => "SB.2.7-2", "Flow is not enabled for the current activity's parent.";
    SB_2_8__1 => "SB.2.8-1", "The sequencing session has not begun.";
    SB_2_8__2 => "SB.2.8-2", "Flow is not enabled for the current activity's parent.";
    SB_2_9__1 => "SB.2.9-1", "The target activity does not exist.";
    SB_2_9__2 => "SB.2.9-2", "The target activity is not in the tree.";
    SB_2_9__3 => "SB.2.9-3", "The target activity is hidden from choice.";
    SB_2_9__4 => "SB.2.9-4", "Choice is not enabled for the target's parent.";
    SB_2_9__5 => "SB.2.9-5", "There are no activities to consider.";
    SB_2_9__6 => "SB.2.9-6", "Prevent-activation forbids starting an attempt on the path.";
    SB_2_9__7 => "SB.2.9-7", "An active activity on the path does not allow choice exit.";
    SB_2_9__8 => "SB.2.9-8", "Constrained choice forbids the target activity.";
    SB_2_9__9 => "SB.2.9-9", "The choice is only reachable through flow.";
    SB_2_10__1 => "SB.2.10-1", "The sequencing session has not begun.";
    SB_2_10__2 => "SB.2.10-2", "The current activity is still active or suspended.";
    SB_2_10__3 => "SB.2.10-3", "Flow is not enabled for the cluster.";
    SB_2_11__1 => "SB.2.11-1", "The sequencing session has not begun.";
    SB_2_11__2 => "SB.2.11-2", "The current activity has not been terminated.";
    SB_2_12__1 => "SB.2.12-1", "The sequencing request is undefined.";
    DB_1_1__1 => "DB.1.1-1", "A cluster cannot be delivered.";
    DB_1_1__2 => "DB.1.1-2", "There is nothing to deliver.";
    DB_1_1__3 => "DB.1.1-3", "The activity is not available for delivery.";
    DB_2__1 => "DB.2-1", "The current activity is still active.";
}

impl core::fmt::Display for SequencingExceptionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every fallible engine call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequencingError {
    /// The request was refused by a numbered sequencing rule.
    #[error("{code}: {}", .code.message())]
    Sequencing {
        /// Which clause refused the request.
        code: SequencingExceptionCode,
    },
    /// A rule references an objective its activity does not define.
    #[error("objective `{0}` is not defined on the activity")]
    UnknownObjective(String),
    /// A navigation named an activity key that is not in the tree.
    #[error("no activity with key `{0}`")]
    UnknownActivity(String),
    /// Data-model navigation requires a current activity.
    #[error("there is no current activity")]
    NoCurrentActivity,
    /// An engine invariant was violated. This is a bug, not a content problem.
    #[error("internal sequencing error: {0}")]
    Internal(&'static str),
}

impl SequencingError {
    /// The sequencing exception code, if this is a sequencing exception.
    pub fn code(&self) -> Option<SequencingExceptionCode> {
        match self {
            Self::Sequencing { code } => Some(*code),
            _ => None,
        }
    }
}

impl From<SequencingExceptionCode> for SequencingError {
    fn from(code: SequencingExceptionCode) -> Self {
        Self::Sequencing { code }
    }
}
