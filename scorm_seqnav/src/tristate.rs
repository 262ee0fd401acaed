// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Three-valued logic for rule conditions.
//!
//! Conditions that depend on tracking state the learner has not produced yet
//! evaluate to [`TriState::Unknown`]. Combinations follow Kleene logic:
//!
//! | `and`     | True    | False | Unknown |
//! |-----------|---------|-------|---------|
//! | True      | True    | False | Unknown |
//! | False     | False   | False | False   |
//! | Unknown   | Unknown | False | Unknown |
//!
//! | `or`      | True | False   | Unknown |
//! |-----------|------|---------|---------|
//! | True      | True | True    | True    |
//! | False     | True | False   | Unknown |
//! | Unknown   | True | Unknown | Unknown |
//!
//! A rule fires only when its combined result is exactly [`TriState::True`].

use core::ops::{BitAnd, BitOr, Not};

/// A true/false/unknown value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TriState {
    /// Known to hold.
    True,
    /// Known not to hold.
    False,
    /// Not determinable from the current tracking state.
    #[default]
    Unknown,
}

impl TriState {
    /// Three-valued AND.
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    /// Three-valued OR.
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    /// Inverts known values; unknown stays unknown.
    pub const fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }

    /// `true` only for [`TriState::True`].
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// `true` for [`TriState::Unknown`].
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// `value` when `known`, otherwise unknown.
    pub const fn known_if(known: bool, value: bool) -> Self {
        if known { Self::from_bool(value) } else { Self::Unknown }
    }

    /// Lift a plain boolean.
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(v) => Self::from_bool(v),
            None => Self::Unknown,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

impl BitAnd for TriState {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for TriState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Not for TriState {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}
