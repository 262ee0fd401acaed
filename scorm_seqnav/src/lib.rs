// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SCORM Sequencing and Navigation: deciding what a learner sees next.
//!
//! This crate runs the SCORM 2004 sequencing process over a
//! [`scorm_activity_tree::ActivityTree`], and the much simpler SCORM 1.2
//! navigation model, behind one engine trait.
//!
//! - Navigation commands (Start, Continue, Previous, Choose, Exit, Suspend,
//!   Resume, Abandon) are validated and executed in the order the SCORM 2004
//!   pseudocode prescribes: navigation request, termination request,
//!   sequencing request, delivery request.
//! - Every refusal carries a [`SequencingExceptionCode`] naming the exact
//!   clause that refused it, so conformance tests can assert on codes.
//! - Rule conditions are evaluated in three-valued logic ([`TriState`]).
//! - Rollup aggregates children's completion, satisfaction, and weighted
//!   measure into their ancestors and mirrors the root into the session.
//! - Randomization draws from an injected [`rand::RngCore`], so a seeded
//!   source gives reproducible sessions.
//!
//! The engine performs no I/O. Global objectives, persisted activity data,
//! and the sequencing log are reached through the collaborator traits
//! [`GlobalObjectiveMap`], [`ActivityDataStore`], and [`SequencingLog`].
//!
//! ## API overview
//!
//! - [`NavigatorData`]: one learner's session over one tree.
//! - [`SeqNav`]: the engine contract, implemented by [`Scorm2004SeqNav`] and
//!   [`Scorm12SeqNav`].
//! - [`Navigator`]: session plus engine, with dry-run validity checks and a
//!   table of contents.
//! - [`RuleEvaluator`]: sequencing and rollup rule evaluation, usable on its
//!   own for inspection.
//! - [`GlobalObjectiveStore`]: an in-memory [`GlobalObjectiveMap`].
//!
//! ### Minimal usage
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use scorm_activity_tree::{ActivitySpec, ActivityTree, ControlModes, Sequencing};
//! use scorm_seqnav::{
//!     NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives,
//!     Scorm2004SeqNav, SequencingExceptionCode, TracingLog,
//! };
//!
//! let course = Sequencing::default().with_control_modes(ControlModes::FLOW, true);
//! let mut tree = ActivityTree::new(ActivitySpec::cluster("course").with_sequencing(course)).unwrap();
//! let root = tree.root();
//! let a = tree.insert(root, ActivitySpec::leaf("a")).unwrap();
//! let b = tree.insert(root, ActivitySpec::leaf("b")).unwrap();
//!
//! let data: NavigatorData<NoGlobalObjectives, NoActivityStore, TracingLog> = NavigatorData::new(tree);
//! let mut nav = Navigator::new(data, Scorm2004SeqNav::new(StdRng::seed_from_u64(7)));
//!
//! assert!(!nav.navigate(NavigationCommand::Start).unwrap());
//! assert_eq!(nav.data().current_activity(), Some(a));
//! assert!(nav.is_navigation_valid(NavigationCommand::Continue));
//!
//! nav.navigate(NavigationCommand::Continue).unwrap();
//! assert_eq!(nav.data().current_activity(), Some(b));
//!
//! let err = nav.navigate(NavigationCommand::Continue).unwrap_err();
//! assert_eq!(err.code(), Some(SequencingExceptionCode::SB_2_1__1));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod delivery;
mod error;
mod global;
mod navigator;
mod prerequisites;
mod rollup;
mod rules;
mod scorm12;
mod scorm2004;
mod session;
mod termination;
mod traversal;
mod tristate;
mod types;

pub use error::{SequencingError, SequencingExceptionCode};
pub use global::GlobalObjectiveStore;
pub use navigator::{Navigator, SeqNav, TocEntry};
pub use prerequisites::{
    PrerequisiteError, PrerequisiteExpr, ScriptPrerequisites, parse as parse_prerequisites,
};
pub use rules::{RuleEvaluator, default_rollup_rules};
pub use scorm12::Scorm12SeqNav;
pub use scorm2004::Scorm2004SeqNav;
pub use session::NavigatorData;
pub use traversal::apply_randomization;
pub use tristate::TriState;
pub use types::{
    ActivityDataStore, GlobalObjectiveMap, NavigationCommand, NoActivityStore, NoGlobalObjectives,
    NoLog, Prerequisites, ReadOnlyGlobals, SequencingEventType, SequencingLog, SequencingRequest,
    TerminationRequest, TracingLog, TraversalDirection,
};
