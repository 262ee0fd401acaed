// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SCORM Activity Tree: the data structure a sequencing engine runs over.
//!
//! An activity tree is the parsed organization of a content package: clusters
//! that group activities and leaves that launch content. Every activity carries
//! static [`Sequencing`] configuration and mutable [`DataModel`] tracking state.
//!
//! - Activities live in an arena and are addressed by copyable [`ActivityId`] handles.
//!   Parent, children, sibling, and preorder relationships are all index lookups.
//! - The shape is fixed before a session starts. Children are reordered only by
//!   explicit randomization ([`ActivityTree::assign_random_placement`]).
//! - Tracking state is read through [`Activity::data`] and written only through
//!   a capability view: [`TrackingMut`] for the engine and persistence,
//!   [`ContentWrites`] for delivered content.
//!
//! ## Not a manifest parser
//!
//! This crate does not read `imsmanifest.xml`. Upstream code builds
//! [`ActivitySpec`] values from whatever parser it uses and inserts them.
//!
//! ## API overview
//!
//! - [`ActivityTree`]: arena, tree-order queries, write views.
//! - [`ActivitySpec`]: per-activity input (key, resource, sequencing).
//! - [`Sequencing`]: control modes, limits, objectives, rules.
//! - [`DataModel`] / [`Objective`]: tracking state.
//!
//! ### Minimal usage
//!
//! ```
//! use scorm_activity_tree::{ActivitySpec, ActivityTree, ControlModes, Sequencing};
//!
//! let course = Sequencing::default().with_control_modes(ControlModes::FLOW, true);
//! let mut tree = ActivityTree::new(ActivitySpec::cluster("course").with_sequencing(course)).unwrap();
//! let root = tree.root();
//! let intro = tree.insert(root, ActivitySpec::leaf("intro")).unwrap();
//! let quiz = tree.insert(root, ActivitySpec::leaf("quiz")).unwrap();
//!
//! assert_eq!(tree.next_sibling(intro), Some(quiz));
//! assert!(tree.is_last_activity_in_tree(quiz));
//! assert_eq!(tree.preorder().count(), 3);
//! assert!(tree[root].sequencing().flow());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod data_model;
mod error;
mod sequencing;
mod tree;
mod types;

pub use data_model::{
    CompletionStatus, ContentNavigationRequest, ContentWrites, DataModel, EntryMode, ExitMode,
    LessonStatus, Objective, Score, SuccessStatus, TrackingMut,
};
pub use error::TreeError;
pub use sequencing::{
    ChildActivitySet, ConditionCombination, ConditionOperator, ObjectiveDefinition,
    RollupAction, RollupCondition, RollupConditionSpec, RollupRule, RuleCondition, Sequencing,
    SequencingCondition, SequencingRule, SequencingRuleAction,
};
pub use tree::{Activity, ActivitySpec, ActivityTree, Ancestors, Preorder};
pub use types::{
    ActivityId, ControlModes, DeliveryControls, PackageFormat, RandomizationTiming,
    RollupConsideration, RollupControls,
};
