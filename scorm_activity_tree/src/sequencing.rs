// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static sequencing configuration: control modes, limits, objectives, and rule definitions.
//!
//! ## Overview
//!
//! A [`Sequencing`] value is attached to every activity when the tree is built.
//! It is read-mostly: the engine reads it on every request and never caches
//! anything derived from it across mutations of the tracking state.
//!
//! Rules come in two families:
//! - [`SequencingRule`]: precondition, exit-condition, and postcondition rules,
//!   each a list of [`SequencingCondition`]s combined with a
//!   [`ConditionCombination`] and an action.
//! - [`RollupRule`]: conditions evaluated per child, aggregated over the
//!   children with a [`ChildActivitySet`].
//!
//! Rules are evaluated in declaration order and the first one that fires wins.

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::{
    ControlModes, DeliveryControls, RandomizationTiming, RollupConsideration, RollupControls,
};

/// Per-activity sequencing configuration.
///
/// [`Default`] yields the SCORM defaults: choice and choice-exit allowed, flow
/// disabled, tracked, contributing to both rollups, no limits and no rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequencing {
    /// Control modes for this cluster's children and attempt-reset behaviour.
    pub control_modes: ControlModes,
    /// Tracking and content-reporting controls.
    pub delivery_controls: DeliveryControls,
    /// How this activity contributes to its parent's rollup.
    pub rollup_controls: RollupControls,
    /// Participation in the parent's Satisfied rollup.
    pub required_for_satisfied: RollupConsideration,
    /// Participation in the parent's Not Satisfied rollup.
    pub required_for_not_satisfied: RollupConsideration,
    /// Participation in the parent's Completed rollup.
    pub required_for_completed: RollupConsideration,
    /// Participation in the parent's Incomplete rollup.
    pub required_for_incomplete: RollupConsideration,
    /// Maximum number of attempts, if limited.
    pub attempt_limit: Option<u32>,
    /// When the children of this cluster are reordered.
    pub randomization_timing: RandomizationTiming,
    /// Whether the children of this cluster may be reordered at all.
    pub reorder_children: bool,
    /// When a subset of the children is selected.
    pub selection_timing: RandomizationTiming,
    /// How many children are selected, if selection applies.
    pub selection_count: Option<u32>,
    /// Weight of this activity's measure in the parent's measure rollup.
    pub objective_measure_weight: f64,
    /// Primary objective definition; an implicit one is used when absent.
    pub primary_objective: Option<ObjectiveDefinition>,
    /// Additional named objectives.
    pub objectives: Vec<ObjectiveDefinition>,
    /// Rules checked before delivery and during traversal.
    pub pre_condition_rules: Vec<SequencingRule>,
    /// Rules checked after an attempt ends.
    pub post_condition_rules: Vec<SequencingRule>,
    /// Rules checked on ancestors when a descendant's attempt ends.
    pub exit_condition_rules: Vec<SequencingRule>,
    /// Rollup rules for this cluster.
    pub rollup_rules: Vec<RollupRule>,
}

impl Default for Sequencing {
    fn default() -> Self {
        Self {
            control_modes: ControlModes::default(),
            delivery_controls: DeliveryControls::default(),
            rollup_controls: RollupControls::default(),
            required_for_satisfied: RollupConsideration::Always,
            required_for_not_satisfied: RollupConsideration::Always,
            required_for_completed: RollupConsideration::Always,
            required_for_incomplete: RollupConsideration::Always,
            attempt_limit: None,
            randomization_timing: RandomizationTiming::Never,
            reorder_children: false,
            selection_timing: RandomizationTiming::Never,
            selection_count: None,
            objective_measure_weight: 1.0,
            primary_objective: None,
            objectives: Vec::new(),
            pre_condition_rules: Vec::new(),
            post_condition_rules: Vec::new(),
            exit_condition_rules: Vec::new(),
            rollup_rules: Vec::new(),
        }
    }
}

impl Sequencing {
    /// Children may be targeted by Choose.
    pub fn choice(&self) -> bool {
        self.control_modes.contains(ControlModes::CHOICE)
    }

    /// An active child may be exited by a Choose elsewhere.
    pub fn choice_exit(&self) -> bool {
        self.control_modes.contains(ControlModes::CHOICE_EXIT)
    }

    /// Children may be walked with Continue/Previous.
    pub fn flow(&self) -> bool {
        self.control_modes.contains(ControlModes::FLOW)
    }

    /// Previous is refused within this cluster.
    pub fn forward_only(&self) -> bool {
        self.control_modes.contains(ControlModes::FORWARD_ONLY)
    }

    /// Choice into this cluster is constrained.
    pub fn constrain_choice(&self) -> bool {
        self.control_modes.contains(ControlModes::CONSTRAIN_CHOICE)
    }

    /// Choice may not activate inactive descendants.
    pub fn prevent_activation(&self) -> bool {
        self.control_modes.contains(ControlModes::PREVENT_ACTIVATION)
    }

    /// Reset objective info when a new attempt begins.
    pub fn use_current_attempt_objective_info(&self) -> bool {
        self.control_modes
            .contains(ControlModes::USE_CURRENT_ATTEMPT_OBJECTIVE_INFO)
    }

    /// Reset progress info when a new attempt begins.
    pub fn use_current_attempt_progress_info(&self) -> bool {
        self.control_modes
            .contains(ControlModes::USE_CURRENT_ATTEMPT_PROGRESS_INFO)
    }

    /// Tracking state is kept for this activity.
    pub fn tracked(&self) -> bool {
        self.delivery_controls.contains(DeliveryControls::TRACKED)
    }

    /// Content reports its own completion.
    pub fn completion_set_by_content(&self) -> bool {
        self.delivery_controls
            .contains(DeliveryControls::COMPLETION_SET_BY_CONTENT)
    }

    /// Content reports its own objective success.
    pub fn objective_set_by_content(&self) -> bool {
        self.delivery_controls
            .contains(DeliveryControls::OBJECTIVE_SET_BY_CONTENT)
    }

    /// Contributes to the parent's satisfaction rollup.
    pub fn rollup_objective_satisfied(&self) -> bool {
        self.rollup_controls
            .contains(RollupControls::ROLLUP_OBJECTIVE_SATISFIED)
    }

    /// Contributes to the parent's completion rollup.
    pub fn rollup_progress_completion(&self) -> bool {
        self.rollup_controls
            .contains(RollupControls::ROLLUP_PROGRESS_COMPLETION)
    }

    /// Measure-based satisfaction applies while active.
    pub fn measure_satisfaction_if_active(&self) -> bool {
        self.rollup_controls
            .contains(RollupControls::MEASURE_SATISFACTION_IF_ACTIVE)
    }

    /// Builder-style helper: set or clear control modes.
    pub fn with_control_modes(mut self, modes: ControlModes, enabled: bool) -> Self {
        self.control_modes.set(modes, enabled);
        self
    }

    /// Builder-style helper: set or clear delivery controls.
    pub fn with_delivery_controls(mut self, controls: DeliveryControls, enabled: bool) -> Self {
        self.delivery_controls.set(controls, enabled);
        self
    }

    /// Builder-style helper: set or clear rollup controls.
    pub fn with_rollup_controls(mut self, controls: RollupControls, enabled: bool) -> Self {
        self.rollup_controls.set(controls, enabled);
        self
    }
}

/// Static definition of an objective, as read from the manifest.
///
/// Tracking state for the objective lives in
/// [`Objective`](crate::data_model::Objective); it is recreated from this
/// definition at the start of every attempt.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveDefinition {
    /// Objective identifier. The primary objective may be anonymous.
    pub id: Option<String>,
    /// Satisfaction is derived from the normalized measure.
    pub satisfied_by_measure: bool,
    /// Threshold for measure-based satisfaction.
    pub min_normalized_measure: f64,
    /// Global objective read for satisfied status.
    pub read_satisfied_status: Option<String>,
    /// Global objective read for normalized measure.
    pub read_normalized_measure: Option<String>,
    /// Global objectives written with this objective's satisfied status.
    pub write_satisfied_status: Vec<String>,
    /// Global objectives written with this objective's normalized measure.
    pub write_normalized_measure: Vec<String>,
}

impl Default for ObjectiveDefinition {
    fn default() -> Self {
        Self {
            id: None,
            satisfied_by_measure: false,
            min_normalized_measure: 1.0,
            read_satisfied_status: None,
            read_normalized_measure: None,
            write_satisfied_status: Vec::new(),
            write_normalized_measure: Vec::new(),
        }
    }
}

impl ObjectiveDefinition {
    /// Create a definition with the given identifier and SCORM defaults.
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Whether this objective writes to any global objective.
    pub fn has_write_maps(&self) -> bool {
        !self.write_satisfied_status.is_empty() || !self.write_normalized_measure.is_empty()
    }
}

/// How the conditions of a rule are combined.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConditionCombination {
    /// Every condition must hold (three-valued AND).
    All,
    /// At least one condition must hold (three-valued OR).
    Any,
}

/// Condition operator applied to a single condition result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Use the result as is.
    #[default]
    NoOp,
    /// Invert a known result; unknown stays unknown.
    Not,
}

/// Conditions available to sequencing rules.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RuleCondition {
    /// Always true.
    Always,
    /// The referenced objective is satisfied.
    Satisfied,
    /// The referenced objective's satisfaction is known.
    ObjectiveStatusKnown,
    /// The referenced objective's measure is known.
    ObjectiveMeasureKnown,
    /// The referenced objective's measure is greater than the threshold.
    ObjectiveMeasureGreaterThan(f64),
    /// The referenced objective's measure is less than the threshold.
    ObjectiveMeasureLessThan(f64),
    /// The current attempt is completed.
    Completed,
    /// Activity and attempt progress are both known.
    ActivityProgressKnown,
    /// The activity has been attempted.
    Attempted,
    /// The attempt limit has been reached.
    AttemptLimitExceeded,
    /// Time range conditions; not supported, always false.
    OutsideAvailableTimeRange,
    /// Time limit conditions; not supported, always false.
    TimeLimitExceeded,
}

/// A single condition of a [`SequencingRule`].
#[derive(Clone, Debug, PartialEq)]
pub struct SequencingCondition {
    /// What to test.
    pub condition: RuleCondition,
    /// Optional inversion.
    pub operator: ConditionOperator,
    /// Objective to test; the primary objective when `None`.
    pub referenced_objective: Option<String>,
}

impl SequencingCondition {
    /// A condition on the primary objective with no operator.
    pub fn new(condition: RuleCondition) -> Self {
        Self {
            condition,
            operator: ConditionOperator::NoOp,
            referenced_objective: None,
        }
    }

    /// The inverted form of [`SequencingCondition::new`].
    pub fn not(condition: RuleCondition) -> Self {
        Self {
            operator: ConditionOperator::Not,
            ..Self::new(condition)
        }
    }

    /// Reference a named objective instead of the primary one.
    pub fn on_objective(mut self, id: impl Into<String>) -> Self {
        self.referenced_objective = Some(id.into());
        self
    }
}

/// Actions a sequencing rule may request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequencingRuleAction {
    /// Precondition: skip during flow.
    Skip,
    /// Precondition: the activity cannot be delivered.
    Disabled,
    /// Precondition: the activity is not offered for choice.
    HiddenFromChoice,
    /// Precondition: forward traversal stops here.
    StopForwardTraversal,
    /// Exit condition: end the attempt on this activity.
    Exit,
    /// Postcondition: exit the parent.
    ExitParent,
    /// Postcondition: exit the whole tree.
    ExitAll,
    /// Postcondition: retry this activity.
    Retry,
    /// Postcondition: retry from the root.
    RetryAll,
    /// Postcondition: continue.
    Continue,
    /// Postcondition: go to the previous activity.
    Previous,
}

/// A sequencing rule: conditions, a combination, and an action.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencingRule {
    /// Conditions, in declaration order.
    pub conditions: Vec<SequencingCondition>,
    /// How the conditions are combined.
    pub combination: ConditionCombination,
    /// Action requested when the rule fires.
    pub action: SequencingRuleAction,
}

impl SequencingRule {
    /// A rule combining `conditions` with `All`.
    pub fn new(
        conditions: impl IntoIterator<Item = SequencingCondition>,
        action: SequencingRuleAction,
    ) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
            combination: ConditionCombination::All,
            action,
        }
    }

    /// Change the combination of this rule.
    pub fn with_combination(mut self, combination: ConditionCombination) -> Self {
        self.combination = combination;
        self
    }
}

/// Conditions available to rollup rules. All refer to the child's primary objective.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RollupCondition {
    /// The child is satisfied.
    Satisfied,
    /// The child's satisfaction is known.
    ObjectiveStatusKnown,
    /// The child's measure is known.
    ObjectiveMeasureKnown,
    /// The child's current attempt is completed.
    Completed,
    /// The child's attempt progress is known.
    ActivityProgressKnown,
    /// The child has been attempted.
    Attempted,
    /// The child's attempt limit has been reached.
    AttemptLimitExceeded,
    /// Not supported, always false.
    TimeLimitExceeded,
    /// Not supported, always false.
    OutsideAvailableTimeRange,
}

/// A single condition of a [`RollupRule`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RollupConditionSpec {
    /// What to test on each child.
    pub condition: RollupCondition,
    /// Optional inversion.
    pub operator: ConditionOperator,
}

impl RollupConditionSpec {
    /// A condition with no operator.
    pub const fn new(condition: RollupCondition) -> Self {
        Self {
            condition,
            operator: ConditionOperator::NoOp,
        }
    }

    /// An inverted condition.
    pub const fn not(condition: RollupCondition) -> Self {
        Self {
            condition,
            operator: ConditionOperator::Not,
        }
    }
}

/// Which children must satisfy a rollup rule's conditions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ChildActivitySet {
    /// Every contributing child.
    All,
    /// At least one contributing child.
    Any,
    /// No contributing child (neither true nor unknown).
    None,
    /// At least this many contributing children.
    AtLeastCount(u32),
    /// At least this fraction (0..=1) of contributing children.
    AtLeastPercent(f64),
}

/// Rollup actions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RollupAction {
    /// The cluster is satisfied.
    Satisfied,
    /// The cluster is not satisfied.
    NotSatisfied,
    /// The cluster is completed.
    Completed,
    /// The cluster is incomplete.
    Incomplete,
}

impl RollupAction {
    /// Whether `self` and `other` belong to the same family
    /// (satisfaction or completion).
    pub fn same_family(self, other: Self) -> bool {
        self.is_satisfaction() == other.is_satisfaction()
    }

    /// Satisfied or NotSatisfied.
    pub fn is_satisfaction(self) -> bool {
        matches!(self, Self::Satisfied | Self::NotSatisfied)
    }
}

/// A rollup rule.
#[derive(Clone, Debug, PartialEq)]
pub struct RollupRule {
    /// Conditions tested against each contributing child.
    pub conditions: Vec<RollupConditionSpec>,
    /// How the conditions are combined per child.
    pub combination: ConditionCombination,
    /// Aggregation over the children.
    pub child_activity_set: ChildActivitySet,
    /// Action applied to the cluster when the rule fires.
    pub action: RollupAction,
}

impl RollupRule {
    /// A rule combining `conditions` with `Any`, the rollup default.
    pub fn new(
        child_activity_set: ChildActivitySet,
        conditions: impl IntoIterator<Item = RollupConditionSpec>,
        action: RollupAction,
    ) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
            combination: ConditionCombination::Any,
            child_activity_set,
            action,
        }
    }

    /// Change the combination of this rule.
    pub fn with_combination(mut self, combination: ConditionCombination) -> Self {
        self.combination = combination;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scorm_defaults() {
        let s = Sequencing::default();
        assert!(s.choice());
        assert!(s.choice_exit());
        assert!(!s.flow());
        assert!(s.tracked());
        assert!(s.rollup_objective_satisfied());
        assert!(s.rollup_progress_completion());
        assert!(s.measure_satisfaction_if_active());
        assert!(s.use_current_attempt_objective_info());
        assert_eq!(s.objective_measure_weight, 1.0);
        assert_eq!(ObjectiveDefinition::default().min_normalized_measure, 1.0);
    }

    #[test]
    fn builder_helpers_toggle_flags() {
        let s = Sequencing::default()
            .with_control_modes(ControlModes::FLOW | ControlModes::FORWARD_ONLY, true)
            .with_control_modes(ControlModes::CHOICE, false)
            .with_delivery_controls(DeliveryControls::TRACKED, false);
        assert!(s.flow());
        assert!(s.forward_only());
        assert!(!s.choice());
        assert!(!s.tracked());
    }

    #[test]
    fn rollup_action_families() {
        assert!(RollupAction::Satisfied.same_family(RollupAction::NotSatisfied));
        assert!(RollupAction::Completed.same_family(RollupAction::Incomplete));
        assert!(!RollupAction::Completed.same_family(RollupAction::Satisfied));
    }
}
