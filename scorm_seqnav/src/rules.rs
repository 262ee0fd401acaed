// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule evaluation: sequencing rules, rollup rules, and limit conditions.
//!
//! ## Overview
//!
//! [`RuleEvaluator`] is a read-only view over an [`ActivityTree`] and a
//! [`GlobalObjectiveMap`]. Every method reads the tracking state as it is at
//! call time; nothing is cached between calls.
//!
//! Conditions evaluate to a [`TriState`]. Conditions of one rule are folded
//! left to right with the rule's combination, the first condition seeding the
//! result. A rule fires only when the fold is exactly [`TriState::True`], and
//! the first firing rule in declaration order wins.
//!
//! A condition that references an objective the activity does not define is
//! an error ([`SequencingError::UnknownObjective`]), not a silent unknown.

use alloc::vec;
use alloc::vec::Vec;

use scorm_activity_tree::{
    ActivityId, ActivityTree, ChildActivitySet, ConditionCombination, ConditionOperator, Objective,
    RollupAction, RollupCondition, RollupConditionSpec, RollupConsideration, RollupRule,
    RuleCondition, SequencingCondition, SequencingRule, SequencingRuleAction,
};

use crate::error::SequencingError;
use crate::tristate::TriState;
use crate::types::GlobalObjectiveMap;

/// Read-only rule evaluation over one tree.
pub struct RuleEvaluator<'a, G> {
    tree: &'a ActivityTree,
    globals: &'a G,
}

impl<G> Clone for RuleEvaluator<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for RuleEvaluator<'_, G> {}

impl<G> core::fmt::Debug for RuleEvaluator<'_, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuleEvaluator")
            .field("tree", self.tree)
            .finish_non_exhaustive()
    }
}

impl<'a, G: GlobalObjectiveMap> RuleEvaluator<'a, G> {
    /// Evaluate rules against `tree`, reading shared objectives from `globals`.
    pub fn new(tree: &'a ActivityTree, globals: &'a G) -> Self {
        Self { tree, globals }
    }

    fn objective(
        &self,
        activity: ActivityId,
        id: Option<&str>,
    ) -> Result<&'a Objective, SequencingError> {
        let data = self.tree.get(activity).data();
        match id {
            None => Ok(data.primary_objective()),
            Some(id) => data
                .objective(id)
                .ok_or_else(|| SequencingError::UnknownObjective(id.into())),
        }
    }

    /// Satisfaction of an objective (the primary when `id` is `None`) as
    /// `(progress_status, satisfied_status)`.
    ///
    /// Objectives satisfied by measure only count while the activity is
    /// inactive, or while active when measure satisfaction is allowed then.
    /// When the local status is unknown on a tracked activity, the objective's
    /// read map is consulted.
    pub fn objective_satisfied_status(
        &self,
        activity: ActivityId,
        id: Option<&str>,
    ) -> Result<(bool, bool), SequencingError> {
        let node = self.tree.get(activity);
        let data = node.data();
        let objective = self.objective(activity, id)?;
        let def = objective.definition();
        let measure_counts = !data.is_active() || node.sequencing().measure_satisfaction_if_active();

        let (mut progress, mut satisfied) = if def.satisfied_by_measure {
            if measure_counts {
                (
                    objective.measure_status(),
                    objective.normalized_measure() >= def.min_normalized_measure,
                )
            } else {
                (false, false)
            }
        } else {
            (objective.progress_status(), objective.satisfied_status())
        };

        if !progress && data.tracked() {
            if def.satisfied_by_measure {
                if measure_counts && let Some(m) = self.read_global_measure(objective) {
                    progress = true;
                    satisfied = m >= def.min_normalized_measure;
                }
            } else if let Some(v) = self.read_global_satisfied(objective) {
                progress = true;
                satisfied = v;
            }
        }
        Ok((progress, satisfied))
    }

    /// Known normalized measure of an objective, falling back to its read map
    /// on tracked activities.
    pub fn objective_measure(
        &self,
        activity: ActivityId,
        id: Option<&str>,
    ) -> Result<Option<f64>, SequencingError> {
        let objective = self.objective(activity, id)?;
        Ok(self.known_measure(activity, objective))
    }

    fn known_measure(&self, activity: ActivityId, objective: &Objective) -> Option<f64> {
        if objective.measure_status() {
            Some(objective.normalized_measure())
        } else if self.tree.get(activity).data().tracked() {
            self.read_global_measure(objective)
        } else {
            None
        }
    }

    pub(crate) fn read_global_measure(&self, objective: &Objective) -> Option<f64> {
        objective
            .definition()
            .read_normalized_measure
            .as_deref()
            .and_then(|key| self.globals.read_normalized_measure(key))
    }

    pub(crate) fn read_global_satisfied(&self, objective: &Objective) -> Option<bool> {
        objective
            .definition()
            .read_satisfied_status
            .as_deref()
            .and_then(|key| self.globals.read_satisfied_status(key))
    }

    /// Evaluate one sequencing rule condition, applying its operator.
    pub fn evaluate_condition(
        &self,
        activity: ActivityId,
        condition: &SequencingCondition,
    ) -> Result<TriState, SequencingError> {
        let node = self.tree.get(activity);
        let data = node.data();
        let objective = condition.referenced_objective.as_deref();
        let value = match condition.condition {
            RuleCondition::Always => TriState::True,
            RuleCondition::Satisfied => {
                let (progress, satisfied) = self.objective_satisfied_status(activity, objective)?;
                TriState::known_if(progress, satisfied)
            }
            RuleCondition::ObjectiveStatusKnown => {
                TriState::from_bool(self.objective_satisfied_status(activity, objective)?.0)
            }
            RuleCondition::ObjectiveMeasureKnown => {
                TriState::from_bool(self.objective_measure(activity, objective)?.is_some())
            }
            RuleCondition::ObjectiveMeasureGreaterThan(threshold) => self
                .objective_measure(activity, objective)?
                .map(|m| m > threshold)
                .into(),
            RuleCondition::ObjectiveMeasureLessThan(threshold) => self
                .objective_measure(activity, objective)?
                .map(|m| m < threshold)
                .into(),
            RuleCondition::Completed => {
                TriState::known_if(data.attempt_progress_status(), data.attempt_completion_status())
            }
            RuleCondition::ActivityProgressKnown => TriState::from_bool(
                data.activity_progress_status() && data.attempt_progress_status(),
            ),
            RuleCondition::Attempted => TriState::from_bool(data.attempt_count() > 0),
            RuleCondition::AttemptLimitExceeded => TriState::from_bool(
                node.sequencing()
                    .attempt_limit
                    .is_some_and(|limit| data.attempt_count() >= limit),
            ),
            // Time-based conditions are not tracked.
            RuleCondition::OutsideAvailableTimeRange | RuleCondition::TimeLimitExceeded => {
                TriState::False
            }
        };
        Ok(apply_operator(value, condition.operator))
    }

    /// Fold a rule's conditions with its combination.
    pub fn evaluate_rule(
        &self,
        activity: ActivityId,
        rule: &SequencingRule,
    ) -> Result<TriState, SequencingError> {
        let mut folded = None;
        for condition in &rule.conditions {
            let value = self.evaluate_condition(activity, condition)?;
            folded = Some(combine(folded, value, rule.combination));
        }
        Ok(folded.unwrap_or_default())
    }

    /// Whether the first rule in `rules` requesting `action` fires.
    pub fn check_for_action(
        &self,
        activity: ActivityId,
        rules: &[SequencingRule],
        action: SequencingRuleAction,
    ) -> Result<bool, SequencingError> {
        for rule in rules.iter().filter(|r| r.action == action) {
            if self.evaluate_rule(activity, rule)?.is_true() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The action of the first rule in `rules` that fires.
    pub fn check_returning_action(
        &self,
        activity: ActivityId,
        rules: &[SequencingRule],
    ) -> Result<Option<SequencingRuleAction>, SequencingError> {
        for rule in rules {
            if self.evaluate_rule(activity, rule)?.is_true() {
                return Ok(Some(rule.action));
            }
        }
        Ok(None)
    }

    /// Precondition check for `action` on `activity`.
    pub(crate) fn precondition(
        &self,
        activity: ActivityId,
        action: SequencingRuleAction,
    ) -> Result<bool, SequencingError> {
        let rules = &self.tree.get(activity).sequencing().pre_condition_rules;
        self.check_for_action(activity, rules, action)
    }

    /// Whether the attempt limit of a tracked, inactive, unsuspended activity
    /// has been reached.
    pub fn limit_conditions_violated(&self, activity: ActivityId) -> bool {
        let node = self.tree.get(activity);
        let data = node.data();
        if !data.tracked() || data.is_active() || data.is_suspended() {
            return false;
        }
        node.sequencing()
            .attempt_limit
            .is_some_and(|limit| data.attempt_count() >= limit)
    }

    /// Whether `activity` is unavailable: disabled by a precondition rule or
    /// over its attempt limit.
    pub fn check_activity(&self, activity: ActivityId) -> Result<bool, SequencingError> {
        Ok(self.precondition(activity, SequencingRuleAction::Disabled)?
            || self.limit_conditions_violated(activity))
    }

    /// Whether the rollup rules of `activity` request `action`.
    ///
    /// Leaves never roll up. A cluster uses its own rules when it defines any
    /// rule of the same family (satisfaction or completion) as `action`,
    /// and the built-in defaults otherwise.
    pub fn rollup_rule_check(
        &self,
        activity: ActivityId,
        action: RollupAction,
    ) -> Result<bool, SequencingError> {
        let node = self.tree.get(activity);
        if node.is_leaf() {
            return Ok(false);
        }
        let own = &node.sequencing().rollup_rules;
        let defaults;
        let rules: &[RollupRule] = if own.iter().any(|r| r.action.same_family(action)) {
            own
        } else {
            defaults = default_rollup_rules();
            &defaults
        };

        for rule in rules.iter().filter(|r| r.action == action) {
            let mut contributing = Vec::new();
            for &child in node.children() {
                if self.tree.get(child).data().tracked()
                    && self.check_child_for_rollup(child, action)?
                {
                    contributing.push(self.evaluate_rollup_conditions(child, rule)?);
                }
            }
            if child_set_holds(rule.child_activity_set, &contributing) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `child` takes part in its parent's rollup for `action`.
    pub fn check_child_for_rollup(
        &self,
        child: ActivityId,
        action: RollupAction,
    ) -> Result<bool, SequencingError> {
        let node = self.tree.get(child);
        let seq = node.sequencing();
        let data = node.data();
        let (enabled, consideration) = match action {
            RollupAction::Satisfied => (seq.rollup_objective_satisfied(), seq.required_for_satisfied),
            RollupAction::NotSatisfied => {
                (seq.rollup_objective_satisfied(), seq.required_for_not_satisfied)
            }
            RollupAction::Completed => (seq.rollup_progress_completion(), seq.required_for_completed),
            RollupAction::Incomplete => {
                (seq.rollup_progress_completion(), seq.required_for_incomplete)
            }
        };
        if !enabled {
            return Ok(false);
        }
        Ok(match consideration {
            RollupConsideration::Always => true,
            RollupConsideration::IfNotSuspended => {
                !(data.attempt_count() > 0 && data.is_suspended())
            }
            RollupConsideration::IfAttempted => data.attempt_count() > 0,
            RollupConsideration::IfNotSkipped => {
                !self.precondition(child, SequencingRuleAction::Skip)?
            }
        })
    }

    fn evaluate_rollup_conditions(
        &self,
        child: ActivityId,
        rule: &RollupRule,
    ) -> Result<TriState, SequencingError> {
        let mut folded = None;
        for spec in &rule.conditions {
            let value = self.evaluate_rollup_condition(child, spec)?;
            folded = Some(combine(folded, value, rule.combination));
        }
        Ok(folded.unwrap_or_default())
    }

    fn evaluate_rollup_condition(
        &self,
        child: ActivityId,
        spec: &RollupConditionSpec,
    ) -> Result<TriState, SequencingError> {
        let node = self.tree.get(child);
        let data = node.data();
        let primary = data.primary_objective();
        let value = match spec.condition {
            RollupCondition::ActivityProgressKnown => {
                TriState::from_bool(data.attempt_progress_status())
            }
            RollupCondition::Attempted => TriState::from_bool(data.attempt_count() > 0),
            RollupCondition::AttemptLimitExceeded => TriState::from_bool(
                node.sequencing()
                    .attempt_limit
                    .is_some_and(|limit| data.attempt_count() >= limit),
            ),
            RollupCondition::Completed => {
                TriState::known_if(data.attempt_progress_status(), data.attempt_completion_status())
            }
            RollupCondition::ObjectiveMeasureKnown => TriState::from_bool(primary.measure_status()),
            RollupCondition::ObjectiveStatusKnown => TriState::from_bool(primary.progress_status()),
            RollupCondition::Satisfied => {
                let (progress, satisfied) = self.objective_satisfied_status(child, None)?;
                TriState::known_if(progress, satisfied)
            }
            RollupCondition::OutsideAvailableTimeRange | RollupCondition::TimeLimitExceeded => {
                TriState::False
            }
        };
        Ok(apply_operator(value, spec.operator))
    }
}

fn apply_operator(value: TriState, operator: ConditionOperator) -> TriState {
    match operator {
        ConditionOperator::NoOp => value,
        ConditionOperator::Not => value.negate(),
    }
}

fn combine(folded: Option<TriState>, value: TriState, combination: ConditionCombination) -> TriState {
    match (folded, combination) {
        (None, _) => value,
        (Some(acc), ConditionCombination::All) => acc.and(value),
        (Some(acc), ConditionCombination::Any) => acc.or(value),
    }
}

fn child_set_holds(set: ChildActivitySet, contributing: &[TriState]) -> bool {
    let count = contributing.iter().filter(|v| v.is_true()).count();
    match set {
        ChildActivitySet::All => count == contributing.len(),
        ChildActivitySet::Any => count > 0,
        ChildActivitySet::None => contributing.iter().all(|v| *v == TriState::False),
        ChildActivitySet::AtLeastCount(min) => count >= min as usize,
        ChildActivitySet::AtLeastPercent(min) => {
            #[allow(
                clippy::cast_precision_loss,
                reason = "child counts are far below 2^52."
            )]
            let percent = if contributing.is_empty() {
                0.0
            } else {
                count as f64 / contributing.len() as f64
            };
            percent >= min
        }
    }
}

/// Rollup rules used by clusters that define none for a family.
///
/// - every child completed: completed
/// - every child attempted or not completed: incomplete
/// - every child satisfied: satisfied
/// - every child attempted or not satisfied: not satisfied
///
/// Completion is checked after incompleteness and satisfaction after
/// non-satisfaction, so the positive outcome wins a tie.
pub fn default_rollup_rules() -> Vec<RollupRule> {
    vec![
        RollupRule::new(
            ChildActivitySet::All,
            [RollupConditionSpec::new(RollupCondition::Completed)],
            RollupAction::Completed,
        )
        .with_combination(ConditionCombination::All),
        RollupRule::new(
            ChildActivitySet::All,
            [
                RollupConditionSpec::new(RollupCondition::Attempted),
                RollupConditionSpec::not(RollupCondition::Completed),
            ],
            RollupAction::Incomplete,
        ),
        RollupRule::new(
            ChildActivitySet::All,
            [RollupConditionSpec::new(RollupCondition::Satisfied)],
            RollupAction::Satisfied,
        )
        .with_combination(ConditionCombination::All),
        RollupRule::new(
            ChildActivitySet::All,
            [
                RollupConditionSpec::new(RollupCondition::Attempted),
                RollupConditionSpec::not(RollupCondition::Satisfied),
            ],
            RollupAction::NotSatisfied,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoGlobalObjectives;
    use crate::GlobalObjectiveStore;
    use scorm_activity_tree::{
        ActivitySpec, CompletionStatus, ObjectiveDefinition, Sequencing, SuccessStatus,
    };

    fn rule(conditions: Vec<SequencingCondition>, action: SequencingRuleAction) -> SequencingRule {
        SequencingRule::new(conditions, action)
    }

    fn leaf_with(seq: Sequencing) -> ActivityTree {
        ActivityTree::new(ActivitySpec::leaf("a").with_sequencing(seq)).unwrap()
    }

    #[test]
    fn empty_rule_never_fires() {
        let tree = leaf_with(Sequencing::default());
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        let r = rule(vec![], SequencingRuleAction::Skip);
        assert_eq!(ev.evaluate_rule(tree.root(), &r).unwrap(), TriState::Unknown);
        assert!(!ev.check_for_action(tree.root(), &[r], SequencingRuleAction::Skip).unwrap());
    }

    #[test]
    fn unknown_conditions_do_not_fire() {
        let tree = leaf_with(Sequencing::default());
        let root = tree.root();
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        let satisfied = SequencingCondition::new(RuleCondition::Satisfied);
        assert_eq!(ev.evaluate_condition(root, &satisfied).unwrap(), TriState::Unknown);
        let not_satisfied = SequencingCondition::not(RuleCondition::Satisfied);
        assert_eq!(ev.evaluate_condition(root, &not_satisfied).unwrap(), TriState::Unknown);
        // Unknown OR true is true.
        let r = rule(
            vec![satisfied, SequencingCondition::new(RuleCondition::Always)],
            SequencingRuleAction::Disabled,
        )
        .with_combination(ConditionCombination::Any);
        assert!(ev.check_for_action(root, &[r], SequencingRuleAction::Disabled).unwrap());
    }

    // Only the first matching rule decides.
    #[test]
    fn first_match_wins() {
        let tree = leaf_with(Sequencing::default());
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        let rules = [
            rule(
                vec![SequencingCondition::new(RuleCondition::Always)],
                SequencingRuleAction::Retry,
            ),
            rule(
                vec![SequencingCondition::new(RuleCondition::Always)],
                SequencingRuleAction::ExitAll,
            ),
        ];
        assert_eq!(
            ev.check_returning_action(tree.root(), &rules).unwrap(),
            Some(SequencingRuleAction::Retry)
        );
    }

    #[test]
    fn missing_objective_is_an_error() {
        let tree = leaf_with(Sequencing::default());
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        let c = SequencingCondition::new(RuleCondition::Satisfied).on_objective("nope");
        assert_eq!(
            ev.evaluate_condition(tree.root(), &c),
            Err(SequencingError::UnknownObjective("nope".into()))
        );
    }

    #[test]
    fn measure_thresholds() {
        let mut tree = leaf_with(Sequencing::default());
        let root = tree.root();
        tree.advanced_access(root)
            .primary_objective_mut()
            .set_scaled_score(Some(0.6));
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        let gt = SequencingCondition::new(RuleCondition::ObjectiveMeasureGreaterThan(0.5));
        let lt = SequencingCondition::new(RuleCondition::ObjectiveMeasureLessThan(0.5));
        assert_eq!(ev.evaluate_condition(root, &gt).unwrap(), TriState::True);
        assert_eq!(ev.evaluate_condition(root, &lt).unwrap(), TriState::False);
    }

    #[test]
    fn global_read_fills_unknown_satisfaction() {
        let seq = Sequencing {
            primary_objective: Some(ObjectiveDefinition {
                read_satisfied_status: Some("shared".into()),
                ..ObjectiveDefinition::named("p")
            }),
            ..Sequencing::default()
        };
        let mut tree = leaf_with(seq);
        let root = tree.root();
        let mut globals = GlobalObjectiveStore::new();
        globals.set_satisfied_status("shared", Some(true));
        let ev = RuleEvaluator::new(&tree, &globals);
        assert_eq!(ev.objective_satisfied_status(root, None).unwrap(), (true, true));

        // A locally known value wins.
        tree.advanced_access(root)
            .primary_objective_mut()
            .set_success_status(SuccessStatus::Failed);
        let ev = RuleEvaluator::new(&tree, &globals);
        assert_eq!(ev.objective_satisfied_status(root, None).unwrap(), (true, false));
    }

    #[test]
    fn satisfied_by_measure_waits_for_inactive() {
        let seq = Sequencing {
            primary_objective: Some(ObjectiveDefinition {
                satisfied_by_measure: true,
                min_normalized_measure: 0.8,
                ..ObjectiveDefinition::default()
            }),
            ..Sequencing::default()
        }
        .with_rollup_controls(
            scorm_activity_tree::RollupControls::MEASURE_SATISFACTION_IF_ACTIVE,
            false,
        );
        let mut tree = leaf_with(seq);
        let root = tree.root();
        {
            let mut t = tree.advanced_access(root);
            t.primary_objective_mut().set_scaled_score(Some(0.9));
            t.set_active(true);
        }
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert_eq!(ev.objective_satisfied_status(root, None).unwrap(), (false, false));
        tree.advanced_access(root).set_active(false);
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert_eq!(ev.objective_satisfied_status(root, None).unwrap(), (true, true));
    }

    #[test]
    fn limit_conditions() {
        let seq = Sequencing {
            attempt_limit: Some(1),
            ..Sequencing::default()
        };
        let mut tree = leaf_with(seq);
        let root = tree.root();
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert!(!ev.limit_conditions_violated(root));
        tree.advanced_access(root).set_attempt_count(1);
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert!(ev.limit_conditions_violated(root));
        assert!(ev.check_activity(root).unwrap());
        tree.advanced_access(root).set_active(true);
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert!(!ev.limit_conditions_violated(root));
    }

    #[test]
    fn leaves_never_roll_up() {
        let seq = Sequencing {
            rollup_rules: vec![RollupRule::new(
                ChildActivitySet::All,
                Vec::new(),
                RollupAction::Completed,
            )],
            ..Sequencing::default()
        };
        let tree = leaf_with(seq);
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        for action in [
            RollupAction::Satisfied,
            RollupAction::NotSatisfied,
            RollupAction::Completed,
            RollupAction::Incomplete,
        ] {
            assert!(!ev.rollup_rule_check(tree.root(), action).unwrap());
        }
    }

    #[test]
    fn child_sets() {
        use TriState::{False, True, Unknown};
        assert!(child_set_holds(ChildActivitySet::All, &[]));
        assert!(!child_set_holds(ChildActivitySet::All, &[True, Unknown]));
        assert!(child_set_holds(ChildActivitySet::Any, &[False, True]));
        assert!(!child_set_holds(ChildActivitySet::None, &[False, Unknown]));
        assert!(child_set_holds(ChildActivitySet::None, &[False, False]));
        assert!(child_set_holds(ChildActivitySet::AtLeastCount(2), &[True, False, True]));
        assert!(!child_set_holds(ChildActivitySet::AtLeastPercent(0.5), &[]));
        assert!(child_set_holds(ChildActivitySet::AtLeastPercent(0.5), &[True, False]));
    }

    // A custom Satisfied rule replaces the default NotSatisfied rule too.
    #[test]
    fn defaults_are_replaced_per_family() {
        let seq = Sequencing {
            rollup_rules: vec![RollupRule::new(
                ChildActivitySet::Any,
                [RollupConditionSpec::new(RollupCondition::Attempted)],
                RollupAction::Satisfied,
            )],
            ..Sequencing::default()
        };
        let mut tree = ActivityTree::new(ActivitySpec::cluster("p").with_sequencing(seq)).unwrap();
        let root = tree.root();
        let child = tree.insert(root, ActivitySpec::leaf("c")).unwrap();
        {
            let mut t = tree.advanced_access(child);
            t.set_attempt_count(1);
            t.set_completion_status(CompletionStatus::Completed);
            t.primary_objective_mut()
                .set_success_status(SuccessStatus::Failed);
        }
        let ev = RuleEvaluator::new(&tree, &NoGlobalObjectives);
        assert!(ev.rollup_rule_check(root, RollupAction::Satisfied).unwrap());
        // The default NotSatisfied rule would fire here; the family is overridden.
        assert!(!ev.rollup_rule_check(root, RollupAction::NotSatisfied).unwrap());
        // Completion still uses defaults.
        assert!(ev.rollup_rule_check(root, RollupAction::Completed).unwrap());
    }
}
