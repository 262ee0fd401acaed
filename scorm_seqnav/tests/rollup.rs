// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rollup driven through navigation, and shared objectives.

use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{
    ActivitySpec, ActivityTree, ChildActivitySet, CompletionStatus, ControlModes,
    DeliveryControls, ObjectiveDefinition, RollupAction, RollupCondition, RollupConditionSpec,
    RollupRule, Sequencing, SuccessStatus,
};
use scorm_seqnav::{
    GlobalObjectiveMap, GlobalObjectiveStore, NavigationCommand, Navigator, NavigatorData,
    NoActivityStore, NoGlobalObjectives, NoLog, Scorm2004SeqNav,
};

fn flowing() -> Sequencing {
    Sequencing::default().with_control_modes(ControlModes::FLOW, true)
}

fn navigator<G: GlobalObjectiveMap + Default>(
    tree: ActivityTree,
) -> Navigator<Scorm2004SeqNav<StdRng>, G, NoActivityStore, NoLog> {
    Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(11)),
    )
}

#[test]
fn all_children_completed_completes_the_parent() {
    let parent = Sequencing {
        rollup_rules: vec![
            RollupRule::new(
                ChildActivitySet::All,
                [RollupConditionSpec::new(RollupCondition::Completed)],
                RollupAction::Completed,
            ),
        ],
        ..flowing()
    };
    let mut tree = ActivityTree::new(ActivitySpec::cluster("p").with_sequencing(parent)).unwrap();
    let p = tree.root();
    let a = tree.insert(p, ActivitySpec::leaf("a")).unwrap();
    let b = tree.insert(p, ActivitySpec::leaf("b")).unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    nav.navigate(NavigationCommand::Continue).unwrap();
    assert_eq!(
        nav.tree()[a].data().completion_status(),
        CompletionStatus::Completed
    );
    assert_ne!(
        nav.tree()[p].data().completion_status(),
        CompletionStatus::Completed,
        "b has not been completed yet"
    );
    assert_eq!(nav.data().completion_status(), CompletionStatus::Unknown);

    assert!(nav.navigate(NavigationCommand::ExitAll).unwrap());
    assert_eq!(
        nav.tree()[b].data().completion_status(),
        CompletionStatus::Completed
    );
    assert_eq!(
        nav.tree()[p].data().completion_status(),
        CompletionStatus::Completed
    );
    assert_eq!(
        nav.data().completion_status(),
        CompletionStatus::Completed,
        "root status is mirrored into the session"
    );

    // Rolling up again changes nothing.
    nav.rollup(p).unwrap();
    assert_eq!(
        nav.tree()[p].data().completion_status(),
        CompletionStatus::Completed
    );
}

#[test]
fn default_rules_roll_up_success_and_completion() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    tree.insert(root, ActivitySpec::leaf("a")).unwrap();
    tree.insert(root, ActivitySpec::leaf("b")).unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    nav.navigate(NavigationCommand::Continue).unwrap();
    assert_eq!(nav.data().success_status(), SuccessStatus::Unknown);

    nav.navigate(NavigationCommand::ExitAll).unwrap();
    assert_eq!(nav.data().success_status(), SuccessStatus::Passed);
    assert_eq!(nav.data().completion_status(), CompletionStatus::Completed);
}

#[test]
fn failed_child_fails_the_parent() {
    let reporting = Sequencing::default()
        .with_delivery_controls(DeliveryControls::OBJECTIVE_SET_BY_CONTENT, true);
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let a = tree
        .insert(root, ActivitySpec::leaf("a").with_sequencing(reporting))
        .unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    nav.data_mut()
        .content_writes(a)
        .unwrap()
        .set_success_status(SuccessStatus::Failed);
    nav.navigate(NavigationCommand::ExitAll).unwrap();

    assert_eq!(
        nav.tree()[a].data().primary_objective().success_status(),
        SuccessStatus::Failed
    );
    assert_eq!(nav.data().success_status(), SuccessStatus::Failed);
}

#[test]
fn weighted_measure_rollup() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let a = tree.insert(root, ActivitySpec::leaf("a")).unwrap();
    let heavy = Sequencing {
        objective_measure_weight: 3.0,
        ..Sequencing::default()
    };
    let b = tree
        .insert(root, ActivitySpec::leaf("b").with_sequencing(heavy))
        .unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    nav.data_mut()
        .content_writes(a)
        .unwrap()
        .set_score_scaled(Some(1.0))
        .unwrap();
    nav.navigate(NavigationCommand::Continue).unwrap();
    // b has no measure yet but still counts toward the weight.
    let after_a = nav.tree()[root].data().primary_objective().normalized_measure();
    assert!((after_a - 0.25).abs() < 1e-9, "got {after_a}");

    nav.data_mut()
        .content_writes(b)
        .unwrap()
        .set_score_scaled(Some(0.2))
        .unwrap();
    nav.navigate(NavigationCommand::ExitAll).unwrap();
    let measure = nav.tree()[root].data().primary_objective().normalized_measure();
    assert!((measure - 0.4).abs() < 1e-9, "got {measure}");
    let points = nav.data().total_points().unwrap();
    assert!((points - 40.0).abs() < 1e-6, "got {points}");
}

#[test]
fn satisfied_by_measure_on_the_root() {
    let root_seq = Sequencing {
        primary_objective: Some(ObjectiveDefinition {
            satisfied_by_measure: true,
            min_normalized_measure: 0.6,
            ..ObjectiveDefinition::default()
        }),
        ..flowing()
    };
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(root_seq)).unwrap();
    let root = tree.root();
    let a = tree.insert(root, ActivitySpec::leaf("a")).unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    nav.data_mut()
        .content_writes(a)
        .unwrap()
        .set_score_scaled(Some(0.5))
        .unwrap();
    nav.navigate(NavigationCommand::ExitAll).unwrap();
    assert_eq!(
        nav.data().success_status(),
        SuccessStatus::Failed,
        "0.5 is below the 0.6 threshold"
    );
}

#[test]
fn global_objectives_carry_satisfaction_between_activities() {
    let writer = Sequencing {
        primary_objective: Some(ObjectiveDefinition {
            write_satisfied_status: vec!["shared".into()],
            ..ObjectiveDefinition::named("a-primary")
        }),
        ..Sequencing::default()
    };
    let reader = Sequencing {
        primary_objective: Some(ObjectiveDefinition {
            read_satisfied_status: Some("shared".into()),
            ..ObjectiveDefinition::named("b-primary")
        }),
        ..Sequencing::default()
    };
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    tree.insert(root, ActivitySpec::leaf("a").with_sequencing(writer))
        .unwrap();
    let b = tree
        .insert(root, ActivitySpec::leaf("b").with_sequencing(reader))
        .unwrap();
    let mut nav = navigator::<GlobalObjectiveStore>(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.data().globals().read_satisfied_status("shared"), None);

    nav.navigate(NavigationCommand::Continue).unwrap();
    assert_eq!(
        nav.data().globals().read_satisfied_status("shared"),
        Some(true)
    );
    assert!(nav.data().globals().is_changed());
    assert_eq!(
        nav.tree()[b].data().primary_objective().success_status(),
        SuccessStatus::Passed,
        "b reads the shared objective on delivery"
    );
}

#[test]
fn host_rollup_finalizes_a_leaf() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let a = tree.insert(root, ActivitySpec::leaf("a")).unwrap();
    let mut nav = navigator::<NoGlobalObjectives>(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    nav.data_mut()
        .content_writes(a)
        .unwrap()
        .set_completion_status(CompletionStatus::Completed);
    nav.rollup(a).unwrap();
    assert_eq!(nav.data().completion_status(), CompletionStatus::Completed);
}
