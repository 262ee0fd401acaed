// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choice navigation and the table of contents.

use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{
    ActivitySpec, ActivityTree, ControlModes, RuleCondition, Sequencing, SequencingCondition,
    SequencingRule, SequencingRuleAction,
};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Scorm2004SeqNav, SequencingError, SequencingExceptionCode as Code, TocEntry,
};

type Session = Navigator<Scorm2004SeqNav<StdRng>, NoGlobalObjectives, NoActivityStore, NoLog>;

fn flowing() -> Sequencing {
    Sequencing::default().with_control_modes(ControlModes::FLOW, true)
}

fn navigator(tree: ActivityTree) -> Session {
    Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(3)),
    )
}

fn refused(result: Result<bool, SequencingError>) -> Option<Code> {
    result.err().and_then(|e| e.code())
}

fn hidden() -> Sequencing {
    Sequencing {
        pre_condition_rules: vec![SequencingRule::new(
            [SequencingCondition::new(RuleCondition::Always)],
            SequencingRuleAction::HiddenFromChoice,
        )],
        ..Sequencing::default()
    }
}

fn leaves(root: Sequencing, keys: &[&str]) -> ActivityTree {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(root)).unwrap();
    let r = tree.root();
    for key in keys {
        tree.insert(r, ActivitySpec::leaf(*key)).unwrap();
    }
    tree
}

#[test]
fn choose_a_sibling() {
    let tree = leaves(flowing(), &["a", "b", "c"]);
    let a = tree.find("a").unwrap();
    let c = tree.find("c").unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    assert!(!nav.navigate_to(c).unwrap());
    assert_eq!(nav.data().current_activity(), Some(c));
    assert!(!nav.tree()[a].data().is_active());

    nav.navigate_to_key("a").unwrap();
    assert_eq!(nav.data().current_activity(), Some(a));
}

#[test]
fn choice_can_start_a_session() {
    // No flow anywhere: choice is the only way in.
    let tree = leaves(Sequencing::default(), &["a", "b"]);
    let b = tree.find("b").unwrap();
    let mut nav = navigator(tree);

    nav.navigate_to(b).unwrap();
    assert_eq!(nav.data().current_activity(), Some(b));
    assert!(nav.tree()[nav.data().root()].data().is_active());
}

#[test]
fn unknown_destinations() {
    let tree = leaves(flowing(), &["a", "b"]);
    let big = leaves(flowing(), &["a", "b", "c", "d", "e", "f"]);
    let foreign = big.find("f").unwrap();
    let mut nav = navigator(tree);

    assert_eq!(
        nav.navigate_to_key("nope"),
        Err(SequencingError::UnknownActivity("nope".into()))
    );
    assert_eq!(refused(nav.navigate_to(foreign)), Some(Code::NB_2_1__11));
    assert_eq!(
        refused(nav.navigate(NavigationCommand::Choose)),
        Some(Code::NB_2_1__11),
        "choice needs a destination"
    );
}

#[test]
fn parent_without_choice_refuses() {
    let tree = leaves(
        flowing().with_control_modes(ControlModes::CHOICE, false),
        &["a", "b"],
    );
    let a = tree.find("a").unwrap();
    let b = tree.find("b").unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    assert_eq!(refused(nav.navigate_to(b)), Some(Code::NB_2_1__10));
    assert_eq!(nav.data().current_activity(), Some(a));
    assert!(
        nav.tree()[a].data().is_active(),
        "a refused navigation must not end the attempt"
    );
    assert!(!nav.is_navigation_to_valid(b));
}

#[test]
fn hidden_from_choice_refuses() {
    let mut tree = leaves(flowing(), &["a"]);
    let root = tree.root();
    let b = tree
        .insert(root, ActivitySpec::leaf("b").with_sequencing(hidden()))
        .unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    assert_eq!(refused(nav.navigate_to(b)), Some(Code::SB_2_9__3));
    // Flow still reaches it.
    nav.navigate(NavigationCommand::Continue).unwrap();
    assert_eq!(nav.data().current_activity(), Some(b));
}

#[test]
fn choosing_a_cluster_flows_into_it() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root")).unwrap();
    let root = tree.root();
    let m1 = tree.insert(root, ActivitySpec::cluster("m1")).unwrap();
    tree.insert(m1, ActivitySpec::leaf("a")).unwrap();
    let m2 = tree
        .insert(root, ActivitySpec::cluster("m2").with_sequencing(flowing()))
        .unwrap();
    let c = tree.insert(m2, ActivitySpec::leaf("c")).unwrap();
    tree.insert(m2, ActivitySpec::leaf("d")).unwrap();
    let mut nav = navigator(tree);

    nav.navigate_to(m2).unwrap();
    assert_eq!(nav.data().current_activity(), Some(c));
    assert!(nav.tree()[m2].data().is_active());
}

#[test]
fn choice_exit_keeps_the_learner_inside() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let m1 = tree
        .insert(
            root,
            ActivitySpec::cluster("m1")
                .with_sequencing(flowing().with_control_modes(ControlModes::CHOICE_EXIT, false)),
        )
        .unwrap();
    let a = tree.insert(m1, ActivitySpec::leaf("a")).unwrap();
    let b = tree.insert(m1, ActivitySpec::leaf("b")).unwrap();
    let m2 = tree.insert(root, ActivitySpec::cluster("m2")).unwrap();
    let c = tree.insert(m2, ActivitySpec::leaf("c")).unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.data().current_activity(), Some(a));

    assert_eq!(refused(nav.navigate_to(c)), Some(Code::NB_2_1__8));
    nav.navigate_to(b).unwrap();
    assert_eq!(nav.data().current_activity(), Some(b));

    let toc = nav.table_of_contents(false);
    let valid: Vec<_> = toc.iter().filter(|e| e.valid).map(|e| e.activity).collect();
    assert_eq!(valid, [m1, a, b], "only m1's subtree is reachable");
    assert_eq!(
        toc.iter().map(|e| e.depth).collect::<Vec<_>>(),
        [0, 1, 2, 2, 1, 2]
    );
}

#[test]
fn prevent_activation_blocks_entering_by_choice() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let m = tree
        .insert(
            root,
            ActivitySpec::cluster("m")
                .with_sequencing(flowing().with_control_modes(ControlModes::PREVENT_ACTIVATION, true)),
        )
        .unwrap();
    let x = tree.insert(m, ActivitySpec::leaf("x")).unwrap();
    let y = tree.insert(m, ActivitySpec::leaf("y")).unwrap();
    let mut nav = navigator(tree);

    assert_eq!(refused(nav.navigate_to(y)), Some(Code::SB_2_9__6));

    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.data().current_activity(), Some(x));
    nav.navigate_to(y).unwrap();
    assert_eq!(nav.data().current_activity(), Some(y));
}

#[test]
fn constrained_choice_reaches_only_the_next_branch() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let m1 = tree
        .insert(
            root,
            ActivitySpec::cluster("m1")
                .with_sequencing(flowing().with_control_modes(ControlModes::CONSTRAIN_CHOICE, true)),
        )
        .unwrap();
    let a = tree.insert(m1, ActivitySpec::leaf("a")).unwrap();
    let m2 = tree.insert(root, ActivitySpec::cluster("m2")).unwrap();
    let c = tree.insert(m2, ActivitySpec::leaf("c")).unwrap();
    let m3 = tree.insert(root, ActivitySpec::cluster("m3")).unwrap();
    let e = tree.insert(m3, ActivitySpec::leaf("e")).unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.data().current_activity(), Some(a));

    assert!(!nav.is_navigation_to_valid(e));
    assert!(nav.is_navigation_to_valid(c));
    assert_eq!(refused(nav.navigate_to(e)), Some(Code::SB_2_9__8));

    nav.navigate_to(c).unwrap();
    assert_eq!(nav.data().current_activity(), Some(c));
    assert!(
        !nav.tree()[m1].data().is_active(),
        "leaving m1 by choice ends its attempt"
    );
}

#[test]
fn table_of_contents_with_rules() {
    let mut tree = leaves(flowing(), &["a"]);
    let root = tree.root();
    let b = tree
        .insert(root, ActivitySpec::leaf("b").with_sequencing(hidden()))
        .unwrap();
    let c = tree.insert(root, ActivitySpec::leaf("c")).unwrap();
    let a = tree.find("a").unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    let entry = |toc: &[TocEntry], id| *toc.iter().find(|e| e.activity == id).unwrap();

    let structural = nav.table_of_contents(false);
    assert_eq!(structural.len(), 4);
    assert!(entry(&structural, b).valid, "structure alone allows b");

    let evaluated = nav.table_of_contents(true);
    assert!(entry(&evaluated, a).valid);
    assert!(!entry(&evaluated, b).valid, "b is hidden from choice");
    assert!(entry(&evaluated, c).valid);
    assert_eq!(
        entry(&evaluated, c),
        TocEntry {
            activity: c,
            depth: 1,
            valid: true
        }
    );

    // Building the table must not disturb the session.
    assert_eq!(nav.data().current_activity(), Some(a));
    assert!(nav.tree()[a].data().is_active());
}

#[test]
fn choosing_the_current_cluster_does_not_flow_into_it() {
    let leave_module = Sequencing {
        post_condition_rules: vec![SequencingRule::new(
            [SequencingCondition::new(RuleCondition::Always)],
            SequencingRuleAction::ExitParent,
        )],
        ..Sequencing::default()
    };
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flowing())).unwrap();
    let root = tree.root();
    let m = tree
        .insert(root, ActivitySpec::cluster("m").with_sequencing(flowing()))
        .unwrap();
    let l1 = tree
        .insert(m, ActivitySpec::leaf("l1").with_sequencing(leave_module))
        .unwrap();
    tree.insert(m, ActivitySpec::leaf("l2")).unwrap();
    let mut nav = navigator(tree);

    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.data().current_activity(), Some(l1));
    // Leaving l1 exits its parent too, so the module becomes current.
    assert!(!nav.navigate(NavigationCommand::UnqualifiedExit).unwrap());
    assert_eq!(nav.data().current_activity(), Some(m));

    assert_eq!(refused(nav.navigate_to(m)), Some(Code::DB_1_1__1));
    assert_eq!(nav.data().current_activity(), Some(m));
}
