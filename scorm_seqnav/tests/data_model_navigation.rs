// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Acting on navigation requests and exit modes written by content.

use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{
    ActivityId, ActivitySpec, ActivityTree, ContentNavigationRequest, ControlModes, ExitMode,
    Sequencing,
};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Scorm2004SeqNav, SequencingError,
};

type Session = Navigator<Scorm2004SeqNav<StdRng>, NoGlobalObjectives, NoActivityStore, NoLog>;

fn started() -> (Session, Vec<ActivityId>) {
    let flow = Sequencing::default().with_control_modes(ControlModes::FLOW, true);
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root").with_sequencing(flow)).unwrap();
    let root = tree.root();
    let ids = ["a", "b", "c"]
        .into_iter()
        .map(|key| tree.insert(root, ActivitySpec::leaf(key)).unwrap())
        .collect();
    let mut nav = Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(9)),
    );
    nav.navigate(NavigationCommand::Start).unwrap();
    (nav, ids)
}

fn request(nav: &mut Session, activity: ActivityId, request: ContentNavigationRequest) {
    nav.data_mut()
        .content_writes(activity)
        .unwrap()
        .set_navigation_request(Some(request));
}

fn exit(nav: &mut Session, activity: ActivityId, mode: ExitMode) {
    nav.data_mut()
        .content_writes(activity)
        .unwrap()
        .set_exit(Some(mode));
}

#[test]
fn nothing_requested_does_nothing() {
    let (mut nav, ids) = started();
    assert!(!nav.process_data_model_navigation().unwrap());
    assert_eq!(nav.data().current_activity(), Some(ids[0]));
}

#[test]
fn continue_request() {
    let (mut nav, ids) = started();
    request(&mut nav, ids[0], ContentNavigationRequest::Continue);
    assert!(nav.process_data_model_navigation().unwrap());
    assert_eq!(nav.data().current_activity(), Some(ids[1]));
}

#[test]
fn choice_request_by_key() {
    let (mut nav, ids) = started();
    request(&mut nav, ids[0], ContentNavigationRequest::Choice("c".into()));
    assert!(nav.process_data_model_navigation().unwrap());
    assert_eq!(nav.data().current_activity(), Some(ids[2]));

    request(&mut nav, ids[2], ContentNavigationRequest::Choice("zz".into()));
    assert_eq!(
        nav.process_data_model_navigation(),
        Err(SequencingError::UnknownActivity("zz".into()))
    );
}

#[test]
fn exit_mode_wins_over_a_navigation_request() {
    let (mut nav, ids) = started();
    request(&mut nav, ids[0], ContentNavigationRequest::Continue);
    exit(&mut nav, ids[0], ExitMode::TimeOut);

    assert!(nav.process_data_model_navigation().unwrap());
    assert_eq!(
        nav.data().current_activity(),
        None,
        "timing out exits the whole course"
    );
}

#[test]
fn logout_suspends_the_course() {
    let (mut nav, ids) = started();
    exit(&mut nav, ids[0], ExitMode::Logout);

    assert!(nav.process_data_model_navigation().unwrap());
    assert_eq!(nav.data().suspended_activity(), Some(ids[0]));
    assert_eq!(nav.data().current_activity(), None);
}

#[test]
fn suspended_exit_only_changes_state() {
    let (mut nav, ids) = started();
    exit(&mut nav, ids[0], ExitMode::Suspended);

    assert!(!nav.process_data_model_navigation().unwrap());
    let a = nav.tree()[ids[0]].data();
    assert!(a.is_suspended());
    assert!(!a.is_active());
    assert_eq!(nav.data().current_activity(), Some(ids[0]));
}

#[test]
fn needs_a_current_activity() {
    let (mut nav, _) = started();
    nav.navigate(NavigationCommand::ExitAll).unwrap();
    assert_eq!(
        nav.process_data_model_navigation(),
        Err(SequencingError::NoCurrentActivity)
    );
}
