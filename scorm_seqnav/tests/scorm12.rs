// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SCORM 1.2 navigation, prerequisites, and lesson status.

use scorm_activity_tree::{
    ActivityId, ActivitySpec, ActivityTree, EntryMode, ExitMode, LessonStatus, PackageFormat,
};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Prerequisites, Scorm12SeqNav, ScriptPrerequisites, SeqNav, SequencingError,
    SequencingExceptionCode as Code,
};

type Session<P> = Navigator<Scorm12SeqNav<P>, NoGlobalObjectives, NoActivityStore, NoLog>;

/// `root` (no resource) with `a`, `b` (requires `a`), and `c` (mastery 80).
fn course() -> (ActivityTree, [ActivityId; 3]) {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root")).unwrap();
    let root = tree.root();
    let a = tree.insert(root, ActivitySpec::leaf("a")).unwrap();
    let b = tree
        .insert(
            root,
            ActivitySpec {
                prerequisites: Some("a".into()),
                ..ActivitySpec::leaf("b")
            },
        )
        .unwrap();
    let c = tree
        .insert(
            root,
            ActivitySpec {
                mastery_score: Some(80.0),
                ..ActivitySpec::leaf("c")
            },
        )
        .unwrap();
    (tree, [a, b, c])
}

fn navigator(tree: ActivityTree) -> Session<ScriptPrerequisites> {
    Navigator::new(NavigatorData::new(tree), Scorm12SeqNav::new())
}

fn refused(result: Result<bool, SequencingError>) -> Option<Code> {
    result.err().and_then(|e| e.code())
}

fn set_status(nav: &mut Session<impl Prerequisites>, id: ActivityId, status: LessonStatus) {
    nav.data_mut()
        .content_writes(id)
        .unwrap()
        .set_lesson_status(status);
}

#[test]
fn start_skips_items_without_a_resource() {
    let (tree, [a, ..]) = course();
    let mut nav = navigator(tree);
    assert_eq!(nav.engine().package_format(), PackageFormat::Scorm12);

    assert!(!nav.navigate(NavigationCommand::Start).unwrap());
    assert_eq!(nav.data().current_activity(), Some(a));
    assert_eq!(nav.tree()[a].data().entry(), EntryMode::AbInitio);
    assert_eq!(
        refused(nav.navigate(NavigationCommand::Previous)),
        Some(Code::SB_2_1__3)
    );
}

#[test]
fn leaving_an_item_can_satisfy_the_next_prerequisite() {
    let (tree, [a, b, _]) = course();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    assert_eq!(nav.tree()[a].data().lesson_status(), LessonStatus::NotAttempted);

    assert!(nav.is_navigation_valid(NavigationCommand::Continue));
    nav.navigate(NavigationCommand::Continue).unwrap();
    assert_eq!(nav.data().current_activity(), Some(b));
    assert_eq!(
        nav.tree()[a].data().lesson_status(),
        LessonStatus::Completed,
        "exiting a marks it completed before b's prerequisites are read"
    );
}

#[test]
fn unfinished_prerequisites_refuse_delivery() {
    for status in [LessonStatus::Incomplete, LessonStatus::Failed] {
        let (tree, [a, b, _]) = course();
        let mut nav = navigator(tree);
        nav.navigate(NavigationCommand::Start).unwrap();
        set_status(&mut nav, a, status);

        assert!(!nav.is_navigation_valid(NavigationCommand::Continue));
        assert_eq!(
            refused(nav.navigate(NavigationCommand::Continue)),
            Some(Code::DB_1_1__3)
        );
        assert_eq!(nav.data().current_activity(), Some(a));
        assert!(
            !nav.tree()[a].data().is_active(),
            "a was exited before the refusal"
        );
        assert_eq!(nav.tree()[a].data().lesson_status(), status);
        assert_eq!(nav.tree()[b].data().attempt_count(), 0);
    }
}

#[test]
fn leaving_marks_completed() {
    let (tree, [a, _, c]) = course();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();

    nav.navigate_to(c).unwrap();
    assert_eq!(nav.tree()[a].data().lesson_status(), LessonStatus::Completed);
    assert!(!nav.tree()[a].data().is_active());
    assert_eq!(
        refused(nav.navigate(NavigationCommand::Continue)),
        Some(Code::SB_2_1__1)
    );
}

#[test]
fn mastery_score_decides_passed_or_failed() {
    let (tree, [_, _, c]) = course();
    let mut nav = navigator(tree);

    nav.navigate_to(c).unwrap();
    nav.data_mut()
        .content_writes(c)
        .unwrap()
        .set_score_raw(Some(90.0));
    nav.navigate(NavigationCommand::UnqualifiedExit).unwrap();
    assert_eq!(nav.tree()[c].data().lesson_status(), LessonStatus::Passed);
    assert_eq!(nav.data().current_activity(), None);

    nav.navigate_to(c).unwrap();
    assert_eq!(nav.tree()[c].data().attempt_count(), 2);
    assert_eq!(
        nav.tree()[c].data().entry(),
        EntryMode::AllOtherConditions
    );
    nav.data_mut()
        .content_writes(c)
        .unwrap()
        .set_score_raw(Some(50.0));
    nav.navigate(NavigationCommand::UnqualifiedExit).unwrap();
    assert_eq!(nav.tree()[c].data().lesson_status(), LessonStatus::Failed);
}

#[test]
fn no_credit_ignores_the_mastery_score() {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("root")).unwrap();
    let root = tree.root();
    let quiz = tree
        .insert(
            root,
            ActivitySpec {
                mastery_score: Some(80.0),
                credit: false,
                ..ActivitySpec::leaf("quiz")
            },
        )
        .unwrap();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    nav.data_mut()
        .content_writes(quiz)
        .unwrap()
        .set_score_raw(Some(10.0));
    nav.navigate(NavigationCommand::UnqualifiedExit).unwrap();
    assert_eq!(
        nav.tree()[quiz].data().lesson_status(),
        LessonStatus::Completed
    );
}

#[test]
fn only_items_with_resources_can_be_chosen() {
    let (tree, [a, b, c]) = course();
    let root = tree.root();
    let mut nav = navigator(tree);
    assert_eq!(refused(nav.navigate_to(root)), Some(Code::NB_2_1__10));

    let toc = nav.table_of_contents(true);
    let valid: Vec<_> = toc.iter().filter(|e| e.valid).map(|e| e.activity).collect();
    assert_eq!(valid, [a, b, c]);
    assert_eq!(toc[0].activity, root);
}

#[test]
fn suspend_and_resume() {
    let (tree, [a, b, _]) = course();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    set_status(&mut nav, a, LessonStatus::Completed);
    nav.navigate(NavigationCommand::Continue).unwrap();

    assert!(nav.navigate(NavigationCommand::SuspendAll).unwrap());
    assert_eq!(nav.data().suspended_activity(), Some(b));
    assert!(nav.tree()[b].data().is_suspended());

    assert!(!nav.navigate(NavigationCommand::ResumeAll).unwrap());
    let resumed = nav.tree()[b].data();
    assert_eq!(nav.data().current_activity(), Some(b));
    assert_eq!(resumed.entry(), EntryMode::Resume);
    assert_eq!(resumed.attempt_count(), 1);
    assert!(!resumed.is_suspended());
}

#[test]
fn logout_resumes_without_resume_entry() {
    let (tree, [a, ..]) = course();
    let mut nav = navigator(tree);
    nav.navigate(NavigationCommand::Start).unwrap();
    nav.data_mut()
        .content_writes(a)
        .unwrap()
        .set_exit(Some(ExitMode::Logout));

    assert!(nav.process_data_model_navigation().unwrap());
    assert_eq!(nav.data().suspended_activity(), Some(a));

    nav.navigate(NavigationCommand::ResumeAll).unwrap();
    assert_eq!(
        nav.tree()[a].data().entry(),
        EntryMode::AllOtherConditions
    );
}

#[test]
fn exit_all_ends_the_session() {
    let (tree, [a, ..]) = course();
    let mut nav = navigator(tree);
    assert_eq!(
        refused(nav.navigate(NavigationCommand::ExitAll)),
        Some(Code::NB_2_1__2)
    );
    nav.navigate(NavigationCommand::Start).unwrap();
    assert!(nav.navigate(NavigationCommand::ExitAll).unwrap());
    assert_eq!(nav.data().current_activity(), None);
    assert!(!nav.tree()[a].data().is_active());
}

#[derive(Clone, Debug)]
struct Locked;

impl Prerequisites for Locked {
    fn evaluate(
        &self,
        _expression: Option<&str>,
        _lesson_status: &dyn Fn(&str) -> Option<LessonStatus>,
    ) -> bool {
        false
    }
}

#[test]
fn custom_prerequisite_evaluator() {
    let (tree, _) = course();
    let mut nav: Session<Locked> = Navigator::new(
        NavigatorData::new(tree),
        Scorm12SeqNav::with_prerequisites(Locked),
    );
    assert_eq!(
        refused(nav.navigate(NavigationCommand::Start)),
        Some(Code::DB_1_1__3)
    );
    assert_eq!(nav.data().current_activity(), None);
}
