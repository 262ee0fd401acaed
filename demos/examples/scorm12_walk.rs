// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SCORM 1.2 walk.
//!
//! A SCORM 1.2 course with a prerequisite and a mastery score: content
//! reports status and scores, the engine gates delivery and decides
//! passed or failed on exit.
//!
//! Run:
//! - `cargo run -p scorm_demos --example scorm12_walk`

use scorm_activity_tree::{ActivitySpec, ActivityTree, LessonStatus};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Scorm12SeqNav, ScriptPrerequisites,
};

type Session = Navigator<Scorm12SeqNav<ScriptPrerequisites>, NoGlobalObjectives, NoActivityStore, NoLog>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut tree = ActivityTree::new(ActivitySpec::cluster("course"))?;
    let root = tree.root();
    let lesson = tree.insert(root, ActivitySpec::leaf("lesson"))?;
    let exam = tree.insert(
        root,
        ActivitySpec {
            prerequisites: Some("lesson".into()),
            mastery_score: Some(75.0),
            ..ActivitySpec::leaf("exam")
        },
    )?;

    let mut nav: Session = Navigator::new(NavigatorData::new(tree), Scorm12SeqNav::new());
    nav.navigate(NavigationCommand::Start)?;
    println!("started on {}", key(&nav));

    // The exam requires the lesson to be finished; the content says it is not.
    nav.data_mut()
        .content_writes(lesson)?
        .set_lesson_status(LessonStatus::Incomplete);
    if let Err(err) = nav.navigate(NavigationCommand::Continue) {
        println!("continue refused: {err}");
    }

    // Revisit the lesson and finish it this time.
    nav.navigate_to(lesson)?;
    nav.data_mut()
        .content_writes(lesson)?
        .set_lesson_status(LessonStatus::Completed);
    nav.navigate(NavigationCommand::Continue)?;
    println!("now on {}", key(&nav));

    nav.data_mut().content_writes(exam)?.set_score_raw(Some(82.0));
    nav.navigate(NavigationCommand::UnqualifiedExit)?;
    println!(
        "exam status after exit: {:?}",
        nav.tree()[exam].data().lesson_status()
    );

    for entry in nav.table_of_contents(false) {
        println!(
            "{}{} {:?}",
            "  ".repeat(entry.depth),
            nav.tree()[entry.activity].key(),
            nav.tree()[entry.activity].data().lesson_status()
        );
    }
    Ok(())
}

fn key(nav: &Session) -> &str {
    nav.data()
        .current_activity()
        .map_or("nothing", |current| nav.tree()[current].key())
}
