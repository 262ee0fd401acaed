// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choice and rollup.
//!
//! Let the learner pick lessons from a table of contents, report scores
//! from content, and see completion and measure roll up to the course.
//!
//! Run:
//! - `cargo run -p scorm_demos --example choice_rollup`

use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{
    ActivitySpec, ActivityTree, ControlModes, ObjectiveDefinition, RuleCondition, Sequencing,
    SequencingCondition, SequencingRule, SequencingRuleAction,
};
use scorm_seqnav::{
    GlobalObjectiveStore, NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoLog,
    Scorm2004SeqNav,
};

type Session = Navigator<Scorm2004SeqNav<StdRng>, GlobalObjectiveStore, NoActivityStore, NoLog>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let course = Sequencing {
        primary_objective: Some(ObjectiveDefinition {
            satisfied_by_measure: true,
            min_normalized_measure: 0.7,
            ..ObjectiveDefinition::default()
        }),
        ..Sequencing::default().with_control_modes(ControlModes::FLOW, true)
    };
    let mut tree = ActivityTree::new(ActivitySpec::cluster("course").with_sequencing(course))?;
    let root = tree.root();

    // The quiz weighs twice as much as each reading.
    let quiz = Sequencing {
        objective_measure_weight: 2.0,
        ..Sequencing::default()
    };
    // The answer key is never offered for choice and does not count.
    let answers = Sequencing {
        pre_condition_rules: vec![SequencingRule::new(
            [SequencingCondition::new(RuleCondition::Always)],
            SequencingRuleAction::HiddenFromChoice,
        )],
        objective_measure_weight: 0.0,
        ..Sequencing::default()
    };
    tree.insert(root, ActivitySpec::leaf("reading-1"))?;
    tree.insert(root, ActivitySpec::leaf("reading-2"))?;
    let quiz = tree.insert(root, ActivitySpec::leaf("quiz").with_sequencing(quiz))?;
    tree.insert(root, ActivitySpec::leaf("answers").with_sequencing(answers))?;

    let mut nav: Session = Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(3)),
    );
    print_toc(&nav);

    // Jump straight to the quiz and report a score.
    nav.navigate_to_key("quiz")?;
    nav.data_mut().content_writes(quiz)?.set_score_scaled(Some(0.9))?;
    print_toc(&nav);

    for key in ["reading-1", "reading-2"] {
        nav.navigate_to_key(key)?;
        let current = nav.data().current_activity().ok_or("nothing delivered")?;
        nav.data_mut().content_writes(current)?.set_score_scaled(Some(0.5))?;
    }
    nav.navigate(NavigationCommand::ExitAll)?;

    let objective = nav.tree()[root].data().primary_objective();
    println!(
        "course measure {:.2}, success {:?}, completion {:?}, points {:?}",
        objective.normalized_measure(),
        nav.data().success_status(),
        nav.data().completion_status(),
        nav.data().total_points(),
    );
    Ok(())
}

fn print_toc(nav: &Session) {
    println!("table of contents:");
    for entry in nav.table_of_contents(true) {
        let activity = &nav.tree()[entry.activity];
        println!(
            "{}{} {}",
            "  ".repeat(entry.depth),
            activity.key(),
            if entry.valid { "" } else { "(unavailable)" }
        );
    }
}
