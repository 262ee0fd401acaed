// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear course.
//!
//! Build a flow-only course, walk it with Continue and Previous, and watch
//! the refusal codes at the edges.
//!
//! Run:
//! - `cargo run -p scorm_demos --example linear_course`

use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{ActivitySpec, ActivityTree, ControlModes, Sequencing};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Scorm2004SeqNav,
};

type Session = Navigator<Scorm2004SeqNav<StdRng>, NoGlobalObjectives, NoActivityStore, NoLog>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two modules of two lessons each. Flow is enabled at every cluster and
    // choice is turned off so only Continue/Previous move the learner.
    let linear = Sequencing::default()
        .with_control_modes(ControlModes::FLOW, true)
        .with_control_modes(ControlModes::CHOICE, false);
    let mut tree = ActivityTree::new(ActivitySpec::cluster("course").with_sequencing(linear.clone()))?;
    let root = tree.root();
    for module in ["intro", "basics"] {
        let m = tree.insert(root, ActivitySpec::cluster(module).with_sequencing(linear.clone()))?;
        for lesson in 1..=2 {
            tree.insert(m, ActivitySpec::leaf(format!("{module}-{lesson}")))?;
        }
    }

    let mut nav: Session = Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(0)),
    );

    nav.navigate(NavigationCommand::Start)?;
    print_current(&nav);

    // Walk forward until the engine refuses.
    loop {
        match nav.navigate(NavigationCommand::Continue) {
            Ok(_) => print_current(&nav),
            Err(err) => {
                println!("continue refused: {err}");
                break;
            }
        }
    }

    nav.navigate(NavigationCommand::Previous)?;
    print_current(&nav);

    println!(
        "choice allowed: {}",
        nav.is_navigation_to_valid(nav.tree().root())
    );

    let ended = nav.navigate(NavigationCommand::ExitAll)?;
    println!(
        "exit all ended the session: {ended}, completion {:?}",
        nav.data().completion_status()
    );
    Ok(())
}

fn print_current(nav: &Session) {
    if let Some(current) = nav.data().current_activity() {
        let activity = &nav.tree()[current];
        println!(
            "delivered {} (attempt {})",
            activity.key(),
            activity.data().attempt_count()
        );
    }
}
