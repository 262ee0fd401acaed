// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use scorm_activity_tree::{ActivitySpec, ActivityTree, ControlModes, Sequencing};
use scorm_seqnav::{
    NavigationCommand, Navigator, NavigatorData, NoActivityStore, NoGlobalObjectives, NoLog,
    Scorm2004SeqNav,
};

type Session = Navigator<Scorm2004SeqNav<StdRng>, NoGlobalObjectives, NoActivityStore, NoLog>;

/// `modules` clusters of `lessons` leaves each, all flowing.
fn gen_course(modules: usize, lessons: usize) -> ActivityTree {
    let flow = Sequencing::default().with_control_modes(ControlModes::FLOW, true);
    let mut tree = ActivityTree::new(ActivitySpec::cluster("course").with_sequencing(flow.clone()))
        .unwrap();
    let root = tree.root();
    for m in 0..modules {
        let module = tree
            .insert(
                root,
                ActivitySpec::cluster(format!("m{m}")).with_sequencing(flow.clone()),
            )
            .unwrap();
        for l in 0..lessons {
            tree.insert(module, ActivitySpec::leaf(format!("m{m}-l{l}")))
                .unwrap();
        }
    }
    tree
}

fn session(tree: ActivityTree) -> Session {
    Navigator::new(
        NavigatorData::new(tree),
        Scorm2004SeqNav::new(StdRng::seed_from_u64(0)),
    )
}

fn bench_continue_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("continue_walk");
    for &(modules, lessons) in &[(10usize, 10usize), (10, 100), (100, 10)] {
        let tree = gen_course(modules, lessons);
        group.throughput(Throughput::Elements((modules * lessons) as u64));
        group.bench_function(format!("m{modules}_l{lessons}"), |b| {
            b.iter_batched(
                || session(tree.clone()),
                |mut nav| {
                    nav.navigate(NavigationCommand::Start).unwrap();
                    while nav.navigate(NavigationCommand::Continue).is_ok() {}
                    black_box(nav.data().completion_status());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_rollup_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollup_wide");
    for &width in &[16usize, 256, 1024] {
        let mut nav = session(gen_course(1, width));
        nav.navigate(NavigationCommand::Start).unwrap();
        let leaf = nav.data().current_activity().unwrap();
        group.throughput(Throughput::Elements(width as u64));
        group.bench_function(format!("children_{width}"), |b| {
            b.iter(|| {
                nav.rollup(leaf).unwrap();
                black_box(nav.data().success_status());
            });
        });
    }
    group.finish();
}

fn bench_validity(c: &mut Criterion) {
    let mut group = c.benchmark_group("validity");
    for &(modules, lessons) in &[(4usize, 8usize), (16, 16)] {
        let mut nav = session(gen_course(modules, lessons));
        nav.navigate(NavigationCommand::Start).unwrap();
        group.throughput(Throughput::Elements((modules * lessons) as u64));
        group.bench_function(format!("continue_m{modules}_l{lessons}"), |b| {
            b.iter(|| black_box(nav.is_navigation_valid(NavigationCommand::Continue)));
        });
        group.bench_function(format!("toc_rules_m{modules}_l{lessons}"), |b| {
            b.iter(|| black_box(nav.table_of_contents(true).len()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_continue_walk,
    bench_rollup_wide,
    bench_validity,
);
criterion_main!(benches);
