// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flow and choice traversal, and per-attempt randomization.

use alloc::vec::Vec;

use rand::{Rng, RngCore};
use scorm_activity_tree::{ActivityId, ActivityTree, RandomizationTiming, SequencingRuleAction};
use tracing::trace;

use crate::error::{SequencingError, SequencingExceptionCode as Code};
use crate::scorm2004::Sequencer;
use crate::types::{ActivityDataStore, GlobalObjectiveMap, SequencingLog, TraversalDirection};

use TraversalDirection::{Backward, Forward};

/// Shuffle the children of `cluster` for a new attempt.
///
/// Applies only when the cluster randomizes on each new attempt, may reorder
/// its children, and has been attempted before; the first attempt keeps the
/// order fixed when the tree was built. Children are drawn one at a time
/// from `rng` and re-sorted by their new placement, so a seeded source always
/// yields the same permutation. Returns whether the children were reordered.
pub fn apply_randomization<R: RngCore + ?Sized>(
    tree: &mut ActivityTree,
    cluster: ActivityId,
    rng: &mut R,
) -> bool {
    let node = tree.get(cluster);
    let seq = node.sequencing();
    if seq.randomization_timing != RandomizationTiming::OnEachNewAttempt
        || !seq.reorder_children
        || node.data().attempt_count() == 0
    {
        return false;
    }
    let mut pool = node.children().to_vec();
    let mut order = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        order.push(pool.remove(rng.gen_range(0..pool.len())));
    }
    trace!(activity = %node.key(), children = order.len(), "randomizing children");
    // `order` is drawn from the current children, so it is always a permutation.
    tree.assign_random_placement(cluster, &order).is_ok()
}

impl<G, S, L, R> Sequencer<'_, G, S, L, R>
where
    G: GlobalObjectiveMap,
    S: ActivityDataStore,
    L: SequencingLog,
    R: RngCore + ?Sized,
{
    /// One step of flow traversal (SB.2.1).
    pub(crate) fn flow_tree_traversal(
        &mut self,
        activity: ActivityId,
        direction: TraversalDirection,
        consider_children: bool,
        previous_direction: Option<TraversalDirection>,
    ) -> Result<(ActivityId, TraversalDirection), SequencingError> {
        let tree = &self.nav.tree;
        let mut activity = activity;
        let mut direction = direction;
        let mut reversed = false;

        // A backward walk that ran off the front of a forward-only cluster
        // re-enters it from its first child.
        if previous_direction == Some(Backward)
            && let Some(parent) = tree.parent(activity)
            && tree.next_sibling(activity).is_none()
        {
            direction = Backward;
            activity = tree.children(parent)[0];
            reversed = true;
        }

        match direction {
            Forward => {
                if tree.is_last_activity_in_tree(activity) {
                    return Err(Code::SB_2_1__1.into());
                }
                if tree.is_leaf(activity) || !consider_children {
                    match tree.next_sibling(activity) {
                        None => {
                            let parent = tree.parent(activity).ok_or(Code::SB_2_1__1)?;
                            self.flow_tree_traversal(parent, Forward, false, None)
                        }
                        Some(next) => Ok((next, direction)),
                    }
                } else {
                    apply_randomization(&mut self.nav.tree, activity, &mut *self.rng);
                    let first = self.nav.tree.children(activity)[0];
                    Ok((first, Forward))
                }
            }
            Backward => {
                let Some(parent) = tree.parent(activity) else {
                    return Err(Code::SB_2_1__3.into());
                };
                if tree.is_leaf(activity) || !consider_children {
                    if !reversed && tree[parent].sequencing().forward_only() {
                        return Err(Code::SB_2_1__4.into());
                    }
                    match tree.previous_sibling(activity) {
                        None => self.flow_tree_traversal(parent, Backward, false, None),
                        Some(previous) => Ok((previous, direction)),
                    }
                } else {
                    apply_randomization(&mut self.nav.tree, activity, &mut *self.rng);
                    let tree = &self.nav.tree;
                    let children = tree.children(activity);
                    if tree[activity].sequencing().forward_only() {
                        Ok((children[0], Forward))
                    } else {
                        let last = children[children.len() - 1];
                        Ok((last, Backward))
                    }
                }
            }
        }
    }

    /// Find a deliverable activity starting at `activity` (SB.2.2).
    pub(crate) fn flow_activity_traversal(
        &mut self,
        activity: ActivityId,
        direction: TraversalDirection,
        previous_direction: Option<TraversalDirection>,
    ) -> Result<ActivityId, SequencingError> {
        let tree = &self.nav.tree;
        if let Some(parent) = tree.parent(activity)
            && !tree[parent].sequencing().flow()
        {
            return Err(Code::SB_2_2__1.into());
        }

        if self.rules().precondition(activity, SequencingRuleAction::Skip)? {
            trace!(activity = %self.nav.tree[activity].key(), "skipped");
            let (next, next_direction) =
                self.flow_tree_traversal(activity, direction, false, previous_direction)?;
            return if previous_direction == Some(Backward) && next_direction == Backward {
                self.flow_activity_traversal(next, next_direction, None)
            } else {
                self.flow_activity_traversal(next, next_direction, previous_direction)
            };
        }

        if self.rules().check_activity(activity)? {
            return Err(Code::SB_2_2__2.into());
        }

        if !self.nav.tree.is_leaf(activity) {
            let (next, next_direction) = self.flow_tree_traversal(activity, direction, true, None)?;
            return if direction == Backward && next_direction == Forward {
                self.flow_activity_traversal(next, Forward, Some(Backward))
            } else {
                self.flow_activity_traversal(next, direction, None)
            };
        }
        Ok(activity)
    }

    /// Flow from `activity` to the next deliverable activity (SB.2.3).
    pub(crate) fn flow(
        &mut self,
        activity: ActivityId,
        direction: TraversalDirection,
        consider_children: bool,
    ) -> Result<ActivityId, SequencingError> {
        let (candidate, _) = self.flow_tree_traversal(activity, direction, consider_children, None)?;
        self.flow_activity_traversal(candidate, direction, None)
    }

    /// Whether choice may pass over `activity` in `direction` (SB.2.4).
    pub(crate) fn choice_activity_traversal(
        &self,
        activity: ActivityId,
        direction: TraversalDirection,
    ) -> Result<(), SequencingError> {
        match direction {
            Forward => {
                if self
                    .rules()
                    .precondition(activity, SequencingRuleAction::StopForwardTraversal)?
                {
                    return Err(Code::SB_2_4__1.into());
                }
            }
            Backward => {
                let tree = &self.nav.tree;
                let parent = tree.parent(activity).ok_or(Code::SB_2_4__3)?;
                if tree[parent].sequencing().forward_only() {
                    return Err(Code::SB_2_4__2.into());
                }
            }
        }
        Ok(())
    }

    /// The activity a constrained choice may reach from `activity` (SB.2.9.1).
    pub(crate) fn choice_flow(
        &self,
        activity: ActivityId,
        direction: TraversalDirection,
    ) -> ActivityId {
        self.choice_flow_tree_traversal(activity, direction)
            .unwrap_or(activity)
    }

    // SB.2.9.2
    fn choice_flow_tree_traversal(
        &self,
        activity: ActivityId,
        direction: TraversalDirection,
    ) -> Option<ActivityId> {
        let tree = &self.nav.tree;
        match direction {
            Forward => {
                if tree.is_last_activity_in_tree(activity) {
                    return None;
                }
                match tree.next_sibling(activity) {
                    Some(next) => Some(next),
                    None => self.choice_flow_tree_traversal(tree.parent(activity)?, Forward),
                }
            }
            Backward => {
                let parent = tree.parent(activity)?;
                match tree.previous_sibling(activity) {
                    Some(previous) => Some(previous),
                    None => self.choice_flow_tree_traversal(parent, Backward),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use scorm_activity_tree::{ActivitySpec, Sequencing};

    fn shuffled_cluster(n: usize) -> ActivityTree {
        let seq = Sequencing {
            randomization_timing: RandomizationTiming::OnEachNewAttempt,
            reorder_children: true,
            ..Sequencing::default()
        };
        let mut tree = ActivityTree::new(ActivitySpec::cluster("c").with_sequencing(seq)).unwrap();
        let root = tree.root();
        for i in 0..n {
            tree.insert(root, ActivitySpec::leaf(alloc::format!("l{i}")))
                .unwrap();
        }
        tree
    }

    #[test]
    fn first_attempt_keeps_manifest_order() {
        let mut tree = shuffled_cluster(5);
        let root = tree.root();
        let before = tree.children(root).to_vec();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!apply_randomization(&mut tree, root, &mut rng));
        assert_eq!(tree.children(root), &before[..]);
    }

    #[test]
    fn seeded_randomization_is_deterministic() {
        let mut a = shuffled_cluster(8);
        let mut b = shuffled_cluster(8);
        let root = a.root();
        a.advanced_access(root).set_attempt_count(1);
        b.advanced_access(root).set_attempt_count(1);
        assert!(apply_randomization(&mut a, root, &mut StdRng::seed_from_u64(42)));
        assert!(apply_randomization(&mut b, root, &mut StdRng::seed_from_u64(42)));
        assert_eq!(a.children(root), b.children(root));

        let mut sorted = a.children(root).to_vec();
        sorted.sort_unstable();
        let mut original = shuffled_cluster(8).children(root).to_vec();
        original.sort_unstable();
        assert_eq!(sorted, original);
    }
}
