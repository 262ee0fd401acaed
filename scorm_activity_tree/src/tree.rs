// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, tree-order queries, and gated state access.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Index;

use rand::{Rng, RngCore};

use crate::data_model::{ContentWrites, DataModel, TrackingMut};
use crate::error::TreeError;
use crate::sequencing::Sequencing;
use crate::types::{ActivityId, RandomizationTiming};

/// Input for one activity when building a tree.
///
/// This is the already-parsed manifest item: identity, resource, and static
/// sequencing configuration.
#[derive(Clone, Debug)]
pub struct ActivitySpec {
    /// Stable identifier, unique within the tree.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Resource to launch. Empty means the activity cannot be delivered.
    pub resource_key: String,
    /// SCORM 1.2 prerequisite script.
    pub prerequisites: Option<String>,
    /// SCORM 1.2 mastery score.
    pub mastery_score: Option<f64>,
    /// Whether attempts count for credit.
    pub credit: bool,
    /// Sequencing configuration.
    pub sequencing: Sequencing,
}

impl Default for ActivitySpec {
    fn default() -> Self {
        Self {
            key: String::new(),
            title: String::new(),
            resource_key: String::new(),
            prerequisites: None,
            mastery_score: None,
            credit: true,
            sequencing: Sequencing::default(),
        }
    }
}

impl ActivitySpec {
    /// A cluster (no resource) with default sequencing.
    pub fn cluster(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            ..Self::default()
        }
    }

    /// A deliverable activity whose resource key equals its key.
    pub fn leaf(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            resource_key: key.clone(),
            key,
            ..Self::default()
        }
    }

    /// Replace the sequencing configuration.
    pub fn with_sequencing(mut self, sequencing: Sequencing) -> Self {
        self.sequencing = sequencing;
        self
    }
}

/// One node of the activity tree.
#[derive(Clone, Debug)]
pub struct Activity {
    key: String,
    title: String,
    resource_key: String,
    prerequisites: Option<String>,
    parent: Option<ActivityId>,
    children: Vec<ActivityId>,
    random_placement: Option<u32>,
    sequencing: Sequencing,
    data: DataModel,
}

impl Activity {
    fn new(spec: ActivitySpec, parent: Option<ActivityId>) -> Self {
        let data = DataModel::new(&spec.sequencing, spec.mastery_score, spec.credit);
        Self {
            key: spec.key,
            title: spec.title,
            resource_key: spec.resource_key,
            prerequisites: spec.prerequisites,
            parent,
            children: Vec::new(),
            random_placement: None,
            sequencing: spec.sequencing,
            data,
        }
    }

    /// Stable identifier.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Resource to launch; empty for clusters and placeholders.
    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    /// Whether the activity has a resource and may be delivered.
    pub fn has_resource(&self) -> bool {
        !self.resource_key.is_empty()
    }

    /// SCORM 1.2 prerequisite script.
    pub fn prerequisites(&self) -> Option<&str> {
        self.prerequisites.as_deref()
    }

    /// Parent, `None` for the root.
    pub fn parent(&self) -> Option<ActivityId> {
        self.parent
    }

    /// Ordered children.
    pub fn children(&self) -> &[ActivityId] {
        &self.children
    }

    /// `true` when there are no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Position assigned by the last randomization, if any.
    pub fn random_placement(&self) -> Option<u32> {
        self.random_placement
    }

    /// Static sequencing configuration.
    pub fn sequencing(&self) -> &Sequencing {
        &self.sequencing
    }

    /// Tracking state.
    pub fn data(&self) -> &DataModel {
        &self.data
    }
}

/// Arena of activities with exactly one root.
///
/// The shape is fixed once a session starts; only tracking state changes, and
/// children are reordered only by explicit randomization.
#[derive(Clone)]
pub struct ActivityTree {
    nodes: Vec<Activity>,
    keys: BTreeMap<String, ActivityId>,
}

impl core::fmt::Debug for ActivityTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let leaves = self.nodes.iter().filter(|n| n.is_leaf()).count();
        f.debug_struct("ActivityTree")
            .field("root", &self.nodes[0].key)
            .field("activities", &self.nodes.len())
            .field("leaves", &leaves)
            .finish_non_exhaustive()
    }
}

impl Index<ActivityId> for ActivityTree {
    type Output = Activity;

    fn index(&self, id: ActivityId) -> &Activity {
        self.get(id)
    }
}

impl ActivityTree {
    /// Create a tree holding only `root`.
    pub fn new(root: ActivitySpec) -> Result<Self, TreeError> {
        let mut tree = Self {
            nodes: Vec::new(),
            keys: BTreeMap::new(),
        };
        tree.push(root, None)?;
        Ok(tree)
    }

    /// Append a new activity as the last child of `parent`.
    pub fn insert(
        &mut self,
        parent: ActivityId,
        spec: ActivitySpec,
    ) -> Result<ActivityId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownActivity(parent));
        }
        let id = self.push(spec, Some(parent))?;
        self.nodes[parent.idx()].children.push(id);
        Ok(id)
    }

    fn push(
        &mut self,
        spec: ActivitySpec,
        parent: Option<ActivityId>,
    ) -> Result<ActivityId, TreeError> {
        if self.keys.contains_key(&spec.key) {
            return Err(TreeError::DuplicateKey(spec.key));
        }
        check_objective_ids(&spec)?;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ActivityId uses 32-bit indices by design."
        )]
        let id = ActivityId::new(self.nodes.len() as u32);
        self.keys.insert(spec.key.clone(), id);
        self.nodes.push(Activity::new(spec, parent));
        Ok(id)
    }

    /// The root activity.
    pub fn root(&self) -> ActivityId {
        ActivityId::new(0)
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` belongs to this tree.
    pub fn contains(&self, id: ActivityId) -> bool {
        id.idx() < self.nodes.len()
    }

    /// Access an activity; panics if `id` came from another tree.
    pub fn get(&self, id: ActivityId) -> &Activity {
        &self.nodes[id.idx()]
    }

    /// Look an activity up by key.
    pub fn find(&self, key: &str) -> Option<ActivityId> {
        self.keys.get(key).copied()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: ActivityId) -> Option<ActivityId> {
        self.get(id).parent
    }

    /// Ordered children of `id`.
    pub fn children(&self, id: ActivityId) -> &[ActivityId] {
        &self.get(id).children
    }

    /// Whether `id` has no children.
    pub fn is_leaf(&self, id: ActivityId) -> bool {
        self.get(id).is_leaf()
    }

    fn sibling_index(&self, id: ActivityId) -> Option<(ActivityId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, pos))
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: ActivityId) -> Option<usize> {
        self.sibling_index(id).map(|(_, pos)| pos)
    }

    /// Next sibling of `id`.
    pub fn next_sibling(&self, id: ActivityId) -> Option<ActivityId> {
        let (parent, pos) = self.sibling_index(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    /// Previous sibling of `id`.
    pub fn previous_sibling(&self, id: ActivityId) -> Option<ActivityId> {
        let (parent, pos) = self.sibling_index(id)?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    /// Next activity in preorder: first child, else the next sibling of
    /// `id` or of its nearest ancestor that has one.
    pub fn next_in_preorder(&self, id: ActivityId) -> Option<ActivityId> {
        if let Some(&first) = self.children(id).first() {
            return Some(first);
        }
        let mut at = id;
        loop {
            if let Some(next) = self.next_sibling(at) {
                return Some(next);
            }
            at = self.parent(at)?;
        }
    }

    /// Previous activity in preorder: the parent when `id` is a first child,
    /// else the deepest last descendant of the previous sibling.
    pub fn previous_in_preorder(&self, id: ActivityId) -> Option<ActivityId> {
        let Some(mut at) = self.previous_sibling(id) else {
            return self.parent(id);
        };
        while let Some(&last) = self.children(at).last() {
            at = last;
        }
        Some(at)
    }

    /// A leaf with no next sibling on itself or on any ancestor.
    pub fn is_last_activity_in_tree(&self, id: ActivityId) -> bool {
        if !self.is_leaf(id) {
            return false;
        }
        self.ancestors(id).all(|a| self.next_sibling(a).is_none())
    }

    /// Iterate all activities in preorder.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            next: Some(self.root()),
        }
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: ActivityId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Path from the root to `id` (inclusive).
    pub fn path_to_root(&self, id: ActivityId) -> Vec<ActivityId> {
        let mut out: Vec<_> = self.ancestors(id).collect();
        out.reverse();
        out
    }

    /// Depth of `id`; the root has depth zero.
    pub fn depth(&self, id: ActivityId) -> usize {
        self.ancestors(id).count() - 1
    }

    /// Deepest activity that is an ancestor-or-self of both `a` and `b`.
    pub fn common_ancestor(&self, a: ActivityId, b: ActivityId) -> ActivityId {
        let pa = self.path_to_root(a);
        let pb = self.path_to_root(b);
        // Both paths start at the root, so the common prefix is never empty.
        let mut lca = 0;
        while lca + 1 < pa.len() && lca + 1 < pb.len() && pa[lca + 1] == pb[lca + 1] {
            lca += 1;
        }
        pa[lca]
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: ActivityId, id: ActivityId) -> bool {
        self.ancestors(id).skip(1).any(|a| a == ancestor)
    }

    /// Whether `a` precedes `b` in preorder.
    pub fn comes_before_in_preorder(&self, a: ActivityId, b: ActivityId) -> bool {
        if a == b {
            return false;
        }
        let pa = self.path_to_root(a);
        let pb = self.path_to_root(b);
        let mut i = 0;
        while i < pa.len() && i < pb.len() && pa[i] == pb[i] {
            i += 1;
        }
        match (pa.get(i), pb.get(i)) {
            // `a` is an ancestor of `b`.
            (None, _) => true,
            (_, None) => false,
            (Some(&ca), Some(&cb)) => {
                self.index_in_parent(ca).unwrap_or(0) < self.index_in_parent(cb).unwrap_or(0)
            }
        }
    }

    /// Full write access to the tracking state of `id`.
    ///
    /// Reserved for the sequencing engine and for persistence layers
    /// restoring saved state. Delivered content should use
    /// [`ActivityTree::content_writes`].
    pub fn advanced_access(&mut self, id: ActivityId) -> TrackingMut<'_> {
        let node = &mut self.nodes[id.idx()];
        TrackingMut {
            sequencing: &node.sequencing,
            data: &mut node.data,
        }
    }

    /// The content-writable surface of `id`, available only while it is active.
    pub fn content_writes(&mut self, id: ActivityId) -> Result<ContentWrites<'_>, TreeError> {
        let node = self
            .nodes
            .get_mut(id.idx())
            .ok_or(TreeError::UnknownActivity(id))?;
        if !node.data.is_active() {
            return Err(TreeError::NotActive(id));
        }
        Ok(ContentWrites {
            data: &mut node.data,
        })
    }

    /// Reorder the children of `cluster` to `order`, recording each child's
    /// position as its random placement.
    pub fn assign_random_placement(
        &mut self,
        cluster: ActivityId,
        order: &[ActivityId],
    ) -> Result<(), TreeError> {
        if !self.contains(cluster) {
            return Err(TreeError::UnknownActivity(cluster));
        }
        let current = self.children(cluster);
        let mut sorted_current = current.to_vec();
        let mut sorted_order = order.to_vec();
        sorted_current.sort_unstable();
        sorted_order.sort_unstable();
        if sorted_current != sorted_order {
            return Err(TreeError::InvalidChildOrder(cluster));
        }
        for (placement, &child) in order.iter().enumerate() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "child counts fit in 32 bits like ActivityId."
            )]
            let placement = placement as u32;
            self.nodes[child.idx()].random_placement = Some(placement);
        }
        let nodes = &self.nodes;
        let mut children = order.to_vec();
        children.sort_by_key(|c| nodes[c.idx()].random_placement);
        self.nodes[cluster.idx()].children = children;
        Ok(())
    }

    /// Apply manifest-time selection and randomization once, before the
    /// first attempt.
    ///
    /// Clusters with [`RandomizationTiming::Once`] selection keep a random
    /// subset of `selection_count` children in their original order. Clusters
    /// that reorder children on any timing other than `Never` are then
    /// shuffled.
    pub fn select_and_randomize_initial<R: RngCore + ?Sized>(&mut self, rng: &mut R) {
        let clusters: Vec<ActivityId> = self.preorder().filter(|&a| !self.is_leaf(a)).collect();
        for cluster in clusters {
            let seq = &self.nodes[cluster.idx()].sequencing;
            let select = match (seq.selection_timing, seq.selection_count) {
                (RandomizationTiming::Never, _) | (_, None) => None,
                (_, Some(count)) => Some(count as usize),
            };
            let reorder =
                seq.reorder_children && seq.randomization_timing != RandomizationTiming::Never;

            if let Some(count) = select {
                let children = &mut self.nodes[cluster.idx()].children;
                while children.len() > count {
                    let drop = rng.gen_range(0..children.len());
                    children.remove(drop);
                }
            }
            if reorder {
                let mut pool = self.children(cluster).to_vec();
                let mut order = Vec::with_capacity(pool.len());
                while !pool.is_empty() {
                    order.push(pool.remove(rng.gen_range(0..pool.len())));
                }
                // `order` is a permutation of the current children by construction.
                let placed = self.assign_random_placement(cluster, &order);
                debug_assert!(placed.is_ok(), "initial shuffle is not a permutation");
            }
        }
    }
}

fn check_objective_ids(spec: &ActivitySpec) -> Result<(), TreeError> {
    let seq = &spec.sequencing;
    let ids = seq
        .primary_objective
        .iter()
        .chain(seq.objectives.iter())
        .filter_map(|o| o.id.as_deref());
    let mut seen: Vec<&str> = Vec::new();
    for id in ids {
        if seen.contains(&id) {
            return Err(TreeError::DuplicateObjective {
                activity: spec.key.clone(),
                objective: id.into(),
            });
        }
        seen.push(id);
    }
    Ok(())
}

/// Preorder iterator over an [`ActivityTree`].
#[derive(Clone, Debug)]
pub struct Preorder<'a> {
    tree: &'a ActivityTree,
    next: Option<ActivityId>,
}

impl Iterator for Preorder<'_> {
    type Item = ActivityId;

    fn next(&mut self) -> Option<ActivityId> {
        let id = self.next?;
        self.next = self.tree.next_in_preorder(id);
        Some(id)
    }
}

/// Iterator from an activity up to the root.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a ActivityTree,
    next: Option<ActivityId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ActivityId;

    fn next(&mut self) -> Option<ActivityId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}
