// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory global objective store.

use alloc::collections::BTreeMap;
use alloc::string::String;

use scorm_activity_tree::Objective;

use crate::types::GlobalObjectiveMap;

/// A [`GlobalObjectiveMap`] kept in memory.
///
/// Writing an objective records, for every key in its write maps, the value
/// when known and an explicit "unknown" otherwise. Unknown, empty, and missing
/// keys all read as `None`. The store remembers whether anything changed
/// since [`GlobalObjectiveStore::clear_changed`] so a host can persist lazily.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalObjectiveStore {
    satisfied: BTreeMap<String, Option<bool>>,
    measure: BTreeMap<String, Option<f64>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    changed: bool,
}

impl GlobalObjectiveStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a satisfied status, e.g. from persisted learner data.
    pub fn set_satisfied_status(&mut self, objective: impl Into<String>, value: Option<bool>) {
        self.satisfied.insert(objective.into(), value);
        self.changed = true;
    }

    /// Seed a normalized measure.
    pub fn set_normalized_measure(&mut self, objective: impl Into<String>, value: Option<f64>) {
        self.measure.insert(objective.into(), value);
        self.changed = true;
    }

    /// Whether any value was written since the last [`clear_changed`](Self::clear_changed).
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Reset the change flag, typically after persisting.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// Number of keys with any recorded entry.
    pub fn len(&self) -> usize {
        let extra = self
            .measure
            .keys()
            .filter(|k| !self.satisfied.contains_key(*k))
            .count();
        self.satisfied.len() + extra
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.satisfied.is_empty() && self.measure.is_empty()
    }
}

impl GlobalObjectiveMap for GlobalObjectiveStore {
    fn read_satisfied_status(&self, objective: &str) -> Option<bool> {
        if objective.is_empty() {
            return None;
        }
        self.satisfied.get(objective).copied().flatten()
    }

    fn read_normalized_measure(&self, objective: &str) -> Option<f64> {
        if objective.is_empty() {
            return None;
        }
        self.measure.get(objective).copied().flatten()
    }

    fn write_global_objectives(&mut self, objectives: &[Objective]) {
        for o in objectives {
            let def = o.definition();
            if !def.has_write_maps() {
                continue;
            }
            let satisfied = o.progress_status().then_some(o.satisfied_status());
            for key in &def.write_satisfied_status {
                self.satisfied.insert(key.clone(), satisfied);
            }
            let measure = o.measure_status().then_some(o.normalized_measure());
            for key in &def.write_normalized_measure {
                self.measure.insert(key.clone(), measure);
            }
            self.changed = true;
        }
    }
}
