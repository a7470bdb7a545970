//! Equality partition of one location's variables.
//!
//! Two variables share a class iff every sample so far gave them equal
//! values (or left both missing). Classes only ever split. The class that
//! keeps the old leader keeps its id; every other fragment is led by its
//! lowest member.

use std::collections::BTreeMap;

use finv_error::{InferError, Result};
use finv_types::{Value, ValueTuple, VarId, VarInfo};
use serde::Serialize;
use smallvec::SmallVec;

/// One equivalence class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EqualityClass {
    leader: VarId,
    members: Vec<VarId>,
    samples: u64,
}

impl EqualityClass {
    #[must_use]
    pub const fn leader(&self) -> VarId {
        self.leader
    }

    /// Members in ascending id order, leader first.
    #[must_use]
    pub fn members(&self) -> &[VarId] {
        &self.members
    }

    /// Samples the class has seen, including those before it split off.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// A class with several members is an equality invariant.
    #[must_use]
    pub fn is_nontrivial(&self) -> bool {
        self.members.len() > 1
    }
}

/// One class splitting in one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEvent {
    pub old_leader: VarId,
    /// Leaders of the fragments that left, ascending.
    pub new_leaders: SmallVec<[VarId; 2]>,
    /// Every variable that moved to a new class.
    pub moved: Vec<VarId>,
}

impl SplitEvent {
    /// The old leader followed by every new leader: the substitution choices
    /// for a slice position that referenced the old leader.
    #[must_use]
    pub fn leaders(&self) -> SmallVec<[VarId; 3]> {
        let mut out = SmallVec::new();
        out.push(self.old_leader);
        out.extend(self.new_leaders.iter().copied());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityPartition {
    leader_of: Vec<VarId>,
    classes: BTreeMap<VarId, EqualityClass>,
}

impl EqualityPartition {
    /// Initial partition: each variable joins the first class whose leader it
    /// is [`VarInfo::equality_compatible`] with. With `enabled` false every
    /// variable is a singleton.
    #[must_use]
    pub fn new(vars: &[VarInfo], enabled: bool) -> Self {
        let mut leader_of: Vec<VarId> = Vec::with_capacity(vars.len());
        let mut classes: BTreeMap<VarId, EqualityClass> = BTreeMap::new();
        for var in vars {
            let home = if enabled {
                classes
                    .keys()
                    .copied()
                    .find(|leader| {
                        vars.get(leader.index())
                            .is_some_and(|l| l.equality_compatible(var))
                    })
            } else {
                None
            };
            let leader = home.unwrap_or(var.id);
            leader_of.push(leader);
            classes
                .entry(leader)
                .or_insert_with(|| EqualityClass {
                    leader,
                    members: Vec::new(),
                    samples: 0,
                })
                .members
                .push(var.id);
        }
        Self { leader_of, classes }
    }

    #[must_use]
    pub fn var_count(&self) -> usize {
        self.leader_of.len()
    }

    /// Leader of the class holding `var`.
    pub fn leader_of(&self, var: VarId) -> Result<VarId> {
        self.leader_of
            .get(var.index())
            .copied()
            .ok_or_else(|| InferError::internal(format!("{var} is outside the partition")))
    }

    #[must_use]
    pub fn is_leader(&self, var: VarId) -> bool {
        self.classes.contains_key(&var)
    }

    /// Current leaders, ascending.
    pub fn leaders(&self) -> impl Iterator<Item = VarId> + '_ {
        self.classes.keys().copied()
    }

    #[must_use]
    pub fn class(&self, leader: VarId) -> Option<&EqualityClass> {
        self.classes.get(&leader)
    }

    /// Members of the class holding `var`; empty for unknown variables.
    #[must_use]
    pub fn class_of(&self, var: VarId) -> &[VarId] {
        self.leader_of
            .get(var.index())
            .and_then(|leader| self.classes.get(leader))
            .map_or(&[], |c| c.members.as_slice())
    }

    pub fn classes(&self) -> impl Iterator<Item = &EqualityClass> + '_ {
        self.classes.values()
    }

    /// Split every class the sample disagrees with, then count the sample.
    pub fn observe(&mut self, sample: &ValueTuple) -> Result<Vec<SplitEvent>> {
        if sample.len() != self.leader_of.len() {
            return Err(InferError::internal(format!(
                "equality partition over {} variables got a sample of {}",
                self.leader_of.len(),
                sample.len()
            )));
        }
        let mut events = Vec::new();
        let mut fresh: Vec<EqualityClass> = Vec::new();
        for class in self.classes.values_mut() {
            if class.members.len() < 2 {
                continue;
            }
            let groups = group_by_value(&class.members, sample);
            if groups.len() == 1 {
                continue;
            }
            let mut event = SplitEvent {
                old_leader: class.leader,
                new_leaders: SmallVec::new(),
                moved: Vec::new(),
            };
            for group in groups {
                if group.contains(&class.leader) {
                    class.members = group;
                    continue;
                }
                event.new_leaders.push(group[0]);
                event.moved.extend(group.iter().copied());
                fresh.push(EqualityClass {
                    leader: group[0],
                    members: group,
                    samples: class.samples,
                });
            }
            event.new_leaders.sort_unstable();
            event.moved.sort_unstable();
            events.push(event);
        }
        for class in fresh {
            for member in &class.members {
                self.leader_of[member.index()] = class.leader;
            }
            self.classes.insert(class.leader, class);
        }
        for class in self.classes.values_mut() {
            class.samples += 1;
        }
        Ok(events)
    }
}

/// Partition `members` (ascending) by the value they carry in `sample`.
/// Missing values group together. Groups keep ascending order.
fn group_by_value(members: &[VarId], sample: &ValueTuple) -> Vec<Vec<VarId>> {
    let mut keys: Vec<Option<&Value>> = Vec::new();
    let mut groups: Vec<Vec<VarId>> = Vec::new();
    for &member in members {
        let key = if sample.is_missing(member) {
            None
        } else {
            sample.value(member)
        };
        let slot = keys.iter().position(|k| match (k, key) {
            (Some(a), Some(b)) => a.same(b) || *a == b,
            (None, None) => true,
            _ => false,
        });
        if let Some(slot) = slot {
            groups[slot].push(member);
        } else {
            keys.push(key);
            groups.push(vec![member]);
        }
    }
    groups
}
