//! Registry of active animations, keyed by node.
//!
//! Several animations may target the same node at once (one fading, another
//! moving it). Insertion order is preserved both within a node's list and
//! across nodes, and a node is only present while it has at least one
//! animation. Mutation is reserved to the crate: animations register and
//! deregister themselves and the loop drops finished ones.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::animation::Animation;
use crate::types::NodeId;

#[derive(Debug, Default)]
pub(crate) struct AnimationRegistry {
    entries: HashMap<NodeId, Vec<Animation>>,
    /// Node insertion order.
    order: Vec<NodeId>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, animation: Animation) {
        match self.entries.entry(animation.target().clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(animation),
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(vec![animation]);
            }
        }
    }

    /// Remove `animation` from its node's list. Returns whether it was present.
    pub(crate) fn deregister(&mut self, animation: &Animation) -> bool {
        let target = animation.target();
        let before = self.entries.get(target).map_or(0, Vec::len);
        self.retain(target, |a| !a.ptr_eq(animation));
        before != self.entries.get(target).map_or(0, Vec::len)
    }

    /// Keep only the animations of `target` matching `keep`, deleting the
    /// node entry if none remain.
    pub(crate) fn retain(&mut self, target: &NodeId, keep: impl FnMut(&Animation) -> bool) {
        let Some(list) = self.entries.get_mut(target) else {
            return;
        };
        list.retain(keep);
        if list.is_empty() {
            self.entries.remove(target);
            self.order.retain(|id| id != target);
        }
    }

    /// Copy of every entry in registry order, for iteration while the
    /// registry itself may change.
    pub(crate) fn snapshot(&self) -> Vec<(NodeId, Vec<Animation>)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|list| (id.clone(), list.clone())))
            .collect()
    }

    /// Animations registered for `target`, oldest first.
    pub fn get(&self, target: &NodeId) -> Option<&[Animation]> {
        self.entries.get(target).map(Vec::as_slice)
    }

    pub fn contains(&self, target: &NodeId) -> bool {
        self.entries.contains_key(target)
    }

    /// Nodes with at least one animation, in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.order.iter()
    }

    /// Number of nodes with animations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of registered animations across all nodes.
    pub fn animation_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
