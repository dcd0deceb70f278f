//! Animation lifecycle events.
//!
//! The timeline records an event whenever an animation is registered, renders
//! its final frame, or is abandoned. Hosts poll them after pumping ticks:
//!
//! ```ignore
//! for event in timeline.drain_events() {
//!     if let AnimationEvent::Ended { node_id, .. } = event {
//!         println!("{} settled", node_id);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::{AnimationId, NodeId};

/// Why an animation stopped without finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// `stop` was called with `finish: false`.
    Stopped,
    /// The frame callback panicked.
    CallbackPanicked,
}

/// Event emitted when an animation changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// Animation was registered for a node.
    Started {
        animation_id: AnimationId,
        node_id: NodeId,
    },
    /// Animation rendered its final frame and fulfilled.
    Ended {
        animation_id: AnimationId,
        node_id: NodeId,
    },
    /// Animation was abandoned and rejected.
    Cancelled {
        animation_id: AnimationId,
        node_id: NodeId,
        reason: CancelReason,
    },
}

impl AnimationEvent {
    /// Get the node ID for this event.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Started { node_id, .. }
            | Self::Ended { node_id, .. }
            | Self::Cancelled { node_id, .. } => node_id,
        }
    }

    /// Get the animation ID for this event.
    pub fn animation_id(&self) -> AnimationId {
        match self {
            Self::Started { animation_id, .. }
            | Self::Ended { animation_id, .. }
            | Self::Cancelled { animation_id, .. } => *animation_id,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Queue for collecting animation events between polls.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    events: VecDeque<AnimationEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AnimationEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Pop the next event from the queue.
    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.events.pop_front()
    }

    /// Drain all events from the queue, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain(..)
    }

    /// Get events for a specific node.
    pub fn events_for_node(&self, node_id: &NodeId) -> Vec<&AnimationEvent> {
        self.events
            .iter()
            .filter(|e| e.node_id() == node_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: u64, node: &str) -> AnimationEvent {
        AnimationEvent::Started {
            animation_id: AnimationId(id),
            node_id: NodeId::from(node),
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = AnimationEvent::Cancelled {
            animation_id: AnimationId(7),
            node_id: NodeId::from("node_1"),
            reason: CancelReason::Stopped,
        };

        assert_eq!(event.node_id().as_str(), "node_1");
        assert_eq!(event.animation_id(), AnimationId(7));
        assert!(event.is_cancelled());
        assert!(!event.is_started());
        assert!(!event.is_ended());
    }

    #[test]
    fn test_event_queue_operations() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.push(started(1, "a"));
        queue.push(AnimationEvent::Ended {
            animation_id: AnimationId(1),
            node_id: NodeId::from("a"),
        });
        assert_eq!(queue.len(), 2);

        assert!(queue.pop().is_some_and(|e| e.is_started()));
        assert!(queue.pop().is_some_and(|e| e.is_ended()));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_event_queue_events_for_node() {
        let mut queue = EventQueue::new();
        queue.push(started(1, "node_1"));
        queue.push(started(2, "node_2"));
        queue.push(started(3, "node_1"));

        assert_eq!(queue.events_for_node(&NodeId::from("node_1")).len(), 2);
        assert_eq!(queue.events_for_node(&NodeId::from("node_2")).len(), 1);
        assert!(queue.events_for_node(&NodeId::from("node_3")).is_empty());

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(queue.is_empty());
    }
}
