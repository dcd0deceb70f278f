//! Batches of animations started together.

use std::fmt;

use crate::animation::Animation;
use crate::deferred::Deferred;
use crate::error::AnimationError;
use crate::options::StopOptions;
use crate::types::NodeId;

/// Animations created by one request, with a combined result.
///
/// The combined deferred fulfils with every target, in member order, once all
/// members fulfil, and rejects with the first member rejection.
#[derive(Clone)]
pub struct AnimationSet {
    animations: Vec<Animation>,
    deferred: Deferred<Vec<NodeId>>,
}

impl AnimationSet {
    pub fn new(animations: Vec<Animation>) -> Self {
        let members: Vec<Deferred<NodeId>> = animations.iter().map(Animation::deferred).collect();
        let deferred = Deferred::all(&members);
        Self {
            animations,
            deferred,
        }
    }

    /// Stop every member, including members that already settled.
    pub fn stop(&self, options: StopOptions) {
        for animation in &self.animations {
            animation.stop(options);
        }
    }

    pub fn then(
        &self,
        on_fulfilled: impl FnOnce(Vec<NodeId>) + 'static,
        on_rejected: impl FnOnce(AnimationError) + 'static,
    ) -> &Self {
        self.deferred.then(on_fulfilled, on_rejected);
        self
    }

    pub fn catch(&self, on_rejected: impl FnOnce(AnimationError) + 'static) -> &Self {
        self.deferred.catch(on_rejected);
        self
    }

    pub fn finally(&self, on_settled: impl FnOnce() + 'static) -> &Self {
        self.deferred.finally(on_settled);
        self
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// The combined result; await it or attach reactions.
    pub fn deferred(&self) -> Deferred<Vec<NodeId>> {
        self.deferred.clone()
    }
}

impl fmt::Debug for AnimationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSet")
            .field("animations", &self.animations)
            .field("deferred", &self.deferred)
            .finish()
    }
}
