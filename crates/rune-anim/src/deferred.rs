//! Single-assignment deferred results.
//!
//! A [`Deferred`] starts pending and settles exactly once, either fulfilled
//! with a value or rejected with an [`AnimationError`]. Reactions can be
//! attached with `then`/`catch`/`finally`, or the deferred can be awaited
//! directly since it implements [`Future`].
//!
//! ```
//! use rune_anim::Deferred;
//!
//! let parts = vec![Deferred::fulfilled(1), Deferred::fulfilled(2)];
//! let combined = Deferred::all(&parts);
//! combined.then(|values| assert_eq!(values, vec![1, 2]), |_| unreachable!());
//! ```
//!
//! Reactions attached before settlement run, in registration order, at the
//! moment of settlement. Reactions attached afterwards run immediately. A
//! panicking reaction is logged and does not prevent the others from running.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::warn;

use crate::error::{AnimationError, panic_message};

/// Terminal value of a deferred result.
pub type Outcome<T> = std::result::Result<T, AnimationError>;

type Reaction<T> = Box<dyn FnOnce(&Outcome<T>)>;

struct Inner<T> {
    outcome: Option<Outcome<T>>,
    reactions: Vec<Reaction<T>>,
    wakers: Vec<Waker>,
}

/// Shared handle to a promise-like value. Clones observe the same result.
pub struct Deferred<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Deferred<T> {
    /// A pending deferred.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                outcome: None,
                reactions: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// An already fulfilled deferred.
    pub fn fulfilled(value: T) -> Self {
        let deferred = Self::new();
        deferred.fulfill(value);
        deferred
    }

    /// An already rejected deferred.
    pub fn rejected(error: AnimationError) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    /// Fulfil with `value`. Returns `false` if already settled.
    pub fn fulfill(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: AnimationError) -> bool {
        self.settle(Err(error))
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        let (reactions, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.outcome.is_some() {
                return false;
            }
            inner.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut inner.reactions),
                std::mem::take(&mut inner.wakers),
            )
        };

        for reaction in reactions {
            run_reaction(reaction, &outcome);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Run `reaction` once the deferred settles (immediately if it already has).
    pub fn on_settle(&self, reaction: impl FnOnce(&Outcome<T>) + 'static) {
        let settled = self.inner.borrow().outcome.clone();
        match settled {
            Some(outcome) => run_reaction(Box::new(reaction), &outcome),
            None => self.inner.borrow_mut().reactions.push(Box::new(reaction)),
        }
    }

    /// Attach fulfilment and rejection handlers.
    pub fn then(
        &self,
        on_fulfilled: impl FnOnce(T) + 'static,
        on_rejected: impl FnOnce(AnimationError) + 'static,
    ) -> &Self {
        self.on_settle(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value.clone()),
            Err(error) => on_rejected(error.clone()),
        });
        self
    }

    /// Attach a rejection handler only.
    pub fn catch(&self, on_rejected: impl FnOnce(AnimationError) + 'static) -> &Self {
        self.on_settle(move |outcome| {
            if let Err(error) = outcome {
                on_rejected(error.clone());
            }
        });
        self
    }

    /// Attach a handler run on either outcome.
    pub fn finally(&self, on_settled: impl FnOnce() + 'static) -> &Self {
        self.on_settle(move |_| on_settled());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.inner.borrow().outcome.is_none()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.inner.borrow().outcome, Some(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.borrow().outcome, Some(Err(_)))
    }

    /// The settled outcome, if any.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.inner.borrow().outcome.clone()
    }

    /// Combine deferreds: fulfils with every value in input order once all
    /// fulfil, rejects with the first rejection. Members that have already
    /// settled are accounted for immediately.
    pub fn all(members: &[Deferred<T>]) -> Deferred<Vec<T>> {
        let combined = Deferred::new();
        if members.is_empty() {
            combined.fulfill(Vec::new());
            return combined;
        }

        let slots: Rc<RefCell<Vec<Option<T>>>> =
            Rc::new(RefCell::new((0..members.len()).map(|_| None).collect()));
        let remaining = Rc::new(Cell::new(members.len()));

        for (index, member) in members.iter().enumerate() {
            let combined = combined.clone();
            let slots = Rc::clone(&slots);
            let remaining = Rc::clone(&remaining);
            member.on_settle(move |outcome| match outcome {
                Ok(value) => {
                    slots.borrow_mut()[index] = Some(value.clone());
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let values: Vec<T> = slots.borrow_mut().drain(..).flatten().collect();
                        combined.fulfill(values);
                    }
                }
                Err(error) => {
                    combined.reject(error.clone());
                }
            });
        }

        combined
    }
}

/// Run one reaction, containing a panic so the remaining reactions and the
/// settling caller (usually the animation loop) carry on.
fn run_reaction<T: 'static>(reaction: Reaction<T>, outcome: &Outcome<T>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| reaction(outcome))) {
        warn!(message = %panic_message(payload.as_ref()), "deferred reaction panicked");
    }
}

impl<T: Clone + 'static> Future for Deferred<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        if let Some(outcome) = &inner.outcome {
            return Poll::Ready(outcome.clone());
        }
        if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut s = f.debug_struct("Deferred");
        match &inner.outcome {
            None => s.field("state", &"pending"),
            Some(Ok(value)) => s.field("fulfilled", value),
            Some(Err(error)) => s.field("rejected", error),
        };
        s.field("reactions", &inner.reactions.len()).finish()
    }
}
