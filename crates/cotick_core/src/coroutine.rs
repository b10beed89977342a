//! Resumable computations
//!
//! A coroutine is a state object with a single operation, [`Coroutine::resume`],
//! that runs it forward until it either suspends ([`Step::Pending`]) or
//! finishes ([`Step::Complete`]). Whatever progress it keeps between
//! resumptions is private to it.

use std::collections::VecDeque;
use std::fmt;

use crate::error::Result;

/// Outcome of a single resumption
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Suspended; expects to be resumed again
    Pending,
    /// Finished; must not be resumed again
    Complete,
}

impl Step {
    /// `Pending` while `condition` holds, `Complete` otherwise
    pub fn pending_if(condition: bool) -> Self {
        if condition {
            Step::Pending
        } else {
            Step::Complete
        }
    }

    pub fn is_complete(self) -> bool {
        self == Step::Complete
    }
}

/// A suspendable computation driven one step at a time
pub trait Coroutine {
    /// Run until the next suspension point or until finished.
    fn resume(&mut self) -> Result<Step>;
}

/// Owned, type-erased coroutine as stored by the scheduler
pub type BoxedCoroutine = Box<dyn Coroutine>;

impl<C: Coroutine + ?Sized> Coroutine for Box<C> {
    fn resume(&mut self) -> Result<Step> {
        (**self).resume()
    }
}

/// Something the scheduler can turn into a coroutine
pub enum Source {
    /// An already constructed coroutine
    Ready(BoxedCoroutine),
    /// A factory invoked once, at registration time
    Factory(Box<dyn FnOnce() -> BoxedCoroutine>),
}

impl Source {
    pub fn ready<C: Coroutine + 'static>(coroutine: C) -> Self {
        Source::Ready(Box::new(coroutine))
    }

    pub fn factory<F, C>(factory: F) -> Self
    where
        F: FnOnce() -> C + 'static,
        C: Coroutine + 'static,
    {
        Source::Factory(Box::new(move || Box::new(factory()) as BoxedCoroutine))
    }

    /// Produce the coroutine, calling the factory if there is one
    pub fn resolve(self) -> BoxedCoroutine {
        match self {
            Source::Ready(coroutine) => coroutine,
            Source::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ready(_) => f.write_str("Source::Ready(..)"),
            Source::Factory(_) => f.write_str("Source::Factory(..)"),
        }
    }
}

/// Coroutine backed by a closure; see [`from_fn`]
pub struct FromFn<F> {
    body: F,
}

/// Build a coroutine from a closure called once per resumption.
pub fn from_fn<F>(body: F) -> FromFn<F>
where
    F: FnMut() -> Result<Step>,
{
    FromFn { body }
}

impl<F> Coroutine for FromFn<F>
where
    F: FnMut() -> Result<Step>,
{
    fn resume(&mut self) -> Result<Step> {
        (self.body)()
    }
}

/// Runs coroutines one after another.
///
/// When a stage completes, the next stage starts within the same resumption,
/// so chaining never costs an extra tick. An empty sequence completes on its
/// first resumption.
#[derive(Default)]
pub struct Sequence {
    stages: VecDeque<BoxedCoroutine>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn then<C: Coroutine + 'static>(mut self, next: C) -> Self {
        self.stages.push_back(Box::new(next));
        self
    }

    /// Stages not yet completed
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl Coroutine for Sequence {
    fn resume(&mut self) -> Result<Step> {
        while let Some(stage) = self.stages.front_mut() {
            match stage.resume()? {
                Step::Pending => return Ok(Step::Pending),
                Step::Complete => {
                    self.stages.pop_front();
                }
            }
        }
        Ok(Step::Complete)
    }
}

/// Combinators available on every coroutine
pub trait CoroutineExt: Coroutine + Sized + 'static {
    /// Run `next` once `self` completes
    fn then<C: Coroutine + 'static>(self, next: C) -> Sequence {
        Sequence::new().then(self).then(next)
    }

    fn boxed(self) -> BoxedCoroutine {
        Box::new(self)
    }
}

impl<C: Coroutine + Sized + 'static> CoroutineExt for C {}
