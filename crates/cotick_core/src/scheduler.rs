//! Coroutine scheduler
//!
//! Owns the registry of running coroutines and resumes each of them once per
//! [`Scheduler::tick`].
//!
//! Every method takes `&self`, so a coroutine holding an `Rc<Scheduler>` may
//! register, deregister, clear or stop while a tick is in progress, but not
//! tick again. The coroutine being resumed is moved out of its slot for the
//! duration of the call, which keeps the registry free to borrow.
//!
//! Guarantees for one tick pass:
//! - only coroutines registered before the pass started are resumed, each at
//!   most once, in registration order
//! - completed coroutines are retired in one batch at the end of the pass
//! - survivors keep their relative order

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::coroutine::{BoxedCoroutine, Coroutine, Source, Step};
use crate::drive::{Continuation, Schedule};
use crate::error::{CoroutineError, Result};

new_key_type! {
    /// Handle to a registered coroutine
    pub struct CoroutineId;
}

static NEXT_NAME: AtomicU64 = AtomicU64::new(1);

fn generate_name() -> String {
    format!("Scheduler.{}", NEXT_NAME.fetch_add(1, Ordering::Relaxed))
}

#[derive(Default)]
struct Registry {
    /// `None` while the coroutine is being resumed
    slots: SlotMap<CoroutineId, Option<BoxedCoroutine>>,
    order: Vec<CoroutineId>,
}

impl Registry {
    fn retire(&mut self, finished: &[CoroutineId]) {
        if finished.is_empty() {
            return;
        }
        for &id in finished {
            self.slots.remove(id);
        }
        self.order.retain(|id| !finished.contains(id));
    }
}

/// The scheduler that ticks all registered coroutines
pub struct Scheduler {
    name: String,
    active: Cell<bool>,
    ticking: Cell<bool>,
    registry: RefCell<Registry>,
    failure: RefCell<Option<CoroutineError>>,
}

impl Scheduler {
    /// Create a scheduler with a generated name
    pub fn new() -> Self {
        Self::with_name(generate_name())
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: Cell::new(true),
            ticking: Cell::new(false),
            registry: RefCell::new(Registry::default()),
            failure: RefCell::new(None),
        }
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a coroutine. It is first resumed by the next tick.
    pub fn register<C: Coroutine + 'static>(&self, coroutine: C) -> CoroutineId {
        self.register_source(Source::ready(coroutine))
    }

    /// Register the coroutine produced by `factory`, which is called right away.
    pub fn register_with<F, C>(&self, factory: F) -> CoroutineId
    where
        F: FnOnce() -> C + 'static,
        C: Coroutine + 'static,
    {
        self.register_source(Source::factory(factory))
    }

    pub fn register_source(&self, source: Source) -> CoroutineId {
        // Resolve before borrowing: the factory may touch the scheduler.
        let coroutine = source.resolve();
        let mut registry = self.registry.borrow_mut();
        let id = registry.slots.insert(Some(coroutine));
        registry.order.push(id);
        tracing::trace!(scheduler = %self.name, ?id, "coroutine registered");
        id
    }

    /// Remove a coroutine. Returns whether it was still registered.
    ///
    /// Removing a handle that already completed or was removed is a no-op.
    pub fn deregister(&self, id: CoroutineId) -> bool {
        let removed = {
            let mut registry = self.registry.borrow_mut();
            let removed = registry.slots.remove(id);
            if removed.is_some() {
                registry.order.retain(|&other| other != id);
            }
            removed
        };
        match removed {
            Some(_) => {
                tracing::trace!(scheduler = %self.name, ?id, "coroutine deregistered");
                true
            }
            None => false,
        }
    }

    /// Discard every registered coroutine without resuming it again
    pub fn clear(&self) {
        // Draining bumps slot versions, so stale handles never alias new ones.
        let dropped: Vec<_> = {
            let mut registry = self.registry.borrow_mut();
            registry.order.clear();
            registry.slots.drain().map(|(_, slot)| slot).collect()
        };
        tracing::trace!(scheduler = %self.name, count = dropped.len(), "registry cleared");
        drop(dropped);
    }

    /// Resume every registered coroutine once, in registration order.
    ///
    /// The first failing resumption aborts the pass: coroutines after it are
    /// not resumed this tick. The failing coroutine is retired along with any
    /// that completed earlier in the pass.
    ///
    /// Calling `tick` from inside a resumption fails with
    /// [`CoroutineError::ReentrantTick`] and resumes nothing.
    pub fn tick(&self) -> Result<()> {
        if self.ticking.replace(true) {
            tracing::warn!(scheduler = %self.name, "tick called during a tick pass");
            return Err(CoroutineError::ReentrantTick);
        }
        let _pass_guard = PassGuard(&self.ticking);

        let pass: SmallVec<[CoroutineId; 16]> =
            self.registry.borrow().order.iter().copied().collect();
        let mut finished: SmallVec<[CoroutineId; 8]> = SmallVec::new();

        for id in pass {
            let taken = self
                .registry
                .borrow_mut()
                .slots
                .get_mut(id)
                .and_then(Option::take);
            // Removed earlier in this pass
            let Some(mut coroutine) = taken else {
                continue;
            };

            match coroutine.resume() {
                Ok(Step::Pending) => self.restore(id, coroutine),
                Ok(Step::Complete) => {
                    drop(coroutine);
                    finished.push(id);
                }
                Err(err) => {
                    drop(coroutine);
                    finished.push(id);
                    self.retire(&finished);
                    tracing::error!(scheduler = %self.name, ?id, error = %err, "coroutine failed");
                    return Err(err);
                }
            }
        }

        self.retire(&finished);
        Ok(())
    }

    fn restore(&self, id: CoroutineId, coroutine: BoxedCoroutine) {
        let orphan = match self.registry.borrow_mut().slots.get_mut(id) {
            Some(slot) => {
                *slot = Some(coroutine);
                None
            }
            // Deregistered or cleared during its own resumption
            None => Some(coroutine),
        };
        drop(orphan);
    }

    fn retire(&self, finished: &[CoroutineId]) {
        if finished.is_empty() {
            return;
        }
        self.registry.borrow_mut().retire(finished);
        tracing::trace!(scheduler = %self.name, count = finished.len(), "coroutines retired");
    }

    /// Tick now, then keep ticking through `source` while active.
    ///
    /// Only one continuation is ever outstanding. Calling [`Scheduler::stop`]
    /// lets the outstanding continuation fire once more and schedules nothing
    /// after it. A failing tick stops the loop; the error is kept for
    /// [`Scheduler::take_failure`].
    ///
    /// Continuations hold `source` weakly, so the caller must keep it alive.
    /// Dropping the last `Rc` to the source ends the loop and frees the
    /// continuation it had queued.
    pub fn run(self: &Rc<Self>, source: Rc<dyn Schedule>) {
        tracing::debug!(scheduler = %self.name, "drive loop started");
        drive(Rc::clone(self), Rc::downgrade(&source));
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Stop scheduling further ticks from [`Scheduler::run`]
    pub fn stop(&self) {
        self.set_active(false);
    }

    /// The error that stopped the drive loop, if any
    pub fn take_failure(&self) -> Option<CoroutineError> {
        self.failure.borrow_mut().take()
    }

    /// Check whether a handle is still registered
    pub fn contains(&self, id: CoroutineId) -> bool {
        self.registry.borrow().slots.contains_key(id)
    }

    /// Handles in registration order
    pub fn ids(&self) -> Vec<CoroutineId> {
        self.registry.borrow().order.clone()
    }

    /// Get the number of registered coroutines
    pub fn len(&self) -> usize {
        self.registry.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears the ticking flag when a pass ends, including by unwinding
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn drive(scheduler: Rc<Scheduler>, source: Weak<dyn Schedule>) {
    if let Err(err) = scheduler.tick() {
        scheduler.stop();
        *scheduler.failure.borrow_mut() = Some(err);
        tracing::debug!(scheduler = %scheduler.name, "drive loop stopped by failure");
        return;
    }
    if !scheduler.is_active() {
        tracing::debug!(scheduler = %scheduler.name, "drive loop stopped");
        return;
    }
    let Some(target) = source.upgrade() else {
        tracing::debug!(scheduler = %scheduler.name, "drive loop stopped, source dropped");
        return;
    };
    let continuation: Continuation = Box::new(move || drive(scheduler, source));
    target.schedule(continuation);
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("active", &self.active.get())
            .field("len", &self.len())
            .finish()
    }
}
