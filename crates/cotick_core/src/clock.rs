//! Shared application clock
//!
//! Time-based coroutines read the elapsed application time, in seconds, from
//! a shared binding. By default that binding reads a monotonic wall clock;
//! [`set_clock`] swaps it for any other time source (a frame counter, a
//! recorded timeline, a [`ManualClock`] in tests).
//!
//! The binding is per thread. Coroutines are only ever resumed from the thread
//! that owns their scheduler, so there is nothing to synchronize.
//!
//! Swapping the clock does not rebase anything: a coroutine that captured a
//! start time under the old clock compares it against readings from the new
//! one, which can make it jump forward or stall.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Instant;

/// A nullary time source returning elapsed seconds
pub type ClockFn = Rc<dyn Fn() -> f64>;

thread_local! {
    static SHARED: RefCell<Option<ClockFn>> = const { RefCell::new(None) };
}

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Seconds elapsed since the first call in this process.
pub fn monotonic_seconds() -> f64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Read the shared clock.
pub fn now() -> f64 {
    // Clone out of the cell so the clock itself may call `set_clock`.
    let custom = SHARED.with(|shared| shared.borrow().clone());
    match custom {
        Some(clock) => clock(),
        None => monotonic_seconds(),
    }
}

/// Replace the shared clock. Takes effect on the next read.
pub fn set_clock<F: Fn() -> f64 + 'static>(clock: F) {
    SHARED.with(|shared| *shared.borrow_mut() = Some(Rc::new(clock)));
    tracing::trace!("shared clock replaced");
}

/// Restore the default monotonic clock.
pub fn reset_clock() {
    SHARED.with(|shared| *shared.borrow_mut() = None);
}

/// The time source a coroutine reads from
#[derive(Clone, Default)]
pub enum Clock {
    /// Whatever the shared binding is at the moment of each read
    #[default]
    Shared,
    /// A source captured by this coroutine alone
    Custom(ClockFn),
}

impl Clock {
    /// Capture a custom time source
    pub fn custom<F: Fn() -> f64 + 'static>(clock: F) -> Self {
        Clock::Custom(Rc::new(clock))
    }

    /// Current time in seconds
    pub fn read(&self) -> f64 {
        match self {
            Clock::Shared => now(),
            Clock::Custom(clock) => clock(),
        }
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clock::Shared => f.write_str("Clock::Shared"),
            Clock::Custom(_) => f.write_str("Clock::Custom(..)"),
        }
    }
}

/// A clock that only moves when told to.
///
/// Handy for offline stepping and for tests. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    seconds: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Rc::new(Cell::new(start)),
        }
    }

    pub fn now(&self) -> f64 {
        self.seconds.get()
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.seconds.set(self.seconds.get() + seconds);
    }

    /// A [`Clock::Custom`] reading this clock
    pub fn clock(&self) -> Clock {
        let seconds = Rc::clone(&self.seconds);
        Clock::custom(move || seconds.get())
    }

    /// Bind this clock as the shared clock for the current thread
    pub fn install(&self) {
        let seconds = Rc::clone(&self.seconds);
        set_clock(move || seconds.get());
    }
}
