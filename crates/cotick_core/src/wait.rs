//! Suspension primitives
//!
//! Small coroutines that do nothing but hold a slot in a sequence until some
//! condition is met. None of them know about the scheduler.

use crate::clock::Clock;
use crate::coroutine::{Coroutine, Step};
use crate::error::Result;

/// Suspends until a number of seconds has elapsed; see [`wait`]
#[derive(Debug, Clone)]
pub struct Wait {
    seconds: f64,
    clock: Clock,
    start: Option<f64>,
}

/// Wait for `seconds` of shared-clock time.
///
/// The start time is taken on the first resumption, not at construction.
/// A non-positive duration completes on the first resumption.
pub fn wait(seconds: f64) -> Wait {
    wait_with_clock(seconds, Clock::Shared)
}

/// Wait for `seconds` measured on `clock`.
pub fn wait_with_clock(seconds: f64, clock: Clock) -> Wait {
    Wait {
        seconds,
        clock,
        start: None,
    }
}

impl Coroutine for Wait {
    fn resume(&mut self) -> Result<Step> {
        if self.seconds <= 0.0 {
            return Ok(Step::Complete);
        }
        let now = self.clock.read();
        let start = *self.start.get_or_insert(now);
        Ok(Step::pending_if(now - start < self.seconds))
    }
}

/// Suspends for a number of resumptions; see [`wait_frames`]
#[derive(Debug, Clone)]
pub struct WaitFrames {
    remaining: i64,
}

/// Wait for `frames` resumptions.
///
/// The countdown is decremented before it is tested, so `wait_frames(3)`
/// completes on its third resumption and `wait_frames(0)` on its first.
pub fn wait_frames(frames: i64) -> WaitFrames {
    WaitFrames { remaining: frames }
}

impl Coroutine for WaitFrames {
    fn resume(&mut self) -> Result<Step> {
        self.remaining = self.remaining.saturating_sub(1);
        Ok(Step::pending_if(self.remaining > 0))
    }
}

/// Suspends until a predicate holds; see [`wait_until`]
pub struct WaitUntil<F> {
    predicate: F,
}

/// Wait until `predicate` returns true. It is evaluated on every resumption.
pub fn wait_until<F: FnMut() -> bool>(predicate: F) -> WaitUntil<F> {
    WaitUntil { predicate }
}

impl<F: FnMut() -> bool> Coroutine for WaitUntil<F> {
    fn resume(&mut self) -> Result<Step> {
        Ok(Step::pending_if(!(self.predicate)()))
    }
}

/// Suspends while a predicate holds; see [`wait_while`]
pub struct WaitWhile<F> {
    predicate: F,
}

/// Wait while `predicate` returns true. It is evaluated on every resumption.
pub fn wait_while<F: FnMut() -> bool>(predicate: F) -> WaitWhile<F> {
    WaitWhile { predicate }
}

impl<F: FnMut() -> bool> Coroutine for WaitWhile<F> {
    fn resume(&mut self) -> Result<Step> {
        Ok(Step::pending_if((self.predicate)()))
    }
}
