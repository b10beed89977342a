//! Cotick Core Runtime
//!
//! Cooperative, single-threaded coroutines driven one tick at a time:
//!
//! - **Coroutines**: explicit state objects resumed until they complete
//! - **Suspension Primitives**: wait for seconds, frames, or a predicate
//! - **Scheduler**: ordered registry resumed once per tick
//! - **Drive Loop**: repeated ticks through an injected scheduling source
//! - **Clock**: swappable shared time source
//!
//! # Example
//!
//! ```rust
//! use cotick_core::{wait_frames, wait_with_clock, CoroutineExt, ManualClock, Scheduler};
//!
//! let clock = ManualClock::new(0.0);
//! let scheduler = Scheduler::new();
//!
//! let id = scheduler.register(wait_frames(2).then(wait_with_clock(1.0, clock.clock())));
//!
//! scheduler.tick().unwrap();
//! scheduler.tick().unwrap();
//! assert!(scheduler.contains(id));
//!
//! clock.advance(1.0);
//! scheduler.tick().unwrap();
//! assert!(!scheduler.contains(id));
//! ```

pub mod clock;
pub mod coroutine;
pub mod drive;
pub mod error;
pub mod scheduler;
pub mod wait;

pub use clock::{set_clock, Clock, ClockFn, ManualClock};
pub use coroutine::{from_fn, BoxedCoroutine, Coroutine, CoroutineExt, Sequence, Source, Step};
pub use drive::{Continuation, EventLoop, FramePacer, Schedule};
pub use error::{CoroutineError, Result};
pub use scheduler::{CoroutineId, Scheduler};
pub use wait::{wait, wait_frames, wait_until, wait_while, wait_with_clock};
