//! Scheduling sources for the drive loop
//!
//! [`Scheduler::run`](crate::Scheduler::run) never decides *when* the next
//! tick happens. It hands a continuation to a [`Schedule`] implementation,
//! which promises to invoke it exactly once, later.
//!
//! Two sources are provided:
//! - [`EventLoop`]: runs each continuation on a later turn of a local queue,
//!   as fast as the host pumps it
//! - [`FramePacer`]: runs continuations at most once per frame of a fixed
//!   frame rate, sleeping between frames
//!
//! Any `Fn(Continuation)` closure is a source too. The drive loop holds its
//! source weakly, so whoever starts the loop owns the source.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A deferred step of the drive loop
pub type Continuation = Box<dyn FnOnce()>;

/// Source of "call me later" requests.
///
/// Implementations must invoke each continuation exactly once and never from
/// inside `schedule` itself.
pub trait Schedule {
    fn schedule(&self, continuation: Continuation);
}

impl<F: Fn(Continuation)> Schedule for F {
    fn schedule(&self, continuation: Continuation) {
        self(continuation)
    }
}

/// A single-threaded run queue
#[derive(Default)]
pub struct EventLoop {
    queue: RefCell<VecDeque<Continuation>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of continuations waiting to run
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the oldest continuation. Returns false if the queue was empty.
    pub fn turn(&self) -> bool {
        // Pop before calling: the continuation usually schedules another.
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(continuation) => {
                continuation();
                true
            }
            None => false,
        }
    }

    /// Turn until the queue is empty or `max_turns` is reached.
    ///
    /// Returns the number of turns taken.
    pub fn run(&self, max_turns: Option<u64>) -> u64 {
        let mut turns = 0;
        while max_turns.map_or(true, |max| turns < max) && self.turn() {
            turns += 1;
        }
        turns
    }
}

impl Schedule for EventLoop {
    fn schedule(&self, continuation: Continuation) {
        self.queue.borrow_mut().push_back(continuation);
    }
}

/// Runs continuations once per frame at a fixed rate.
///
/// Continuations scheduled while a frame is being processed land in the next
/// frame, so a drive loop advances by exactly one tick per frame.
pub struct FramePacer {
    interval: Duration,
    next_frame: Cell<Option<Instant>>,
    frame_index: Cell<u64>,
    queue: RefCell<Vec<Continuation>>,
}

impl FramePacer {
    /// Create a pacer for `fps` frames per second. Zero is treated as one.
    pub fn new(fps: u32) -> Self {
        Self::with_interval(Duration::from_secs(1) / fps.max(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            next_frame: Cell::new(None),
            frame_index: Cell::new(0),
            queue: RefCell::new(Vec::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames run so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index.get()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Wait for the next frame boundary and run everything queued before it.
    ///
    /// Returns false without waiting if nothing is queued.
    pub fn frame(&self) -> bool {
        if self.queue.borrow().is_empty() {
            return false;
        }

        let now = Instant::now();
        let deadline = self.next_frame.get().unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // Fall behind rather than burst when a frame overran.
        self.next_frame
            .set(Some(deadline.max(Instant::now()) + self.interval));

        let due = std::mem::take(&mut *self.queue.borrow_mut());
        for continuation in due {
            continuation();
        }
        self.frame_index.set(self.frame_index.get().wrapping_add(1));
        true
    }

    /// Run frames until nothing is queued or `max_frames` is reached.
    ///
    /// Returns the number of frames run.
    pub fn run(&self, max_frames: Option<u64>) -> u64 {
        let mut frames = 0;
        while max_frames.map_or(true, |max| frames < max) && self.frame() {
            frames += 1;
        }
        frames
    }
}

impl Schedule for FramePacer {
    fn schedule(&self, continuation: Continuation) {
        self.queue.borrow_mut().push(continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coroutine::{from_fn, Step};
    use crate::error::CoroutineError;
    use crate::wait::wait_frames;
    use crate::Scheduler;
    use std::rc::Rc;

    #[test]
    fn test_event_loop_runs_in_order() {
        let event_loop = EventLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            event_loop.schedule(Box::new(move || log.borrow_mut().push(i)));
        }

        assert_eq!(event_loop.pending(), 3);
        assert_eq!(event_loop.run(None), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!event_loop.turn());
    }

    #[test]
    fn test_run_ticks_until_stopped() {
        let event_loop = Rc::new(EventLoop::new());
        let scheduler = Rc::new(Scheduler::new());
        let ticks = Rc::new(Cell::new(0));

        let count = ticks.clone();
        let handle = Rc::clone(&scheduler);
        scheduler.register(from_fn(move || {
            count.set(count.get() + 1);
            if count.get() == 4 {
                handle.stop();
            }
            Ok(Step::Pending)
        }));

        scheduler.run(event_loop.clone());
        // First tick runs synchronously, one continuation outstanding
        assert_eq!(ticks.get(), 1);
        assert_eq!(event_loop.pending(), 1);

        event_loop.run(None);
        assert_eq!(ticks.get(), 4);
        assert_eq!(event_loop.pending(), 0);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_stop_lets_pending_continuation_fire() {
        let event_loop = Rc::new(EventLoop::new());
        let scheduler = Rc::new(Scheduler::new());
        let ticks = Rc::new(Cell::new(0));
        let count = ticks.clone();
        scheduler.register(from_fn(move || {
            count.set(count.get() + 1);
            Ok(Step::Pending)
        }));

        scheduler.run(event_loop.clone());
        scheduler.stop();
        assert_eq!(event_loop.run(None), 1);
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn test_run_keeps_one_request_in_flight() {
        let event_loop = Rc::new(EventLoop::new());
        let scheduler = Rc::new(Scheduler::new());
        scheduler.register(wait_frames(100));

        scheduler.run(event_loop.clone());
        for _ in 0..10 {
            assert_eq!(event_loop.pending(), 1);
            event_loop.turn();
        }
    }

    #[test]
    fn test_failure_stops_drive_loop() {
        let event_loop = Rc::new(EventLoop::new());
        let scheduler = Rc::new(Scheduler::new());
        let mut frames = 0;
        scheduler.register(from_fn(move || {
            frames += 1;
            if frames == 3 {
                return Err(CoroutineError::failed("third frame"));
            }
            Ok(Step::Pending)
        }));

        scheduler.run(event_loop.clone());
        assert_eq!(event_loop.run(Some(100)), 2);
        assert!(!scheduler.is_active());
        assert_eq!(
            scheduler.take_failure(),
            Some(CoroutineError::failed("third frame"))
        );
        assert_eq!(scheduler.take_failure(), None);
    }

    #[test]
    fn test_closure_source() {
        let queue: Rc<RefCell<Vec<Continuation>>> = Rc::default();
        let sink = queue.clone();
        let source: Rc<dyn Schedule> = Rc::new(move |c: Continuation| sink.borrow_mut().push(c));

        let scheduler = Rc::new(Scheduler::new());
        scheduler.register(wait_frames(2));
        scheduler.run(source.clone());
        assert_eq!(queue.borrow().len(), 1);
        assert_eq!(scheduler.len(), 1);

        let next = queue.borrow_mut().remove(0);
        next();
        assert!(scheduler.is_empty());
        assert_eq!(queue.borrow().len(), 1);
    }

    #[test]
    fn test_dropped_source_ends_loop() {
        let queue: Rc<RefCell<Vec<Continuation>>> = Rc::default();
        let sink = queue.clone();
        let source: Rc<dyn Schedule> = Rc::new(move |c: Continuation| sink.borrow_mut().push(c));

        let scheduler = Rc::new(Scheduler::new());
        let ticks = Rc::new(Cell::new(0));
        let count = ticks.clone();
        scheduler.register(from_fn(move || {
            count.set(count.get() + 1);
            Ok(Step::Pending)
        }));
        scheduler.run(source.clone());
        drop(source);

        // The queued continuation still ticks but has nowhere to reschedule
        let next = queue.borrow_mut().remove(0);
        next();
        assert_eq!(ticks.get(), 2);
        assert!(queue.borrow().is_empty());
        assert!(scheduler.is_active());
    }

    #[test]
    fn test_abandoned_event_loop_frees_scheduler() {
        let event_loop = Rc::new(EventLoop::new());
        let scheduler = Rc::new(Scheduler::new());
        scheduler.register(wait_frames(100));

        scheduler.run(event_loop.clone());
        assert_eq!(event_loop.run(Some(3)), 3);
        assert_eq!(event_loop.pending(), 1);

        let event_loop_ref = Rc::downgrade(&event_loop);
        let scheduler_ref = Rc::downgrade(&scheduler);
        drop(event_loop);
        drop(scheduler);
        assert!(event_loop_ref.upgrade().is_none());
        assert!(scheduler_ref.upgrade().is_none());
    }

    #[test]
    fn test_abandoned_frame_pacer_frees_scheduler() {
        let pacer = Rc::new(FramePacer::with_interval(Duration::from_millis(1)));
        let scheduler = Rc::new(Scheduler::new());
        scheduler.register(wait_frames(100));

        scheduler.run(pacer.clone());
        assert_eq!(pacer.run(Some(2)), 2);
        assert_eq!(pacer.pending(), 1);

        let scheduler_ref = Rc::downgrade(&scheduler);
        drop(pacer);
        drop(scheduler);
        assert!(scheduler_ref.upgrade().is_none());
    }

    #[test]
    fn test_frame_pacer_runs_one_tick_per_frame() {
        let pacer = Rc::new(FramePacer::with_interval(Duration::from_millis(1)));
        let scheduler = Rc::new(Scheduler::new());
        let ticks = Rc::new(Cell::new(0));
        let count = ticks.clone();
        let handle = Rc::clone(&scheduler);
        scheduler.register(from_fn(move || {
            count.set(count.get() + 1);
            if count.get() == 3 {
                handle.stop();
            }
            Ok(Step::Pending)
        }));

        scheduler.run(pacer.clone());
        assert!(pacer.frame());
        assert_eq!(ticks.get(), 2);
        assert_eq!(pacer.frame_index(), 1);

        assert_eq!(pacer.run(Some(10)), 1);
        assert_eq!(ticks.get(), 3);
        assert!(!pacer.frame());
    }

    #[test]
    fn test_frame_pacer_zero_fps() {
        assert_eq!(FramePacer::new(0).interval(), Duration::from_secs(1));
        assert_eq!(FramePacer::new(4).interval(), Duration::from_millis(250));
    }
}
