//! Demo timeline
//!
//! Waits, holds for a number of ticks, then tweens a marker to its target and
//! stops the drive loop. A watcher coroutine reports when the marker passes
//! the halfway point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use cotick_animation::{animate_with, AnimateConfig, Easing};
use cotick_core::clock::reset_clock;
use cotick_core::{
    from_fn, wait, wait_frames, wait_until, CoroutineExt, EventLoop, FramePacer, ManualClock,
    Scheduler, Step,
};

use crate::config::{CotickConfig, DriverKind};

#[derive(Debug, Default)]
struct Marker {
    position: f64,
}

/// What happened during a demo run
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub scheduler: String,
    pub ticks: u64,
    pub turns: u64,
    pub position: f64,
    pub finished: bool,
}

pub fn run(config: &CotickConfig) -> Result<DemoReport> {
    let easing: Easing = config.demo.easing.parse()?;
    let scheduler = Rc::new(match &config.scheduler.name {
        Some(name) => Scheduler::with_name(name.as_str()),
        None => Scheduler::new(),
    });
    let marker = Rc::new(RefCell::new(Marker::default()));
    let ticks = Rc::new(Cell::new(0u64));

    // Simulated time advances at the start of every tick.
    let simulated = config.demo.time_step.map(|step| {
        let clock = ManualClock::new(0.0);
        clock.install();
        (clock, step)
    });
    let tick_counter = Rc::clone(&ticks);
    scheduler.register(from_fn(move || {
        tick_counter.set(tick_counter.get() + 1);
        if let Some((clock, step)) = &simulated {
            clock.advance(*step);
        }
        Ok(Step::Pending)
    }));

    let target = config.demo.target;
    let watched = Rc::clone(&marker);
    scheduler.register(
        wait_until(move || watched.borrow().position.abs() >= (target / 2.0).abs())
            .then(from_fn(|| {
                tracing::info!("marker passed halfway");
                Ok(Step::Complete)
            })),
    );

    let stopper = Rc::clone(&scheduler);
    let hold_frames = config.demo.frames;
    scheduler.register(
        wait(config.demo.wait_seconds)
            .then(from_fn(move || {
                tracing::info!(frames = hold_frames, "wait finished, holding");
                Ok(Step::Complete)
            }))
            .then(wait_frames(hold_frames))
            .then(animate_with(
                Rc::clone(&marker),
                |m: &mut Marker| &mut m.position,
                target,
                AnimateConfig::default().with_easing(easing),
            ))
            .then(from_fn(move || {
                tracing::info!("timeline finished");
                stopper.stop();
                Ok(Step::Complete)
            })),
    );

    tracing::info!(scheduler = scheduler.name(), driver = ?config.driver.kind, "running demo");
    let max_turns = config.driver.max_turns;
    let turns = match config.driver.kind {
        DriverKind::EventLoop => {
            let event_loop = Rc::new(EventLoop::new());
            scheduler.run(event_loop.clone());
            event_loop.run(max_turns)
        }
        DriverKind::Frames => {
            let pacer = Rc::new(FramePacer::new(config.driver.fps));
            scheduler.run(pacer.clone());
            pacer.run(max_turns)
        }
    };

    let finished = !scheduler.is_active();
    scheduler.stop();
    scheduler.clear();
    if config.demo.time_step.is_some() {
        reset_clock();
    }
    if let Some(err) = scheduler.take_failure() {
        return Err(err.into());
    }
    if !finished {
        tracing::warn!(turns, "demo stopped before the timeline finished");
    }

    let position = marker.borrow().position;
    Ok(DemoReport {
        scheduler: scheduler.name().to_string(),
        ticks: ticks.get(),
        turns,
        position,
        finished,
    })
}
