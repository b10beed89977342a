//! Property tweens
//!
//! [`animate`] builds a coroutine that moves one property of a shared value
//! towards a destination, writing the property on every resumption.
//!
//! Progress advances by the raw clock time elapsed between resumptions, so
//! every tween lasts one second of accumulated clock time. Shape the curve
//! with [`AnimateConfig::with_easing`] or [`AnimateConfig::with_map`]; to run
//! slower or faster, hand the tween a scaled clock.
//!
//! Removing a tween from its scheduler before it finishes leaves the property
//! at the last value written.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cotick_core::{Clock, Coroutine, CoroutineError, Result, Step};

use crate::easing::Easing;

/// Values that can be blended linearly
pub trait Lerp: Clone {
    /// `to * t + from * (1 - t)`
    fn lerp(from: &Self, to: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        to * t + from * (1.0 - t)
    }
}

impl Lerp for f32 {
    fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        (*to as f64 * t + *from as f64 * (1.0 - t)) as f32
    }
}

impl<T: Lerp, const N: usize> Lerp for [T; N] {
    fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        std::array::from_fn(|i| T::lerp(&from[i], &to[i], t))
    }
}

/// Maps raw progress in `[0, 1)` onto the curve
pub type MapFn = Rc<dyn Fn(f64) -> f64>;

/// Produces the value at `(from, to, eased progress)`
pub type InterpolateFn<V> = Rc<dyn Fn(&V, &V, f64) -> V>;

/// How a tween reads time and shapes its values
pub struct AnimateConfig<V> {
    pub clock: Clock,
    pub map: MapFn,
    pub interpolate: InterpolateFn<V>,
}

impl<V> AnimateConfig<V> {
    /// Shared clock, identity map, and a custom interpolation
    pub fn with_interpolator<F>(interpolate: F) -> Self
    where
        F: Fn(&V, &V, f64) -> V + 'static,
    {
        Self {
            clock: Clock::Shared,
            map: Rc::new(|t: f64| t),
            interpolate: Rc::new(interpolate),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_map<F: Fn(f64) -> f64 + 'static>(mut self, map: F) -> Self {
        self.map = Rc::new(map);
        self
    }

    pub fn with_easing(self, easing: Easing) -> Self {
        self.with_map(move |t| easing.apply(t))
    }

    pub fn with_interpolate<F>(mut self, interpolate: F) -> Self
    where
        F: Fn(&V, &V, f64) -> V + 'static,
    {
        self.interpolate = Rc::new(interpolate);
        self
    }
}

impl<V: Lerp + 'static> Default for AnimateConfig<V> {
    fn default() -> Self {
        Self::with_interpolator(V::lerp)
    }
}

impl<V> Clone for AnimateConfig<V> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            map: Rc::clone(&self.map),
            interpolate: Rc::clone(&self.interpolate),
        }
    }
}

impl<V> fmt::Debug for AnimateConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimateConfig")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

struct Progress<V> {
    from: V,
    t: f64,
    last_time: f64,
}

/// A running tween; see [`animate`]
pub struct Animate<T, V, P> {
    target: Rc<RefCell<T>>,
    property: P,
    to: V,
    config: AnimateConfig<V>,
    progress: Option<Progress<V>>,
}

/// Tween `property` of `target` to `to` with the default configuration.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use cotick_animation::{animate_with, AnimateConfig};
/// use cotick_core::{ManualClock, Scheduler};
///
/// struct Sprite { x: f64 }
///
/// let clock = ManualClock::new(0.0);
/// let sprite = Rc::new(RefCell::new(Sprite { x: 0.0 }));
/// let scheduler = Scheduler::new();
/// scheduler.register(animate_with(
///     sprite.clone(),
///     |s: &mut Sprite| &mut s.x,
///     10.0,
///     AnimateConfig::default().with_clock(clock.clock()),
/// ));
///
/// scheduler.tick().unwrap();
/// clock.advance(1.0);
/// scheduler.tick().unwrap();
/// assert_eq!(sprite.borrow().x, 10.0);
/// assert!(scheduler.is_empty());
/// ```
pub fn animate<T, V, P>(target: Rc<RefCell<T>>, property: P, to: V) -> Animate<T, V, P>
where
    V: Lerp + 'static,
    P: Fn(&mut T) -> &mut V,
{
    animate_with(target, property, to, AnimateConfig::default())
}

/// Tween `property` of `target` to `to` with an explicit configuration.
pub fn animate_with<T, V, P>(
    target: Rc<RefCell<T>>,
    property: P,
    to: V,
    config: AnimateConfig<V>,
) -> Animate<T, V, P>
where
    V: Clone,
    P: Fn(&mut T) -> &mut V,
{
    Animate {
        target,
        property,
        to,
        config,
        progress: None,
    }
}

impl<T, V, P> Coroutine for Animate<T, V, P>
where
    V: Clone,
    P: Fn(&mut T) -> &mut V,
{
    fn resume(&mut self) -> Result<Step> {
        let now = self.config.clock.read();
        let mut target = self
            .target
            .try_borrow_mut()
            .map_err(|_| CoroutineError::TargetBorrowed)?;

        let property = &self.property;
        let progress = self.progress.get_or_insert_with(|| Progress {
            from: property(&mut *target).clone(),
            t: 0.0,
            last_time: now,
        });

        let delta = now - progress.last_time;
        progress.last_time = now;
        *property(&mut *target) =
            (self.config.interpolate)(&progress.from, &self.to, (self.config.map)(progress.t));
        progress.t += delta;

        if progress.t < 1.0 {
            return Ok(Step::Pending);
        }

        // Land exactly on the end of the curve.
        *property(&mut *target) =
            (self.config.interpolate)(&progress.from, &self.to, (self.config.map)(1.0));
        tracing::trace!(elapsed = progress.t, "animation finished");
        Ok(Step::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotick_core::clock::reset_clock;
    use cotick_core::{ManualClock, Scheduler};

    use crate::easing::Power;

    #[derive(Debug, Default)]
    struct Sprite {
        x: f64,
        alpha: f32,
        frame: i32,
        pos: [f64; 2],
    }

    fn sprite() -> Rc<RefCell<Sprite>> {
        Rc::new(RefCell::new(Sprite::default()))
    }

    fn x(s: &mut Sprite) -> &mut f64 {
        &mut s.x
    }

    #[test]
    fn test_reaches_destination() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let config = AnimateConfig::default().with_clock(clock.clock());
        let mut tween = animate_with(target.clone(), x, 10.0, config);

        assert_eq!(tween.resume(), Ok(Step::Pending));
        assert_eq!(target.borrow().x, 0.0);

        clock.advance(0.5);
        assert_eq!(tween.resume(), Ok(Step::Pending));
        assert_eq!(target.borrow().x, 0.0);

        clock.advance(0.5);
        assert_eq!(tween.resume(), Ok(Step::Complete));
        assert_eq!(target.borrow().x, 10.0);
    }

    #[test]
    fn test_uses_shared_clock_by_default() {
        let clock = ManualClock::new(3.0);
        clock.install();
        let target = sprite();
        let scheduler = Scheduler::new();
        scheduler.register(animate(target.clone(), x, 10.0));

        scheduler.tick().unwrap();
        for _ in 0..3 {
            clock.advance(0.25);
            scheduler.tick().unwrap();
        }
        assert!((target.borrow().x - 5.0).abs() < 1e-9);
        clock.advance(0.25);
        scheduler.tick().unwrap();
        assert_eq!(target.borrow().x, 10.0);
        assert!(scheduler.is_empty());
        reset_clock();
    }

    #[test]
    fn test_lasts_one_second_of_deltas() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let config = AnimateConfig::default().with_clock(clock.clock());
        let mut tween = animate_with(target.clone(), x, 4.0, config);

        let mut resumptions = 0;
        loop {
            resumptions += 1;
            if tween.resume().unwrap().is_complete() {
                break;
            }
            clock.advance(0.25);
        }
        // First resumption has a zero delta
        assert_eq!(resumptions, 5);
        assert_eq!(target.borrow().x, 4.0);
    }

    #[test]
    fn test_from_is_captured_on_first_resumption() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let config = AnimateConfig::default().with_clock(clock.clock());
        let mut tween = animate_with(target.clone(), x, 10.0, config);

        target.borrow_mut().x = 2.0;
        tween.resume().unwrap();
        clock.advance(0.5);
        tween.resume().unwrap();
        clock.advance(0.25);
        tween.resume().unwrap();
        assert!((target.borrow().x - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_easing_shapes_values() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let config = AnimateConfig::default()
            .with_clock(clock.clock())
            .with_easing(Easing::In(Power::Quad));
        let mut tween = animate_with(target.clone(), x, 10.0, config);

        tween.resume().unwrap();
        clock.advance(0.5);
        tween.resume().unwrap();
        clock.advance(0.25);
        tween.resume().unwrap();
        assert!((target.borrow().x - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_custom_interpolation() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let config = AnimateConfig::with_interpolator(|a: &i32, b: &i32, t| if t < 0.5 { *a } else { *b })
            .with_clock(clock.clock());
        let mut tween = animate_with(target.clone(), |s: &mut Sprite| &mut s.frame, 7, config);

        tween.resume().unwrap();
        clock.advance(0.4);
        tween.resume().unwrap();
        assert_eq!(target.borrow().frame, 0);
        clock.advance(0.2);
        tween.resume().unwrap();
        assert_eq!(target.borrow().frame, 0);
        clock.advance(0.2);
        tween.resume().unwrap();
        assert_eq!(target.borrow().frame, 7);
    }

    #[test]
    fn test_f32_and_array_properties() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let scheduler = Scheduler::new();
        scheduler.register(animate_with(
            target.clone(),
            |s: &mut Sprite| &mut s.alpha,
            1.0f32,
            AnimateConfig::default().with_clock(clock.clock()),
        ));
        scheduler.register(animate_with(
            target.clone(),
            |s: &mut Sprite| &mut s.pos,
            [4.0, -4.0],
            AnimateConfig::default().with_clock(clock.clock()),
        ));

        scheduler.tick().unwrap();
        clock.advance(1.0);
        scheduler.tick().unwrap();
        assert_eq!(target.borrow().alpha, 1.0);
        assert_eq!(target.borrow().pos, [4.0, -4.0]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear_leaves_partial_value() {
        let clock = ManualClock::new(0.0);
        let target = sprite();
        let scheduler = Scheduler::new();
        scheduler.register(animate_with(
            target.clone(),
            x,
            10.0,
            AnimateConfig::default().with_clock(clock.clock()),
        ));

        scheduler.tick().unwrap();
        clock.advance(0.5);
        scheduler.tick().unwrap();
        clock.advance(0.25);
        scheduler.tick().unwrap();
        scheduler.clear();

        clock.advance(5.0);
        scheduler.tick().unwrap();
        assert!((target.borrow().x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_borrowed_target_fails() {
        let target = sprite();
        let mut tween = animate(target.clone(), x, 1.0);
        let _guard = target.borrow();

        assert_eq!(tween.resume(), Err(CoroutineError::TargetBorrowed));
    }
}
