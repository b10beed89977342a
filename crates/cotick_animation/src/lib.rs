//! Cotick Animation
//!
//! Tween coroutines built on the Cotick clock.
//!
//! # Features
//!
//! - **Property Tweens**: move one property of a shared value to a destination
//! - **Easing Curves**: quad, cubic and quart in/out curves
//! - **Custom Interpolation**: tween any value with a blend function

pub mod animate;
pub mod easing;

pub use animate::{animate, animate_with, Animate, AnimateConfig, InterpolateFn, Lerp, MapFn};
pub use easing::{Easing, ParseEasingError, Power};
