//! Easing curves
//!
//! Every curve is built from one polynomial `t^n`. Ease-out mirrors it through
//! the point (0.5, 0.5), and ease-in-out uses the ease-in curve for the first
//! half and the ease-out curve for the second.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Degree of the polynomial behind a curve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Power {
    Quad,
    Cubic,
    Quart,
}

impl Power {
    fn exponent(self) -> i32 {
        match self {
            Power::Quad => 2,
            Power::Cubic => 3,
            Power::Quart => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Power::Quad => "quad",
            Power::Cubic => "cubic",
            Power::Quart => "quart",
        }
    }

    fn accelerate(self, t: f64) -> f64 {
        t.powi(self.exponent())
    }
}

/// Maps raw progress onto a curve; use with
/// [`AnimateConfig::with_easing`](crate::AnimateConfig::with_easing)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Easing {
    #[default]
    Linear,
    /// Starts slow
    In(Power),
    /// Ends slow
    Out(Power),
    /// Slow at both ends
    InOut(Power),
}

impl Easing {
    /// Map progress in `[0, 1]`. Both endpoints are fixed points.
    pub fn apply(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::In(power) => power.accelerate(t),
            Easing::Out(power) => 1.0 - power.accelerate(1.0 - t),
            Easing::InOut(power) if t < 0.5 => power.accelerate(2.0 * t) / 2.0,
            Easing::InOut(power) => 1.0 - power.accelerate(2.0 - 2.0 * t) / 2.0,
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("linear"),
            Easing::In(power) => write!(f, "ease-in-{}", power.name()),
            Easing::Out(power) => write!(f, "ease-out-{}", power.name()),
            Easing::InOut(power) => write!(f, "ease-in-out-{}", power.name()),
        }
    }
}

/// Unknown easing name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown easing: {0}")]
pub struct ParseEasingError(String);

impl FromStr for Easing {
    type Err = ParseEasingError;

    /// Parse `linear` or `ease-{in,out,in-out}[-{quad,cubic,quart}]`.
    ///
    /// A missing degree means cubic.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let unknown = || ParseEasingError(name.to_string());
        let normalized = name.trim().to_ascii_lowercase();
        if normalized == "linear" {
            return Ok(Easing::Linear);
        }

        let rest = normalized.strip_prefix("ease-").ok_or_else(unknown)?;
        let (shape, power) = match rest.rsplit_once('-') {
            Some((shape, "quad")) => (shape, Power::Quad),
            Some((shape, "cubic")) => (shape, Power::Cubic),
            Some((shape, "quart")) => (shape, Power::Quart),
            _ => (rest, Power::Cubic),
        };
        match shape {
            "in" => Ok(Easing::In(power)),
            "out" => Ok(Easing::Out(power)),
            "in-out" => Ok(Easing::InOut(power)),
            _ => Err(unknown()),
        }
    }
}
