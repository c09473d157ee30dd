//! Signals an emitter exposes to its response curves.

use crate::math::Vec3;
use std::fmt;

/// Names a quantity on an emitter that can drive a sound's gain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Scalar speed in m/s
    Speed,
    /// Change of speed per second, derived between updates
    Acceleration,
    /// Compass bearing in degrees
    Heading,
    /// Profile-declared value set through [`Emitter::set_signal`](crate::Emitter::set_signal)
    Custom(String),
}

impl Signal {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Speed => "speed",
            Self::Acceleration => "acceleration",
            Self::Heading => "heading",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinematic state of a tracked entity at the last update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub position: Vec3,
    /// Compass bearing in degrees, clockwise from north
    pub heading: f32,
    pub speed: f32,
    pub acceleration: f32,
}

impl KinematicState {
    /// Value of a built-in signal; `None` for custom signals.
    pub fn builtin(&self, signal: &Signal) -> Option<f32> {
        match signal {
            Signal::Speed => Some(self.speed),
            Signal::Acceleration => Some(self.acceleration),
            Signal::Heading => Some(self.heading),
            Signal::Custom(_) => None,
        }
    }
}

impl Default for KinematicState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            heading: 0.0,
            speed: 0.0,
            acceleration: 0.0,
        }
    }
}
