//! Math types for SumoSound

pub use glam::Vec3;

/// Converts a compass bearing (degrees, clockwise from north) into a
/// mathematical angle in radians (counter-clockwise from east).
pub fn geometric_angle(bearing: f32) -> f32 {
    (360.0 - bearing + 90.0).rem_euclid(360.0).to_radians()
}

/// Unit vector in the horizontal plane pointing along a compass bearing.
pub fn heading_direction(bearing: f32) -> Vec3 {
    let angle = geometric_angle(bearing);
    Vec3::new(angle.cos(), angle.sin(), 0.0)
}

/// Velocity vector for a scalar speed travelling along a compass bearing.
pub fn heading_velocity(bearing: f32, speed: f32) -> Vec3 {
    heading_direction(bearing) * speed
}

/// Euclidean distance in the x/y plane, ignoring elevation.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance(b.truncate())
}

/// Listener orientation in the OpenAL "at + up" layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub forward: Vec3,
    pub up: Vec3,
}

impl Orientation {
    pub fn new(forward: Vec3, up: Vec3) -> Self {
        Self { forward, up }
    }

    /// Zero-pitch orientation facing along a compass bearing.
    ///
    /// The up vector is left zeroed, matching the six-component
    /// `(cos, sin, 0, 0, 0, 0)` form traffic listeners have always used.
    pub fn from_bearing(bearing: f32) -> Self {
        Self {
            forward: heading_direction(bearing),
            up: Vec3::ZERO,
        }
    }

    pub fn to_array(&self) -> [f32; 6] {
        [
            self.forward.x,
            self.forward.y,
            self.forward.z,
            self.up.x,
            self.up.y,
            self.up.z,
        ]
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}
