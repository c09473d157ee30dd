//! The observing point of the scene.

use crate::backend::SharedBackend;
use crate::error::Result;
use crate::math::{Orientation, Vec3, heading_velocity};
use crate::telemetry::TelemetryFeed;

/// Where a tracked listener takes its speed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedSource {
    /// Use the speed the simulation reports
    #[default]
    Reported,
    /// Derive speed from the distance travelled since the previous step.
    /// Use this when the vehicle is driven from outside the simulation and
    /// its reported speed is meaningless.
    Derived,
}

#[derive(Debug, Clone)]
struct Tracking {
    id: String,
    offset: Vec3,
    speed_source: SpeedSource,
    last_position: Option<Vec3>,
}

/// The single listener ("ears") of a [`SoundSession`](crate::SoundSession).
///
/// A listener either stays where it is put (manual pose) or follows a tracked
/// entity, sitting at a fixed offset from it (typically ear height above the
/// vehicle origin). Every setter forwards to the backend and caches the value.
pub struct Listener {
    backend: SharedBackend,
    step_length: f32,
    position: Vec3,
    velocity: Vec3,
    orientation: Orientation,
    gain: f32,
    tracking: Option<Tracking>,
}

impl Listener {
    pub(crate) fn new(backend: SharedBackend, step_length: f32) -> Self {
        Self {
            backend,
            step_length,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Orientation::default(),
            gain: 1.0,
            tracking: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn master_volume(&self) -> f32 {
        self.gain
    }

    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.backend.borrow_mut().set_listener_position(position)?;
        self.position = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: Vec3) -> Result<()> {
        self.backend.borrow_mut().set_listener_velocity(velocity)?;
        self.velocity = velocity;
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.backend
            .borrow_mut()
            .set_listener_orientation(orientation)?;
        self.orientation = orientation;
        Ok(())
    }

    /// Faces the listener along a compass bearing (degrees, clockwise from north).
    pub fn set_angle(&mut self, bearing: f32) -> Result<()> {
        self.set_orientation(Orientation::from_bearing(bearing))
    }

    /// Scales every sound in the scene.
    pub fn set_master_volume(&mut self, gain: f32) -> Result<()> {
        self.backend.borrow_mut().set_listener_gain(gain)?;
        self.gain = gain;
        Ok(())
    }

    /// Follows entity `id` from now on, placed at `offset` from its origin.
    pub fn track(&mut self, id: impl Into<String>, offset: Vec3, speed_source: SpeedSource) {
        let id = id.into();
        log::info!("Listener tracking '{}' at offset {:?}", id, offset);
        self.tracking = Some(Tracking {
            id,
            offset,
            speed_source,
            last_position: None,
        });
    }

    /// Returns to a manual pose; the current pose is kept.
    pub fn stop_tracking(&mut self) {
        self.tracking = None;
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracking.as_ref().map(|t| t.id.as_str())
    }

    /// Copies the tracked entity's state into the listener.
    ///
    /// Does nothing for a manual listener. If the tracked entity is missing
    /// from the feed the last pose is kept.
    pub fn update(&mut self, feed: &dyn TelemetryFeed) -> Result<()> {
        let Some(tracking) = self.tracking.as_mut() else {
            return Ok(());
        };
        let Some(state) = feed.state(&tracking.id) else {
            log::debug!("Tracked entity '{}' not in feed; keeping pose", tracking.id);
            return Ok(());
        };

        let speed = match tracking.speed_source {
            SpeedSource::Reported => state.speed,
            SpeedSource::Derived => match tracking.last_position {
                Some(last) if self.step_length > 0.0 => {
                    last.distance(state.position) / self.step_length
                }
                _ => 0.0,
            },
        };
        tracking.last_position = Some(state.position);
        let position = state.position + tracking.offset;

        self.set_position(position)?;
        self.set_velocity(heading_velocity(state.heading, speed))?;
        self.set_angle(state.heading)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("orientation", &self.orientation)
            .field("gain", &self.gain)
            .field("tracking", &self.tracking)
            .finish()
    }
}
