//! Placement strategies that recompute per-sound offsets every update.
//!
//! A plain emitter keeps each sound at a fixed offset from its origin. An
//! articulated vehicle (a tram, a train) instead has carriages that follow the
//! path the head already travelled, so their offsets depend on the route.

use crate::math::{Vec3, heading_direction};
use crate::signal::KinematicState;
use std::collections::VecDeque;

/// Hook run on every kinematic update, before gains and positions are pushed.
pub trait PlacementStrategy {
    fn update(&mut self, state: &KinematicState);

    /// Offset of sound `index` from the emitter origin; `None` keeps the
    /// sound's configured relative offset.
    fn offset(&self, index: usize) -> Option<Vec3>;
}

/// Places sounds at fixed arc-length distances behind the head along the
/// path the head has actually travelled.
///
/// When the recorded path is shorter than a requested distance (for example
/// right after the vehicle appears) the remainder is extrapolated straight
/// back along the current heading.
#[derive(Debug, Clone)]
pub struct TrailPlacement {
    spacing: Vec<f32>,
    /// Head positions, most recent first
    trail: VecDeque<Vec3>,
    heading: f32,
    max_distance: f32,
}

impl TrailPlacement {
    /// `spacing[i]` is how far behind the head sound `i` sits, in metres.
    pub fn new(spacing: Vec<f32>) -> Self {
        let max_distance = spacing.iter().copied().fold(0.0_f32, f32::max);
        Self {
            spacing,
            trail: VecDeque::new(),
            heading: 0.0,
            max_distance,
        }
    }

    fn head(&self) -> Vec3 {
        self.trail.front().copied().unwrap_or(Vec3::ZERO)
    }

    fn point_behind(&self, distance: f32) -> Vec3 {
        let mut remaining = distance;
        for (p0, p1) in self.trail.iter().zip(self.trail.iter().skip(1)) {
            let segment = p0.distance(*p1);
            if remaining <= segment {
                return *p0 + (*p1 - *p0) * (remaining / segment);
            }
            remaining -= segment;
        }
        let tail = self.trail.back().copied().unwrap_or(Vec3::ZERO);
        tail - heading_direction(self.heading) * remaining
    }

    /// Drops trail points that lie entirely beyond the furthest carriage.
    fn prune(&mut self) {
        let mut travelled = 0.0;
        let mut keep = self.trail.len();
        for (i, (p0, p1)) in self.trail.iter().zip(self.trail.iter().skip(1)).enumerate() {
            travelled += p0.distance(*p1);
            if travelled >= self.max_distance {
                keep = i + 2;
                break;
            }
        }
        self.trail.truncate(keep);
    }
}

impl PlacementStrategy for TrailPlacement {
    fn update(&mut self, state: &KinematicState) {
        self.heading = state.heading;
        let moved = self
            .trail
            .front()
            .is_none_or(|last| last.distance(state.position) > 1e-3);
        if moved {
            self.trail.push_front(state.position);
            self.prune();
        }
    }

    fn offset(&self, index: usize) -> Option<Vec3> {
        let distance = *self.spacing.get(index)?;
        Some(self.point_behind(distance) - self.head())
    }
}
