//! The traffic-simulation seam.

use crate::math::Vec3;
use std::collections::HashMap;

/// Kinematic sample for one tracked entity, as reported by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    pub position: Vec3,
    /// Compass bearing in degrees, clockwise from north
    pub heading: f32,
    pub speed: f32,
}

impl EntityState {
    pub fn new(position: Vec3, heading: f32, speed: f32) -> Self {
        Self {
            position,
            heading,
            speed,
        }
    }
}

/// Per-step view of the simulation.
pub trait TelemetryFeed {
    /// Identities of every entity currently in the simulation, in a stable order.
    fn live_ids(&self) -> Vec<String>;

    /// Latest state of `id`, or `None` if it is not (or no longer) tracked.
    fn state(&self, id: &str) -> Option<EntityState>;

    /// Declared vehicle class used to choose an emitter profile.
    fn vehicle_class(&self, id: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
struct FeedEntry {
    state: EntityState,
    class: Option<String>,
}

/// In-memory feed that a script or a test moves around by hand.
///
/// Identities are reported in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    order: Vec<String>,
    entries: HashMap<String, FeedEntry>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` or updates its state, keeping its declared class.
    pub fn set(&mut self, id: &str, state: EntityState) {
        match self.entries.get_mut(id) {
            Some(entry) => entry.state = state,
            None => {
                self.order.push(id.to_string());
                self.entries.insert(
                    id.to_string(),
                    FeedEntry {
                        state,
                        class: None,
                    },
                );
            }
        }
    }

    /// Adds `id` with a declared class, or updates both.
    pub fn set_with_class(&mut self, id: &str, class: &str, state: EntityState) {
        self.set(id, state);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.class = Some(class.to_string());
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<EntityState> {
        self.order.retain(|known| known != id);
        self.entries.remove(id).map(|entry| entry.state)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TelemetryFeed for StaticFeed {
    fn live_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    fn state(&self, id: &str) -> Option<EntityState> {
        self.entries.get(id).map(|entry| entry.state)
    }

    fn vehicle_class(&self, id: &str) -> Option<String> {
        self.entries.get(id).and_then(|entry| entry.class.clone())
    }
}
