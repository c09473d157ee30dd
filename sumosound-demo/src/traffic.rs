use glam::Vec3;
use sumosound::math::heading_velocity;
use sumosound::{EntityState, StaticFeed};

/// Distance from the crossing at which vehicles leave the scene.
const SCENE_RADIUS: f32 = 250.0;

struct Vehicle {
    id: String,
    class: &'static str,
    spawn_step: usize,
    position: Vec3,
    heading: f32,
    speed: f32,
    gone: bool,
}

impl Vehicle {
    fn new(
        id: impl Into<String>,
        class: &'static str,
        spawn_step: usize,
        position: Vec3,
        heading: f32,
        speed: f32,
    ) -> Self {
        Self {
            id: id.into(),
            class,
            spawn_step,
            position,
            heading,
            speed,
            gone: false,
        }
    }

    fn state(&self) -> EntityState {
        EntityState::new(self.position, self.heading, self.speed)
    }
}

/// A scripted stand-in for a running traffic simulation.
pub struct Traffic {
    step_length: f32,
    vehicles: Vec<Vehicle>,
    feed: StaticFeed,
}

impl Traffic {
    /// Two roads crossing at the origin: east-west traffic on `y = ±3`, a
    /// north-south road on `x = ±3`, and a tram line north of the crossing.
    pub fn crossing(step_length: f32) -> Self {
        let mut vehicles = vec![
            Vehicle::new("ego", "passenger", 0, Vec3::new(-150.0, -3.0, 0.0), 90.0, 12.0),
            Vehicle::new("bike0", "bicycle", 0, Vec3::new(-3.0, -60.0, 0.0), 0.0, 5.0),
            Vehicle::new("walker0", "pedestrian", 0, Vec3::new(6.0, -6.0, 0.0), 0.0, 1.2),
            Vehicle::new("truck0", "truck", 4, Vec3::new(-150.0, -3.0, 0.0), 90.0, 9.0),
            Vehicle::new("ambulance", "emergency", 6, Vec3::new(3.0, 150.0, 0.0), 180.0, 18.0),
            Vehicle::new("tram0", "tram", 8, Vec3::new(-200.0, 12.0, 0.0), 90.0, 10.0),
            Vehicle::new("ev0", "evehicle", 10, Vec3::new(150.0, 3.0, 0.0), 270.0, 13.0),
        ];
        for wave in 0..40 {
            let eastbound = wave % 2 == 0;
            let (x, y, heading) = if eastbound {
                (-150.0, -3.0, 90.0)
            } else {
                (150.0, 3.0, 270.0)
            };
            vehicles.push(Vehicle::new(
                format!("car{}", wave),
                if wave % 7 == 3 { "taxi" } else { "passenger" },
                2 + wave * 3,
                Vec3::new(x, y, 0.0),
                heading,
                11.0 + (wave % 4) as f32,
            ));
        }

        Self {
            step_length,
            vehicles,
            feed: StaticFeed::new(),
        }
    }

    /// Spawns vehicles due at `step` and moves everyone already on the road.
    pub fn advance(&mut self, step: usize) {
        for vehicle in &mut self.vehicles {
            if vehicle.gone || vehicle.spawn_step > step {
                continue;
            }
            if vehicle.spawn_step == step {
                self.feed
                    .set_with_class(&vehicle.id, vehicle.class, vehicle.state());
                continue;
            }

            vehicle.position += heading_velocity(vehicle.heading, vehicle.speed) * self.step_length;
            if vehicle.position.truncate().length() > SCENE_RADIUS {
                vehicle.gone = true;
                self.feed.remove(&vehicle.id);
            } else {
                self.feed.set(&vehicle.id, vehicle.state());
            }
        }
    }

    pub fn feed(&self) -> &StaticFeed {
        &self.feed
    }
}
