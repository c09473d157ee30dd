//! Declarative emitter profiles and the vehicle-class table that selects them.

use crate::curve::ResponseCurve;
use crate::error::{Result, SumoSoundError};
use crate::math::Vec3;
use crate::placement::{PlacementStrategy, TrailPlacement};
use crate::signal::Signal;
use std::collections::HashMap;
use std::path::Path;

/// One sound of an emitter profile.
#[derive(Debug, Clone)]
pub struct SoundSpec {
    pub file: String,
    /// Baseline gain; curve outputs multiply it
    pub base_gain: f32,
    /// Offset from the emitter origin
    pub relative_offset: Vec3,
    pub looping: bool,
    /// Random start offset on enable (`None` follows `looping`)
    pub randomize_offset: Option<bool>,
    /// Signal and curve driving the gain; `None` plays at base gain
    pub modulation: Option<(Signal, ResponseCurve)>,
}

impl SoundSpec {
    /// A looping sound at a constant base gain.
    pub fn new(file: impl Into<String>, base_gain: f32) -> Self {
        Self {
            file: file.into(),
            base_gain,
            relative_offset: Vec3::ZERO,
            looping: true,
            randomize_offset: None,
            modulation: None,
        }
    }

    pub fn modulated_by(mut self, signal: Signal, curve: ResponseCurve) -> Self {
        self.modulation = Some((signal, curve));
        self
    }

    pub fn relative_offset(mut self, offset: Vec3) -> Self {
        self.relative_offset = offset;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn randomize_offset(mut self, randomize: bool) -> Self {
        self.randomize_offset = Some(randomize);
        self
    }
}

/// How an emitter's sound offsets are recomputed while it moves.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementSpec {
    /// Sound `i` trails the head by `spacing[i]` metres along the travelled path
    Trail { spacing: Vec<f32> },
}

impl PlacementSpec {
    pub fn build(&self) -> Box<dyn PlacementStrategy> {
        match self {
            Self::Trail { spacing } => Box::new(TrailPlacement::new(spacing.clone())),
        }
    }
}

/// Data describing how one kind of vehicle sounds.
#[derive(Debug, Clone, Default)]
pub struct EmitterProfile {
    pub name: String,
    pub sounds: Vec<SoundSpec>,
    /// Custom signals the profile exposes, with their initial values
    pub custom_signals: Vec<(String, f32)>,
    pub placement: Option<PlacementSpec>,
}

impl EmitterProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sound(mut self, sound: SoundSpec) -> Self {
        self.sounds.push(sound);
        self
    }

    pub fn with_signal(mut self, name: impl Into<String>, initial: f32) -> Self {
        self.custom_signals.push((name.into(), initial));
        self
    }

    pub fn with_placement(mut self, placement: PlacementSpec) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Checks every response curve, and that every custom signal a sound
    /// listens to is declared.
    pub fn validate(&self) -> Result<()> {
        for sound in &self.sounds {
            if let Some((_, curve)) = &sound.modulation {
                curve.validate().map_err(|e| {
                    SumoSoundError::Configuration(format!(
                        "profile '{}' has a bad curve for {}: {}",
                        self.name, sound.file, e
                    ))
                })?;
            }
            if let Some((Signal::Custom(name), _)) = &sound.modulation {
                if !self.custom_signals.iter().any(|(declared, _)| declared == name) {
                    return Err(SumoSoundError::Configuration(format!(
                        "profile '{}' uses undeclared signal '{}' for {}",
                        self.name, name, sound.file
                    )));
                }
            }
        }
        Ok(())
    }

    /// Passenger car: engine follows acceleration, tire noise follows speed.
    pub fn passenger_car(assets: &Path) -> Self {
        Self::new("passenger")
            .with_sound(engine(assets, "rally-car-idle-loop-17.wav", 0.5))
            .with_sound(tires(assets, 2.0))
    }

    /// Electric vehicle: tire noise only.
    pub fn electric_vehicle(assets: &Path) -> Self {
        Self::new("evehicle").with_sound(tires(assets, 1.0))
    }

    /// Emergency vehicle: passenger car plus a siren on the `siren` signal.
    pub fn emergency_vehicle(assets: &Path) -> Self {
        Self::new("emergency")
            .with_sound(engine(assets, "rally-car-idle-loop-17.wav", 0.5))
            .with_sound(tires(assets, 2.0))
            .with_sound(
                SoundSpec::new(asset(assets, "siren-dutch-emergency-services.wav"), 2.0)
                    .modulated_by(
                        Signal::custom("siren"),
                        ResponseCurve::from_points_unchecked(vec![(0.0, 0.0), (1.0, 1.0)]),
                    ),
            )
            .with_signal("siren", 1.0)
    }

    pub fn truck(assets: &Path) -> Self {
        Self::new("truck")
            .with_sound(engine(assets, "truck-ext-idle-engine-close1.wav", 2.0))
            .with_sound(tires(assets, 2.0))
    }

    pub fn bicycle(assets: &Path) -> Self {
        Self::new("bicycle").with_sound(
            SoundSpec::new(asset(assets, "bicycle-ride.wav"), 0.5).modulated_by(
                Signal::Speed,
                ResponseCurve::from_points_unchecked(vec![(0.0, 0.0), (6.0, 1.0)]),
            ),
        )
    }
}

fn asset(assets: &Path, file: &str) -> String {
    assets.join(file).to_string_lossy().into_owned()
}

fn engine(assets: &Path, file: &str, base_gain: f32) -> SoundSpec {
    SoundSpec::new(asset(assets, file), base_gain).modulated_by(
        Signal::Acceleration,
        ResponseCurve::from_points_unchecked(vec![(0.0, 0.5), (2.5, 1.0)]),
    )
}

fn tires(assets: &Path, base_gain: f32) -> SoundSpec {
    SoundSpec::new(asset(assets, "car-atspeed-loop.wav"), base_gain).modulated_by(
        Signal::Speed,
        ResponseCurve::from_points_unchecked(vec![(0.0, 0.0), (28.0, 1.0)]),
    )
}

/// Outcome of looking up a vehicle class.
#[derive(Debug, Clone, Copy)]
pub enum ClassLookup<'a> {
    Audible(&'a EmitterProfile),
    /// Class is known and deliberately makes no sound
    Silent,
    Unknown,
}

/// Maps vehicle class names to emitter profiles.
#[derive(Debug, Clone, Default)]
pub struct VehicleClassMap {
    classes: HashMap<String, Option<EmitterProfile>>,
}

impl VehicleClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: impl Into<String>, profile: Option<EmitterProfile>) {
        self.classes.insert(class.into(), profile);
    }

    pub fn with(mut self, class: impl Into<String>, profile: Option<EmitterProfile>) -> Self {
        self.insert(class, profile);
        self
    }

    pub fn lookup(&self, class: &str) -> ClassLookup<'_> {
        match self.classes.get(class) {
            Some(Some(profile)) => ClassLookup::Audible(profile),
            Some(None) => ClassLookup::Silent,
            None => ClassLookup::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Validates every audible profile.
    pub fn validate(&self) -> Result<()> {
        self.classes.values().flatten().try_for_each(EmitterProfile::validate)
    }

    /// The SUMO vehicle classes with stock sounds from `assets`.
    pub fn sumo_defaults(assets: impl AsRef<Path>) -> Self {
        let assets = assets.as_ref();
        let passenger = EmitterProfile::passenger_car(assets);
        let truck = EmitterProfile::truck(assets);

        let mut map = Self::new();
        for class in [
            "ignoring",
            "private",
            "authority",
            "vip",
            "passenger",
            "taxi",
            "coach",
            "motorcycle",
            "moped",
        ] {
            map.insert(class, Some(passenger.clone()));
        }
        for class in ["army", "hov", "bus", "delivery", "truck", "trailer"] {
            map.insert(class, Some(truck.clone()));
        }
        map.insert("emergency", Some(EmitterProfile::emergency_vehicle(assets)));
        map.insert("bicycle", Some(EmitterProfile::bicycle(assets)));
        map.insert("evehicle", Some(EmitterProfile::electric_vehicle(assets)));
        for class in [
            "pedestrian",
            "tram",
            "rail_urban",
            "rail",
            "rail_electric",
            "rail_fast",
            "ship",
            "custom1",
            "custom2",
        ] {
            map.insert(class, None);
        }
        map
    }
}
