//! Sound-emitting entities (one per simulated vehicle).

use crate::config::EmitterProfile;
use crate::context::AudioContext;
use crate::curve::ResponseCurve;
use crate::error::{Result, SumoSoundError};
use crate::math::{Vec3, heading_velocity};
use crate::placement::PlacementStrategy;
use crate::signal::{KinematicState, Signal};
use crate::sound::SoundSource;
use std::collections::HashMap;

struct SoundSlot {
    source: SoundSource,
    signal: Option<Signal>,
    curve: Option<ResponseCurve>,
}

/// A moving entity whose sounds follow its kinematic state.
///
/// Each sound optionally listens to a [`Signal`]; on every update the signal
/// value runs through the sound's [`ResponseCurve`] to produce its gain, and
/// every sound is moved to the emitter's position (plus its offset) with the
/// emitter's velocity.
pub struct Emitter {
    id: String,
    class: Option<String>,
    state: KinematicState,
    has_state: bool,
    step_length: f32,
    /// Steps since the last update that carried no telemetry
    missed_steps: u32,
    custom: HashMap<String, f32>,
    enabled: bool,
    slots: Vec<SoundSlot>,
    placement: Option<Box<dyn PlacementStrategy>>,
}

impl Emitter {
    /// Creates an emitter with no sounds. `step_length` is the number of
    /// seconds between calls to [`update`](Self::update).
    pub fn new(id: impl Into<String>, step_length: f32) -> Self {
        Self {
            id: id.into(),
            class: None,
            state: KinematicState::default(),
            has_state: false,
            step_length,
            missed_steps: 0,
            custom: HashMap::new(),
            enabled: false,
            slots: Vec::new(),
            placement: None,
        }
    }

    /// Builds a disabled emitter from a declarative profile, loading every
    /// sound's buffer through the context's cache.
    pub fn from_profile(
        id: impl Into<String>,
        profile: &EmitterProfile,
        context: &AudioContext,
        step_length: f32,
    ) -> Result<Self> {
        profile.validate()?;
        let mut emitter = Self::new(id, step_length);
        for (name, initial) in &profile.custom_signals {
            emitter.custom.insert(name.clone(), *initial);
        }
        for spec in &profile.sounds {
            let source = SoundSource::new(context, &spec.file, spec.base_gain)?
                .with_relative_offset(spec.relative_offset)
                .with_looping(spec.looping)
                .with_randomized_offset(spec.randomize_offset.unwrap_or(spec.looping));
            let (signal, curve) = match &spec.modulation {
                Some((signal, curve)) => (Some(signal.clone()), Some(curve.clone())),
                None => (None, None),
            };
            emitter.add_sound(source, signal, curve)?;
        }
        if let Some(placement) = &profile.placement {
            emitter.placement = Some(placement.build());
        }
        Ok(emitter)
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Installs a placement strategy that recomputes sound offsets on every update.
    pub fn with_placement(mut self, placement: Box<dyn PlacementStrategy>) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Appends a sound. A signal without a curve is a configuration error.
    pub fn add_sound(
        &mut self,
        source: SoundSource,
        signal: Option<Signal>,
        curve: Option<ResponseCurve>,
    ) -> Result<()> {
        if signal.is_some() && curve.is_none() {
            return Err(SumoSoundError::Configuration(format!(
                "sound {} on emitter '{}' has a signal but no response curve",
                source.file(),
                self.id
            )));
        }
        self.slots.push(SoundSlot {
            source,
            signal,
            curve,
        });
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn heading(&self) -> f32 {
        self.state.heading
    }

    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    pub fn acceleration(&self) -> f32 {
        self.state.acceleration
    }

    /// Velocity vector derived from speed and heading.
    pub fn velocity(&self) -> Vec3 {
        heading_velocity(self.state.heading, self.state.speed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sound_count(&self) -> usize {
        self.slots.len()
    }

    pub fn sounds(&self) -> impl Iterator<Item = &SoundSource> {
        self.slots.iter().map(|slot| &slot.source)
    }

    /// Sets a custom signal value (for example `siren` to `0.0` or `1.0`).
    pub fn set_signal(&mut self, name: impl Into<String>, value: f32) {
        self.custom.insert(name.into(), value);
    }

    /// Current value of any signal, or `None` if it does not resolve.
    pub fn signal(&self, signal: &Signal) -> Option<f32> {
        match signal {
            Signal::Custom(name) => self.custom.get(name).copied(),
            builtin => self.state.builtin(builtin),
        }
    }

    /// Recomputes gain, position, and velocity of every sound from the
    /// current state. Fails if a sound's signal does not resolve.
    pub fn update_sounds(&mut self) -> Result<()> {
        let velocity = self.velocity();
        let origin = self.state.position;
        for index in 0..self.slots.len() {
            let gain = match (&self.slots[index].signal, &self.slots[index].curve) {
                (Some(signal), Some(curve)) => {
                    let value =
                        self.signal(signal)
                            .ok_or_else(|| SumoSoundError::SignalLookup {
                                signal: signal.to_string(),
                                emitter: self.id.clone(),
                            })?;
                    Some(curve.evaluate(value))
                }
                _ => None,
            };
            let offset = self
                .placement
                .as_ref()
                .and_then(|placement| placement.offset(index))
                .unwrap_or_else(|| self.slots[index].source.relative_offset());

            let source = &mut self.slots[index].source;
            if let Some(gain) = gain {
                source.set_gain(gain)?;
            }
            source.set_position(origin + offset)?;
            source.set_velocity(velocity)?;
        }
        Ok(())
    }

    /// Records a step that passed without telemetry for this emitter, so the
    /// next [`update`](Self::update) spreads the speed change over the gap.
    pub fn skip_step(&mut self) {
        self.missed_steps += 1;
    }

    /// Takes a fresh kinematic sample and pushes it to every sound.
    ///
    /// Acceleration is the change in speed since the previous update divided
    /// by the time elapsed since it (one step length, plus one more per
    /// [`skip_step`](Self::skip_step)); the first update reports zero.
    pub fn update(&mut self, position: Vec3, heading: f32, speed: f32) -> Result<()> {
        let elapsed = self.step_length * (self.missed_steps + 1) as f32;
        self.missed_steps = 0;
        let acceleration = if self.has_state && elapsed > 0.0 {
            (speed - self.state.speed) / elapsed
        } else {
            0.0
        };
        self.state = KinematicState {
            position,
            heading,
            speed,
            acceleration,
        };
        self.has_state = true;
        if let Some(placement) = self.placement.as_mut() {
            placement.update(&self.state);
        }
        self.update_sounds()
    }

    /// Allocates and starts every sound.
    ///
    /// If any sound cannot be enabled the ones enabled so far are released
    /// again, the emitter stays disabled, and the error is returned.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        self.update_sounds()?;
        for index in 0..self.slots.len() {
            let source = &mut self.slots[index].source;
            let started = source.enable().and_then(|_| source.play());
            if let Err(e) = started {
                for slot in &mut self.slots[..=index] {
                    if let Err(release) = slot.source.disable() {
                        log::warn!(
                            "Failed to roll back {} on emitter '{}': {}",
                            slot.source.file(),
                            self.id,
                            release
                        );
                    }
                }
                return Err(e);
            }
        }
        self.enabled = true;
        log::debug!("Emitter '{}' enabled ({} sounds)", self.id, self.slots.len());
        Ok(())
    }

    /// Pauses and releases every sound. The emitter keeps its state and can
    /// be enabled again. Every sound is released even if one of them fails.
    pub fn disable(&mut self) -> Result<()> {
        let mut first_error = None;
        for slot in &mut self.slots {
            let released = slot.source.pause().and_then(|_| slot.source.disable());
            if let Err(e) = released {
                log::warn!(
                    "Failed to release {} on emitter '{}': {}",
                    slot.source.file(),
                    self.id,
                    e
                );
                first_error.get_or_insert(e);
            }
        }
        self.enabled = false;
        log::debug!("Emitter '{}' disabled", self.id);
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("class", &self.class)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("sounds", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::SilenceLoader;
    use crate::backend::{HeadlessBackend, HeadlessBackendDesc};
    use crate::config::{PlacementSpec, SoundSpec};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    fn setup(max_sources: Option<usize>) -> (Rc<RefCell<HeadlessBackend>>, AudioContext) {
        let headless = Rc::new(RefCell::new(HeadlessBackend::with_loader(
            HeadlessBackendDesc {
                max_sources,
                ..Default::default()
            },
            SilenceLoader::default(),
        )));
        let context = AudioContext::new(headless.clone());
        (headless, context)
    }

    fn passenger(context: &AudioContext) -> Emitter {
        let profile = EmitterProfile::passenger_car(Path::new("stock_sounds"));
        Emitter::from_profile("veh0", &profile, context, 1.0).unwrap()
    }

    #[test]
    fn test_signal_without_curve_is_rejected() {
        let (_headless, context) = setup(None);
        let mut emitter = Emitter::new("veh0", 1.0);
        let source = SoundSource::new(&context, "engine.wav", 1.0).unwrap();
        let err = emitter
            .add_sound(source, Some(Signal::Speed), None)
            .unwrap_err();
        assert!(matches!(err, SumoSoundError::Configuration(_)));
        assert_eq!(emitter.sound_count(), 0);
    }

    #[test]
    fn test_update_drives_gains_from_curves() {
        let (_headless, context) = setup(None);
        let mut emitter = passenger(&context);

        emitter.update(Vec3::new(10.0, 0.0, 0.0), 90.0, 14.0).unwrap();
        let gains: Vec<f32> = emitter.sounds().map(|s| s.effective_gain()).collect();
        // engine: acceleration 0 -> 0.5 * 0.5; tires: 14/28 -> 2.0 * 0.5
        assert!((gains[0] - 0.25).abs() < 1e-6);
        assert!((gains[1] - 1.0).abs() < 1e-6);

        emitter.update(Vec3::new(25.0, 0.0, 0.0), 90.0, 16.5).unwrap();
        assert!((emitter.acceleration() - 2.5).abs() < 1e-6);
        let engine = emitter.sounds().next().unwrap();
        assert!((engine.effective_gain() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_update_positions_every_sound() {
        let (_headless, context) = setup(None);
        let mut emitter = Emitter::new("veh0", 1.0);
        let plain = SoundSource::new(&context, "horn.wav", 1.0)
            .unwrap()
            .with_relative_offset(Vec3::new(0.0, 0.0, 1.5));
        emitter.add_sound(plain, None, None).unwrap();

        emitter.update(Vec3::new(3.0, 4.0, 0.0), 0.0, 10.0).unwrap();
        let sound = emitter.sounds().next().unwrap();
        assert_eq!(sound.position(), Vec3::new(3.0, 4.0, 1.5));
        assert!(sound.velocity().abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-5));
        assert_eq!(sound.effective_gain(), 1.0);
    }

    #[test]
    fn test_unresolved_custom_signal_fails_lookup() {
        let (_headless, context) = setup(None);
        let mut emitter = Emitter::new("veh0", 1.0);
        let siren = SoundSource::new(&context, "siren.wav", 1.0).unwrap();
        emitter
            .add_sound(
                siren,
                Some(Signal::custom("siren")),
                Some(ResponseCurve::points(vec![(0.0, 0.0), (1.0, 1.0)]).unwrap()),
            )
            .unwrap();

        let err = emitter.update(Vec3::ZERO, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SumoSoundError::SignalLookup { ref signal, .. } if signal == "siren"));

        emitter.set_signal("siren", 1.0);
        emitter.update(Vec3::ZERO, 0.0, 0.0).unwrap();
        assert_eq!(emitter.sounds().next().unwrap().effective_gain(), 1.0);
    }

    #[test]
    fn test_enable_and_disable_cascade_to_sounds() {
        let (headless, context) = setup(None);
        let mut emitter = passenger(&context);
        emitter.update(Vec3::new(1.0, 1.0, 0.0), 0.0, 5.0).unwrap();

        emitter.enable().unwrap();
        assert!(emitter.is_enabled());
        assert_eq!(headless.borrow().active_sources(), 2);
        assert_eq!(headless.borrow().playing_sources(), 2);

        emitter.disable().unwrap();
        assert!(!emitter.is_enabled());
        assert_eq!(headless.borrow().active_sources(), 0);
        assert!(emitter.sounds().all(|s| !s.is_enabled() && !s.is_playing()));

        emitter.enable().unwrap();
        assert_eq!(headless.borrow().playing_sources(), 2);
    }

    #[test]
    fn test_partial_enable_rolls_back() {
        let (headless, context) = setup(Some(3));
        let mut first = passenger(&context);
        let mut second = passenger(&context);
        first.enable().unwrap();

        let err = second.enable().unwrap_err();
        assert!(err.is_capacity_exhausted());
        assert!(!second.is_enabled());
        assert!(second.sounds().all(|s| !s.is_enabled()));
        assert_eq!(headless.borrow().active_sources(), 2);
    }

    #[test]
    fn test_profile_sounds_share_buffers() {
        let (headless, context) = setup(None);
        let _a = passenger(&context);
        let _b = passenger(&context);
        assert_eq!(headless.borrow().buffers_loaded(), 2);
        assert_eq!(context.cached_buffers(), 2);
    }

    #[test]
    fn test_acceleration_spans_skipped_steps() {
        let (_headless, context) = setup(None);
        let mut emitter = passenger(&context);
        emitter.update(Vec3::ZERO, 90.0, 10.0).unwrap();
        emitter.skip_step();
        emitter.update(Vec3::new(20.0, 0.0, 0.0), 90.0, 14.0).unwrap();
        // 4 m/s over two 1 s steps
        assert!((emitter.acceleration() - 2.0).abs() < 1e-6);

        emitter.update(Vec3::new(34.0, 0.0, 0.0), 90.0, 15.0).unwrap();
        assert!((emitter.acceleration() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_trail_placement_overrides_offsets() {
        let (_headless, context) = setup(None);
        let profile = EmitterProfile::new("tram")
            .with_sound(SoundSpec::new("front.wav", 1.0))
            .with_sound(SoundSpec::new("rear.wav", 1.0))
            .with_placement(PlacementSpec::Trail {
                spacing: vec![0.0, 20.0],
            });
        let mut tram = Emitter::from_profile("tram0", &profile, &context, 1.0).unwrap();

        tram.update(Vec3::new(0.0, 0.0, 0.0), 0.0, 10.0).unwrap();
        tram.update(Vec3::new(0.0, 30.0, 0.0), 0.0, 10.0).unwrap();
        let positions: Vec<Vec3> = tram.sounds().map(|s| s.position()).collect();
        assert!(positions[0].abs_diff_eq(Vec3::new(0.0, 30.0, 0.0), 1e-4));
        assert!(positions[1].abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-4));
    }
}
