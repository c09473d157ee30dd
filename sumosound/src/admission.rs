//! Proximity-gated admission of emitters to the backend's source pool.

use crate::config::{ClassLookup, SceneDesc, VehicleClassMap};
use crate::context::AudioContext;
use crate::emitter::Emitter;
use crate::error::{Result, SumoSoundError};
use crate::events::SceneEvent;
use crate::listener::Listener;
use crate::math::planar_distance;
use crate::telemetry::TelemetryFeed;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::{HashMap, HashSet};

/// How many emitters may be enabled at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityCeiling {
    /// Every eligible emitter is enabled
    #[default]
    Unbounded,
    /// Limit given in the [`SceneDesc`]
    Configured(usize),
    /// Limit found by running the backend out of sources
    Discovered(usize),
}

impl CapacityCeiling {
    pub fn from_config(max_active_emitters: Option<usize>) -> Self {
        max_active_emitters.map_or(Self::Unbounded, Self::Configured)
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Configured(limit) | Self::Discovered(limit) => Some(*limit),
        }
    }

    /// Lowers the ceiling to `limit`. Returns `false` (and changes nothing)
    /// unless `limit` is below the current ceiling.
    pub fn lower_to(&mut self, limit: usize) -> bool {
        if self.limit().is_none_or(|current| limit < current) {
            *self = Self::Discovered(limit);
            true
        } else {
            false
        }
    }
}

/// Summary of one [`AdmissionController::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Emitters created this step
    pub added: Vec<String>,
    /// Emitters dropped this step
    pub removed: Vec<String>,
    /// Every enabled emitter after the step, nearest first
    pub enabled: Vec<String>,
    pub ceiling: Option<usize>,
}

/// Keeps one emitter per audible simulated entity and enables only the
/// ones nearest to the listener.
///
/// The controller is the only thing that enables or disables its emitters.
/// At the end of every step at most `ceiling` emitters are enabled, and
/// they are exactly the `ceiling` nearest (by planar distance to the
/// listener, ties broken by the order in which emitters were added).
pub struct AdmissionController {
    // Emitters release their sources before the context goes away.
    roster: Vec<Emitter>,
    muted: HashSet<String>,
    listener: Listener,
    ceiling: CapacityCeiling,
    classes: VehicleClassMap,
    desc: SceneDesc,
    context: AudioContext,
    event_sender: Sender<SceneEvent>,
    event_receiver: Receiver<SceneEvent>,
}

impl AdmissionController {
    pub(crate) fn new(
        context: AudioContext,
        listener: Listener,
        classes: VehicleClassMap,
        desc: SceneDesc,
    ) -> Self {
        let (event_sender, event_receiver) = unbounded();
        Self {
            roster: Vec::new(),
            muted: HashSet::new(),
            listener,
            ceiling: CapacityCeiling::from_config(desc.max_active_emitters),
            classes,
            desc,
            context,
            event_sender,
            event_receiver,
        }
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut Listener {
        &mut self.listener
    }

    pub fn ceiling(&self) -> CapacityCeiling {
        self.ceiling
    }

    pub fn emitter(&self, id: &str) -> Option<&Emitter> {
        self.roster.iter().find(|emitter| emitter.id() == id)
    }

    /// Mutable access, for example to flip a custom signal such as `siren`.
    pub fn emitter_mut(&mut self, id: &str) -> Option<&mut Emitter> {
        self.roster.iter_mut().find(|emitter| emitter.id() == id)
    }

    /// Emitters in roster (insertion) order.
    pub fn emitters(&self) -> impl Iterator<Item = &Emitter> {
        self.roster.iter()
    }

    pub fn emitter_count(&self) -> usize {
        self.roster.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.roster.iter().filter(|e| e.is_enabled()).count()
    }

    /// Whether `id` is live but deliberately not emitted.
    pub fn is_muted(&self, id: &str) -> bool {
        self.muted.contains(id)
    }

    /// Drains the scene events queued since the last call.
    pub fn poll_events(&mut self) -> Vec<SceneEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Advances the scene by one simulation step.
    ///
    /// Configuration and signal lookup errors are returned immediately.
    /// Running out of backend sources lowers the ceiling and is not an
    /// error. Any other backend error is reported as an event, the step is
    /// completed, and the first such error is returned at the end.
    pub fn step(&mut self, feed: &dyn TelemetryFeed) -> Result<StepReport> {
        let mut deferred = None;
        let mut report = StepReport::default();

        let listener_update = self.listener.update(feed);
        absorb(&self.event_sender, None, listener_update, &mut deferred)?;

        let live = feed.live_ids();
        let live_set: HashSet<&str> = live.iter().map(String::as_str).collect();
        let silent_self = self
            .listener
            .tracked_id()
            .filter(|_| self.desc.silent_self)
            .map(str::to_owned);
        let is_self = |id: &str| silent_self.as_deref() == Some(id);

        // Departures
        let (kept, departed): (Vec<Emitter>, Vec<Emitter>) = std::mem::take(&mut self.roster)
            .into_iter()
            .partition(|emitter| live_set.contains(emitter.id()) && !is_self(emitter.id()));
        self.roster = kept;
        for mut emitter in departed {
            let id = emitter.id().to_string();
            if emitter.is_enabled() {
                let released = emitter.disable();
                absorb(&self.event_sender, Some(id.as_str()), released, &mut deferred)?;
            }
            log::info!("Emitter '{}' removed", id);
            self.send(SceneEvent::EmitterRemoved {
                emitter_id: id.clone(),
            });
            report.removed.push(id);
        }
        self.muted.retain(|id| live_set.contains(id.as_str()));

        // Arrivals and state refresh
        let known: HashMap<String, usize> = self
            .roster
            .iter()
            .enumerate()
            .map(|(index, emitter)| (emitter.id().to_string(), index))
            .collect();
        for id in &live {
            if is_self(id.as_str()) || self.muted.contains(id) {
                continue;
            }
            let Some(state) = feed.state(id) else {
                log::warn!("No telemetry for '{}' this step; skipping", id);
                if let Some(&index) = known.get(id) {
                    self.roster[index].skip_step();
                }
                continue;
            };

            if let Some(&index) = known.get(id) {
                let updated =
                    self.roster[index].update(state.position, state.heading, state.speed);
                absorb(&self.event_sender, Some(id.as_str()), updated, &mut deferred)?;
                continue;
            }

            let class = feed.vehicle_class(id);
            let profile = match class.as_deref().map(|class| self.classes.lookup(class)) {
                Some(ClassLookup::Audible(profile)) => profile,
                lookup => {
                    match lookup {
                        Some(ClassLookup::Silent) => {
                            log::debug!("'{}' has silent class {:?}", id, class)
                        }
                        _ => log::warn!("'{}' has unknown class {:?}; not emitted", id, class),
                    }
                    self.muted.insert(id.clone());
                    self.send(SceneEvent::EmitterMuted {
                        emitter_id: id.clone(),
                        class,
                    });
                    continue;
                }
            };

            let built = Emitter::from_profile(
                id.as_str(),
                profile,
                &self.context,
                self.desc.step_length,
            );
            let mut emitter = match built {
                Ok(emitter) => emitter,
                Err(e) => {
                    // Not retried until the id leaves and comes back.
                    self.muted.insert(id.clone());
                    absorb(&self.event_sender, Some(id.as_str()), Err(e), &mut deferred)?;
                    continue;
                }
            };
            let class = class.unwrap_or_default();
            emitter = emitter.with_class(class.as_str());
            let updated = emitter.update(state.position, state.heading, state.speed);
            absorb(&self.event_sender, Some(id.as_str()), updated, &mut deferred)?;

            log::info!("Emitter '{}' added ({})", id, class);
            self.send(SceneEvent::EmitterAdded {
                emitter_id: id.clone(),
                class,
            });
            report.added.push(id.clone());
            self.roster.push(emitter);
        }

        let ranked = self.rank();
        self.admit(&ranked, &mut deferred)?;

        report.enabled = ranked
            .iter()
            .map(|&(index, _)| &self.roster[index])
            .filter(|emitter| emitter.is_enabled())
            .map(|emitter| emitter.id().to_string())
            .collect();
        report.ceiling = self.ceiling.limit();

        match deferred {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Roster indices with their planar distance to the listener, nearest
    /// first. The sort is stable so ties keep roster order.
    fn rank(&self) -> Vec<(usize, f32)> {
        let origin = self.listener.position();
        let mut ranked: Vec<(usize, f32)> = self
            .roster
            .iter()
            .enumerate()
            .map(|(index, emitter)| (index, planar_distance(emitter.position(), origin)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }

    fn admit(
        &mut self,
        ranked: &[(usize, f32)],
        deferred: &mut Option<SumoSoundError>,
    ) -> Result<()> {
        let limit = self.ceiling.limit().unwrap_or(ranked.len());
        for &(index, _) in ranked.iter().skip(limit) {
            self.disable_at(index, deferred)?;
        }

        for (rank, &(index, distance)) in ranked.iter().enumerate() {
            if self.ceiling.limit().is_some_and(|limit| rank >= limit) {
                break;
            }
            if self.roster[index].is_enabled() {
                continue;
            }

            loop {
                match self.roster[index].enable() {
                    Ok(()) => {
                        self.send(SceneEvent::EmitterEnabled {
                            emitter_id: self.roster[index].id().to_string(),
                            distance,
                        });
                        break;
                    }
                    Err(e) if e.is_capacity_exhausted() => {
                        // Farther emitters still holding sources make room first.
                        let farther = ranked[rank + 1..]
                            .iter()
                            .rev()
                            .map(|&(other, _)| other)
                            .find(|&other| self.roster[other].is_enabled());
                        if let Some(victim) = farther {
                            self.disable_at(victim, deferred)?;
                            continue;
                        }
                        self.lower_ceiling(rank);
                        return Ok(());
                    }
                    Err(e) => {
                        let id = self.roster[index].id().to_string();
                        absorb(&self.event_sender, Some(id.as_str()), Err(e), deferred)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn disable_at(&mut self, index: usize, deferred: &mut Option<SumoSoundError>) -> Result<()> {
        let emitter = &mut self.roster[index];
        if !emitter.is_enabled() {
            return Ok(());
        }
        let id = emitter.id().to_string();
        let released = emitter.disable();
        self.send(SceneEvent::EmitterDisabled {
            emitter_id: id.clone(),
        });
        absorb(&self.event_sender, Some(id.as_str()), released, deferred)
    }

    fn lower_ceiling(&mut self, limit: usize) {
        let previous = self.ceiling.limit();
        if self.ceiling.lower_to(limit) {
            log::warn!(
                "Backend ran out of sources; limiting active emitters to {} (was {:?})",
                limit,
                previous
            );
            self.send(SceneEvent::CapacityLowered {
                previous,
                ceiling: limit,
            });
        }
    }

    fn send(&self, event: SceneEvent) {
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.event_sender.send(event);
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("emitters", &self.roster.len())
            .field("enabled", &self.enabled_count())
            .field("muted", &self.muted.len())
            .field("ceiling", &self.ceiling)
            .field("listener", &self.listener)
            .finish()
    }
}

/// Lets configuration and lookup errors through; any other error is logged,
/// queued as an event, and kept (the first one) for the end of the step.
fn absorb(
    events: &Sender<SceneEvent>,
    emitter_id: Option<&str>,
    result: Result<()>,
    deferred: &mut Option<SumoSoundError>,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e @ (SumoSoundError::Configuration(_) | SumoSoundError::SignalLookup { .. })) => Err(e),
        Err(e) => {
            log::warn!("Backend error on {:?}: {}", emitter_id, e);
            let _ = events.send(SceneEvent::BackendError {
                emitter_id: emitter_id.map(str::to_owned),
                error: e.to_string(),
            });
            deferred.get_or_insert(e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::{LoadOptions, SilenceLoader, SoundData, SoundLoader};
    use crate::backend::{BackendError, HeadlessBackend, HeadlessBackendDesc};
    use crate::config::{EmitterProfile, SoundSpec};
    use crate::math::Vec3;
    use crate::session::SoundSession;
    use crate::telemetry::{EntityState, StaticFeed};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn one_sound_map() -> VehicleClassMap {
        VehicleClassMap::new()
            .with(
                "car",
                Some(EmitterProfile::new("car").with_sound(SoundSpec::new("car.wav", 1.0))),
            )
            .with("pedestrian", None)
    }

    fn setup(
        max_sources: Option<usize>,
        desc: SceneDesc,
    ) -> (Rc<RefCell<HeadlessBackend>>, AdmissionController) {
        let headless = Rc::new(RefCell::new(HeadlessBackend::with_loader(
            HeadlessBackendDesc {
                max_sources,
                ..Default::default()
            },
            SilenceLoader::default(),
        )));
        let mut session = SoundSession::new(headless.clone(), desc);
        let listener = session.create_listener().unwrap();
        let controller = session.admission_controller(listener, one_sound_map()).unwrap();
        (headless, controller)
    }

    fn car_at(feed: &mut StaticFeed, id: &str, x: f32) {
        feed.set_with_class(id, "car", EntityState::new(Vec3::new(x, 0.0, 0.0), 90.0, 10.0));
    }

    fn enabled_ids(controller: &AdmissionController) -> Vec<String> {
        controller
            .emitters()
            .filter(|e| e.is_enabled())
            .map(|e| e.id().to_string())
            .collect()
    }

    #[test]
    fn test_ceiling_only_lowers() {
        let mut ceiling = CapacityCeiling::from_config(Some(4));
        assert!(!ceiling.lower_to(4));
        assert!(ceiling.lower_to(2));
        assert_eq!(ceiling, CapacityCeiling::Discovered(2));
        assert!(!ceiling.lower_to(3));

        let mut unbounded = CapacityCeiling::default();
        assert!(unbounded.lower_to(10));
        assert_eq!(unbounded.limit(), Some(10));
    }

    #[test]
    fn test_nearest_emitters_are_enabled() {
        let (_headless, mut controller) =
            setup(None, SceneDesc::default().max_active_emitters(2));
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "five", 5.0);
        car_at(&mut feed, "one", 1.0);
        car_at(&mut feed, "three", 3.0);

        let report = controller.step(&feed).unwrap();
        assert_eq!(report.added.len(), 3);
        assert_eq!(report.enabled, vec!["one".to_string(), "three".to_string()]);
        assert_eq!(report.ceiling, Some(2));
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let (_headless, mut controller) =
            setup(None, SceneDesc::default().max_active_emitters(1));
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "first", -2.0);
        car_at(&mut feed, "second", 2.0);

        let report = controller.step(&feed).unwrap();
        assert_eq!(report.enabled, vec!["first".to_string()]);
    }

    #[test]
    fn test_backend_exhaustion_discovers_ceiling() {
        let (headless, mut controller) = setup(Some(3), SceneDesc::default());
        let mut feed = StaticFeed::new();
        for (i, x) in [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().enumerate() {
            car_at(&mut feed, &format!("veh{}", i), x);
        }

        let report = controller.step(&feed).unwrap();
        assert_eq!(report.enabled.len(), 3);
        assert_eq!(report.ceiling, Some(3));
        assert_eq!(controller.ceiling(), CapacityCeiling::Discovered(3));
        assert_eq!(headless.borrow().active_sources(), 3);

        let warnings: Vec<SceneEvent> = controller
            .poll_events()
            .into_iter()
            .filter(SceneEvent::is_warning)
            .collect();
        assert_eq!(
            warnings,
            vec![SceneEvent::CapacityLowered {
                previous: None,
                ceiling: 3
            }]
        );

        controller.step(&feed).unwrap();
        assert!(controller.poll_events().iter().all(|e| !e.is_warning()));
    }

    #[test]
    fn test_approaching_emitter_displaces_farthest() {
        let (_headless, mut controller) =
            setup(None, SceneDesc::default().max_active_emitters(2));
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "a", 1.0);
        car_at(&mut feed, "b", 2.0);
        car_at(&mut feed, "c", 30.0);
        controller.step(&feed).unwrap();
        assert_eq!(enabled_ids(&controller), vec!["a", "b"]);

        car_at(&mut feed, "c", 0.5);
        controller.step(&feed).unwrap();
        assert_eq!(enabled_ids(&controller), vec!["a", "c"]);
        assert!(controller.poll_events().contains(&SceneEvent::EmitterDisabled {
            emitter_id: "b".into()
        }));
    }

    #[test]
    fn test_unbounded_pool_evicts_before_lowering() {
        let (headless, mut controller) = setup(Some(2), SceneDesc::default());
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "a", 1.0);
        car_at(&mut feed, "b", 2.0);
        controller.step(&feed).unwrap();
        assert_eq!(controller.ceiling(), CapacityCeiling::Unbounded);

        // Nearer than both; "b" gives up its source instead of the ceiling dropping to 0.
        car_at(&mut feed, "c", 0.1);
        let report = controller.step(&feed).unwrap();
        assert_eq!(report.enabled, vec!["c".to_string(), "a".to_string()]);
        assert_eq!(report.ceiling, Some(2));
        assert_eq!(headless.borrow().active_sources(), 2);
    }

    #[test]
    fn test_departed_emitters_release_sources() {
        let (headless, mut controller) = setup(None, SceneDesc::default());
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "a", 1.0);
        car_at(&mut feed, "b", 2.0);
        controller.step(&feed).unwrap();
        assert_eq!(headless.borrow().active_sources(), 2);

        feed.remove("a");
        let report = controller.step(&feed).unwrap();
        assert_eq!(report.removed, vec!["a".to_string()]);
        assert!(controller.emitter("a").is_none());
        assert_eq!(headless.borrow().active_sources(), 1);

        // Re-entry creates a fresh emitter.
        car_at(&mut feed, "a", 1.0);
        let report = controller.step(&feed).unwrap();
        assert_eq!(report.added, vec!["a".to_string()]);
        assert_eq!(controller.enabled_count(), 2);
    }

    #[test]
    fn test_silent_and_unknown_classes_are_muted() {
        let (_headless, mut controller) = setup(None, SceneDesc::default());
        let mut feed = StaticFeed::new();
        let state = EntityState::new(Vec3::ZERO, 0.0, 1.0);
        feed.set_with_class("walker", "pedestrian", state);
        feed.set_with_class("ufo", "saucer", state);
        feed.set("anon", state);

        let report = controller.step(&feed).unwrap();
        assert!(report.added.is_empty());
        assert_eq!(controller.emitter_count(), 0);
        assert!(controller.is_muted("walker"));
        assert!(controller.is_muted("ufo"));
        assert!(controller.is_muted("anon"));

        feed.remove("walker");
        controller.step(&feed).unwrap();
        assert!(!controller.is_muted("walker"));
    }

    #[test]
    fn test_tracked_entity_is_silent_self() {
        let (_headless, mut controller) = setup(None, SceneDesc::default());
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "ego", 0.0);
        car_at(&mut feed, "other", 10.0);
        controller
            .listener_mut()
            .track("ego", Vec3::new(0.0, 0.0, 1.2), crate::SpeedSource::Reported);

        controller.step(&feed).unwrap();
        assert!(controller.emitter("ego").is_none());
        assert!(controller.emitter("other").is_some_and(Emitter::is_enabled));
        assert_eq!(controller.listener().position(), Vec3::new(0.0, 0.0, 1.2));
    }

    #[test]
    fn test_tracked_entity_emits_when_not_silent() {
        let (_headless, mut controller) =
            setup(None, SceneDesc::default().silent_self(false));
        let mut feed = StaticFeed::new();
        car_at(&mut feed, "ego", 0.0);
        controller
            .listener_mut()
            .track("ego", Vec3::ZERO, crate::SpeedSource::Reported);

        controller.step(&feed).unwrap();
        assert!(controller.emitter("ego").is_some_and(Emitter::is_enabled));
    }

    /// Feed that reports some live ids without a state.
    struct PatchyFeed {
        inner: StaticFeed,
        blind: HashSet<String>,
    }

    impl TelemetryFeed for PatchyFeed {
        fn live_ids(&self) -> Vec<String> {
            self.inner.live_ids()
        }
        fn state(&self, id: &str) -> Option<EntityState> {
            if self.blind.contains(id) {
                None
            } else {
                self.inner.state(id)
            }
        }
        fn vehicle_class(&self, id: &str) -> Option<String> {
            self.inner.vehicle_class(id)
        }
    }

    #[test]
    fn test_missing_state_skips_update() {
        let (_headless, mut controller) = setup(None, SceneDesc::default());
        let mut feed = PatchyFeed {
            inner: StaticFeed::new(),
            blind: HashSet::from(["ghost".to_string()]),
        };
        car_at(&mut feed.inner, "a", 1.0);
        car_at(&mut feed.inner, "ghost", 2.0);

        let report = controller.step(&feed).unwrap();
        assert_eq!(report.added, vec!["a".to_string()]);
        assert!(controller.emitter("ghost").is_none());
        assert!(!controller.is_muted("ghost"));

        feed.blind.clear();
        let report = controller.step(&feed).unwrap();
        assert_eq!(report.added, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_telemetry_gap_spreads_acceleration() {
        let (_headless, mut controller) = setup(None, SceneDesc::default().step_length(0.5));
        let mut feed = PatchyFeed {
            inner: StaticFeed::new(),
            blind: HashSet::new(),
        };
        feed.inner
            .set_with_class("a", "car", EntityState::new(Vec3::new(1.0, 0.0, 0.0), 90.0, 10.0));
        controller.step(&feed).unwrap();

        feed.blind.insert("a".to_string());
        controller.step(&feed).unwrap();

        feed.blind.clear();
        feed.inner
            .set("a", EntityState::new(Vec3::new(11.0, 0.0, 0.0), 90.0, 12.0));
        controller.step(&feed).unwrap();
        // 2 m/s over two 0.5 s steps
        let accel = controller.emitter("a").map(Emitter::acceleration).unwrap();
        assert!((accel - 2.0).abs() < 1e-6);
    }

    /// Loader that cannot find one file and counts the attempts.
    struct MissingFileLoader {
        missing: &'static str,
        attempts: Rc<Cell<usize>>,
    }

    impl SoundLoader for MissingFileLoader {
        fn load(&self, file: &str, options: &LoadOptions) -> Result<SoundData> {
            if file == self.missing {
                self.attempts.set(self.attempts.get() + 1);
                return Err(SumoSoundError::AudioLoading(format!("{} not found", file)));
            }
            SilenceLoader::default().load(file, options)
        }
    }

    #[test]
    fn test_failed_load_is_reported_and_muted() {
        let attempts = Rc::new(Cell::new(0));
        let headless = Rc::new(RefCell::new(HeadlessBackend::with_loader(
            HeadlessBackendDesc::default(),
            MissingFileLoader {
                missing: "horn.wav",
                attempts: attempts.clone(),
            },
        )));
        let mut session = SoundSession::new(headless.clone(), SceneDesc::default());
        let listener = session.create_listener().unwrap();
        let classes = one_sound_map().with(
            "horn",
            Some(EmitterProfile::new("horn").with_sound(SoundSpec::new("horn.wav", 1.0))),
        );
        let mut controller = session.admission_controller(listener, classes).unwrap();

        let mut feed = StaticFeed::new();
        car_at(&mut feed, "a", 1.0);
        feed.set_with_class("b", "horn", EntityState::new(Vec3::new(2.0, 0.0, 0.0), 0.0, 0.0));
        car_at(&mut feed, "c", 3.0);

        let err = controller.step(&feed).unwrap_err();
        assert!(matches!(
            err,
            SumoSoundError::Backend(BackendError::BufferLoad { ref file, .. }) if file == "horn.wav"
        ));
        // The rest of the step still ran.
        assert_eq!(enabled_ids(&controller), vec!["a", "c"]);
        assert!(controller.emitter("b").is_none());
        assert!(controller.is_muted("b"));
        assert_eq!(attempts.get(), 1);

        let events = controller.poll_events();
        assert!(events.iter().any(|e| matches!(
            e,
            SceneEvent::BackendError { emitter_id: Some(id), .. } if id == "b"
        )));

        // Not retried while it stays in the scene.
        controller.step(&feed).unwrap();
        assert_eq!(attempts.get(), 1);
        assert!(controller.poll_events().iter().all(|e| !e.is_warning()));

        // Leaving and coming back clears the mute.
        feed.remove("b");
        controller.step(&feed).unwrap();
        assert!(!controller.is_muted("b"));
        feed.set_with_class("b", "horn", EntityState::new(Vec3::new(2.0, 0.0, 0.0), 0.0, 0.0));
        assert!(controller.step(&feed).is_err());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_capacity_holds_while_traffic_moves() {
        let (headless, mut controller) =
            setup(Some(5), SceneDesc::default().max_active_emitters(3));
        let mut feed = StaticFeed::new();
        for step in 0..10 {
            for i in 0..6 {
                // Cars drive toward and past the listener at different speeds.
                let x = -30.0 + (i as f32 + 1.0) * step as f32 * 1.5 + i as f32;
                car_at(&mut feed, &format!("veh{}", i), x);
            }
            let report = controller.step(&feed).unwrap();
            assert_eq!(report.enabled.len(), 3);
            assert!(headless.borrow().active_sources() <= 3);
        }
    }
}
