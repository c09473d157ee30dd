use crate::admission::AdmissionController;
use crate::backend::{AudioBackend, SharedBackend};
use crate::config::{SceneDesc, VehicleClassMap};
use crate::context::AudioContext;
use crate::error::{Result, SumoSoundError};
use crate::listener::Listener;
use std::cell::RefCell;
use std::rc::Rc;

/// Entry point of SumoSound.
///
/// A session owns the audio context (backend plus buffer cache) and hands
/// out the scene's single [`Listener`]. Emitters and controllers created
/// from it share its buffers.
pub struct SoundSession {
    desc: SceneDesc,
    context: AudioContext,
    listener_created: bool,
}

impl SoundSession {
    pub fn new(backend: SharedBackend, desc: SceneDesc) -> Self {
        log::info!(
            "Sound session created (max active emitters: {:?}, step length: {}s)",
            desc.max_active_emitters,
            desc.step_length
        );
        Self {
            desc,
            context: AudioContext::new(backend),
            listener_created: false,
        }
    }

    /// Wraps an owned backend. Use [`new`](Self::new) to keep a handle to it.
    pub fn with_backend(backend: impl AudioBackend + 'static, desc: SceneDesc) -> Self {
        Self::new(Rc::new(RefCell::new(backend)), desc)
    }

    pub fn desc(&self) -> &SceneDesc {
        &self.desc
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    /// Creates the scene's listener at the origin, with the configured
    /// master volume applied. A session has exactly one listener; a second
    /// call fails.
    pub fn create_listener(&mut self) -> Result<Listener> {
        if self.listener_created {
            return Err(SumoSoundError::Configuration(
                "a session has exactly one listener".into(),
            ));
        }
        let mut listener = Listener::new(self.context.backend().clone(), self.desc.step_length);
        listener.set_master_volume(self.desc.master_volume)?;
        self.listener_created = true;
        log::info!("Listener created (master volume {})", self.desc.master_volume);
        Ok(listener)
    }

    /// Builds the controller that admits emitters for the classes in `classes`.
    pub fn admission_controller(
        &self,
        listener: Listener,
        classes: VehicleClassMap,
    ) -> Result<AdmissionController> {
        classes.validate()?;
        Ok(AdmissionController::new(
            self.context.clone(),
            listener,
            classes,
            self.desc.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, HeadlessBackendDesc};
    use crate::config::{EmitterProfile, SoundSpec};
    use crate::curve::ResponseCurve;
    use crate::signal::Signal;

    #[test]
    fn test_second_listener_is_rejected() {
        let mut session =
            SoundSession::with_backend(HeadlessBackend::new(HeadlessBackendDesc::default()), SceneDesc::default());
        assert!(session.create_listener().is_ok());
        assert!(matches!(
            session.create_listener(),
            Err(SumoSoundError::Configuration(_))
        ));
    }

    #[test]
    fn test_listener_gets_master_volume() {
        let headless = Rc::new(RefCell::new(HeadlessBackend::new(HeadlessBackendDesc::default())));
        let mut session = SoundSession::new(headless.clone(), SceneDesc::default().master_volume(0.3));
        let listener = session.create_listener().unwrap();
        assert_eq!(listener.master_volume(), 0.3);
        assert_eq!(headless.borrow().listener().gain, 0.3);
    }

    #[test]
    fn test_invalid_class_map_is_rejected() {
        let mut session =
            SoundSession::with_backend(HeadlessBackend::new(HeadlessBackendDesc::default()), SceneDesc::default());
        let listener = session.create_listener().unwrap();
        let classes = VehicleClassMap::new().with(
            "horn",
            Some(EmitterProfile::new("horn").with_sound(SoundSpec::new("horn.wav", 1.0).modulated_by(
                Signal::custom("honk"),
                ResponseCurve::points(vec![(0.0, 0.0), (1.0, 1.0)]).unwrap(),
            ))),
        );
        assert!(matches!(
            session.admission_controller(listener, classes),
            Err(SumoSoundError::Configuration(_))
        ));
    }

    #[test]
    fn test_degenerate_curve_never_reaches_step() {
        let mut session =
            SoundSession::with_backend(HeadlessBackend::new(HeadlessBackendDesc::default()), SceneDesc::default());
        let listener = session.create_listener().unwrap();
        let classes = VehicleClassMap::new().with(
            "car",
            Some(EmitterProfile::new("car").with_sound(
                SoundSpec::new("car.wav", 1.0)
                    .modulated_by(Signal::Speed, ResponseCurve::from_points_unchecked(Vec::new())),
            )),
        );
        assert!(matches!(
            session.admission_controller(listener, classes),
            Err(SumoSoundError::Configuration(_))
        ));
    }
}
