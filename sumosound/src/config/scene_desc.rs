/// Configuration descriptor for a SumoSound scene
#[derive(Debug, Clone)]
pub struct SceneDesc {
    /// Maximum number of emitters allowed to hold backend sources at once
    /// (`None` admits every emitter until the backend itself refuses)
    pub max_active_emitters: Option<usize>,
    /// Keep the listener's own tracked vehicle silent
    pub silent_self: bool,
    /// Simulated seconds per step, used to derive acceleration and speed
    pub step_length: f32,
    /// Listener gain applied when the listener is created
    pub master_volume: f32,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            max_active_emitters: None,
            silent_self: true,
            step_length: 1.0,
            master_volume: 1.0,
        }
    }
}

impl SceneDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_active_emitters(mut self, max: usize) -> Self {
        self.max_active_emitters = Some(max);
        self
    }

    pub fn silent_self(mut self, silent: bool) -> Self {
        self.silent_self = silent;
        self
    }

    pub fn step_length(mut self, seconds: f32) -> Self {
        self.step_length = seconds;
        self
    }

    pub fn master_volume(mut self, gain: f32) -> Self {
        self.master_volume = gain;
        self
    }
}
