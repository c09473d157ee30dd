//! Event types for the admission controller

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    EmitterAdded {
        emitter_id: String,
        class: String,
    },
    EmitterRemoved {
        emitter_id: String,
    },
    EmitterEnabled {
        emitter_id: String,
        distance: f32,
    },
    EmitterDisabled {
        emitter_id: String,
    },
    /// The entity's class has no sound (or is not in the class map)
    EmitterMuted {
        emitter_id: String,
        class: Option<String>,
    },
    /// The backend ran out of sources; the active ceiling was lowered
    CapacityLowered {
        previous: Option<usize>,
        ceiling: usize,
    },
    BackendError {
        emitter_id: Option<String>,
        error: String,
    },
}

impl SceneEvent {
    pub fn emitter_id(&self) -> Option<&str> {
        match self {
            Self::EmitterAdded { emitter_id, .. }
            | Self::EmitterRemoved { emitter_id }
            | Self::EmitterEnabled { emitter_id, .. }
            | Self::EmitterDisabled { emitter_id }
            | Self::EmitterMuted { emitter_id, .. } => Some(emitter_id),
            Self::BackendError { emitter_id, .. } => emitter_id.as_deref(),
            Self::CapacityLowered { .. } => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::CapacityLowered { .. } | Self::BackendError { .. }
        )
    }

    pub fn is_emitter_event(&self) -> bool {
        matches!(
            self,
            Self::EmitterAdded { .. }
                | Self::EmitterRemoved { .. }
                | Self::EmitterEnabled { .. }
                | Self::EmitterDisabled { .. }
                | Self::EmitterMuted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let lowered = SceneEvent::CapacityLowered {
            previous: None,
            ceiling: 3,
        };
        assert!(lowered.is_warning());
        assert!(!lowered.is_emitter_event());
        assert_eq!(lowered.emitter_id(), None);

        let enabled = SceneEvent::EmitterEnabled {
            emitter_id: "veh0".into(),
            distance: 4.0,
        };
        assert!(enabled.is_emitter_event());
        assert_eq!(enabled.emitter_id(), Some("veh0"));
    }
}
