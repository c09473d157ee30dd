//! Error types for SumoSound

use crate::backend::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SumoSoundError {
    /// A profile, curve, or session was set up inconsistently. Never recovered.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A signal named by a sound does not resolve on its emitter.
    #[error("Signal '{signal}' does not resolve on emitter '{emitter}'")]
    SignalLookup { signal: String, emitter: String },

    /// The backend refused to allocate another source.
    #[error("Audio backend source capacity exhausted (limit: {limit:?})")]
    BackendCapacity { limit: Option<usize> },

    #[error("Audio backend error: {0}")]
    Backend(BackendError),

    #[error("Audio loading error: {0}")]
    AudioLoading(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SumoSoundError {
    /// Returns true if this error signals an exhausted backend source pool.
    pub fn is_capacity_exhausted(&self) -> bool {
        matches!(self, Self::BackendCapacity { .. })
    }
}

impl From<BackendError> for SumoSoundError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::CapacityExhausted { limit } => Self::BackendCapacity { limit },
            other => Self::Backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SumoSoundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_is_distinguished() {
        let err: SumoSoundError = BackendError::CapacityExhausted { limit: Some(3) }.into();
        assert!(err.is_capacity_exhausted());

        let err: SumoSoundError = BackendError::Device("unplugged".to_string()).into();
        assert!(!err.is_capacity_exhausted());
        assert!(matches!(err, SumoSoundError::Backend(_)));
    }

    #[test]
    fn test_signal_lookup_display() {
        let err = SumoSoundError::SignalLookup {
            signal: "siren".to_string(),
            emitter: "veh0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Signal 'siren' does not resolve on emitter 'veh0'"
        );
    }
}
