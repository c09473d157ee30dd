//! # SumoSound
//!
//! Proximity-gated spatial audio for traffic simulations.
//!
//! Every simulated vehicle becomes an [`Emitter`]: a bundle of positional
//! sounds whose gains follow the vehicle's speed, acceleration, or custom
//! signals through [`ResponseCurve`]s. Audio engines only have a limited
//! pool of concurrent sources, so an [`AdmissionController`] keeps just the
//! emitters nearest to the [`Listener`] enabled, lowering its ceiling when
//! the backend runs out of sources.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sumosound::*;
//! use sumosound::audio_data::SilenceLoader;
//!
//! let backend = HeadlessBackend::with_loader(HeadlessBackendDesc::default(), SilenceLoader::default());
//! let mut session = SoundSession::with_backend(backend, SceneDesc::default().max_active_emitters(32));
//!
//! let listener = session.create_listener()?;
//! let mut controller =
//!     session.admission_controller(listener, VehicleClassMap::sumo_defaults("stock_sounds"))?;
//!
//! // Feed simulation state every step
//! let mut feed = StaticFeed::new();
//! feed.set_with_class("veh0", "passenger", EntityState::new(Vec3::new(12.0, 3.0, 0.0), 90.0, 13.9));
//! let report = controller.step(&feed)?;
//! println!("{} emitters playing", report.enabled.len());
//!
//! for event in controller.poll_events() {
//!     if event.is_warning() {
//!         println!("{:?}", event);
//!     }
//! }
//! # Ok::<(), SumoSoundError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`SoundSession`]**: owns the backend handle and buffer cache, hands out the one listener
//! - **[`AdmissionController`]**: roster of emitters, ranked and admitted every step
//! - **[`Emitter`]**: one vehicle's sounds, driven by [`Signal`]s
//! - **[`SoundSource`]**: one positional sound that can release its backend source and come back
//! - **[`AudioBackend`]**: the audio engine seam; [`HeadlessBackend`] records everything in memory
//! - **[`TelemetryFeed`]**: the traffic simulation seam

pub mod admission;
pub mod audio_data;
pub mod backend;
pub mod buffer_cache;
pub mod config;
pub mod context;
pub mod curve;
pub mod emitter;
pub mod error;
pub mod events;
pub mod listener;
pub mod math;
pub mod placement;
pub mod session;
pub mod signal;
pub mod sound;
pub mod telemetry;

pub use admission::{AdmissionController, CapacityCeiling, StepReport};
pub use backend::{AudioBackend, BackendError, HeadlessBackend, HeadlessBackendDesc, SharedBackend};
pub use config::{ClassLookup, EmitterProfile, PlacementSpec, SceneDesc, SoundSpec, VehicleClassMap};
pub use context::AudioContext;
pub use curve::ResponseCurve;
pub use emitter::Emitter;
pub use error::{Result, SumoSoundError};
pub use events::SceneEvent;
pub use listener::{Listener, SpeedSource};
pub use math::{Orientation, Vec3};
pub use placement::{PlacementStrategy, TrailPlacement};
pub use session::SoundSession;
pub use signal::{KinematicState, Signal};
pub use sound::SoundSource;
pub use telemetry::{EntityState, StaticFeed, TelemetryFeed};
