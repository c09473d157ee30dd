mod profile;
mod scene_desc;

pub use profile::{ClassLookup, EmitterProfile, PlacementSpec, SoundSpec, VehicleClassMap};
pub use scene_desc::SceneDesc;
