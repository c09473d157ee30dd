mod cli;
mod traffic;

use anyhow::Result;
use cli::DemoArgs;
use glam::Vec3;
use std::path::PathBuf;
use sumosound::audio_data::SilenceLoader;
use sumosound::{
    EmitterProfile, HeadlessBackend, HeadlessBackendDesc, PlacementSpec, SceneDesc, SceneEvent,
    SoundSession, SoundSpec, SpeedSource, VehicleClassMap,
};
use traffic::Traffic;

const STEP_LENGTH: f32 = 0.5;
const EAR_HEIGHT: f32 = 1.2;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = DemoArgs::parse(std::env::args().skip(1))?;
    run(&args)
}

fn run(args: &DemoArgs) -> Result<()> {
    let backend_desc = HeadlessBackendDesc {
        max_sources: args.backend_sources,
        ..Default::default()
    };
    let (backend, assets) = match &args.assets {
        Some(dir) => (HeadlessBackend::new(backend_desc), dir.clone()),
        None => {
            log::info!("No asset directory given; synthesizing silent buffers");
            (
                HeadlessBackend::with_loader(backend_desc, SilenceLoader::default()),
                PathBuf::from("stock_sounds"),
            )
        }
    };

    let mut desc = SceneDesc::default().step_length(STEP_LENGTH);
    desc.max_active_emitters = args.capacity;
    let mut session = SoundSession::with_backend(backend, desc);

    let mut listener = session.create_listener()?;
    match &args.track {
        Some(id) => listener.track(id.as_str(), Vec3::new(0.0, 0.0, EAR_HEIGHT), SpeedSource::Reported),
        None => {
            listener.set_position(Vec3::new(0.0, -8.0, EAR_HEIGHT))?;
            listener.set_angle(90.0)?;
        }
    }

    let classes = VehicleClassMap::sumo_defaults(&assets).with("tram", Some(tram_profile(&assets)?));
    let mut controller = session.admission_controller(listener, classes)?;
    let mut traffic = Traffic::crossing(STEP_LENGTH);

    for step in 0..args.steps {
        traffic.advance(step);
        if step == args.steps / 2 {
            // Ambulance turns its siren off halfway through
            if let Some(ambulance) = controller.emitter_mut("ambulance") {
                log::info!("Switching siren off");
                ambulance.set_signal("siren", 0.0);
            }
        }

        let report = controller.step(traffic.feed())?;
        log::info!(
            "step {:>3}: {} vehicles, {} emitters, {} enabled (ceiling {:?})",
            step,
            traffic.feed().len(),
            controller.emitter_count(),
            report.enabled.len(),
            report.ceiling
        );
        if !report.enabled.is_empty() {
            log::debug!("  nearest: {}", report.enabled.join(", "));
        }
        for event in controller.poll_events() {
            match event {
                SceneEvent::CapacityLowered { previous, ceiling } => {
                    log::warn!("  capacity lowered {:?} -> {}", previous, ceiling)
                }
                SceneEvent::BackendError { emitter_id, error } => {
                    log::error!("  backend error on {:?}: {}", emitter_id, error)
                }
                other => log::debug!("  {:?}", other),
            }
        }
    }

    log::info!("Done: {:?}", controller);
    Ok(())
}

/// Two bogies 25 m apart, each rumbling with speed.
fn tram_profile(assets: &std::path::Path) -> Result<EmitterProfile> {
    let rumble = sumosound::ResponseCurve::points(vec![(0.0, 0.2), (15.0, 1.0)])?;
    let bogie = || {
        SoundSpec::new(
            assets.join("truck-ext-idle-engine-close1.wav").to_string_lossy(),
            1.0,
        )
        .modulated_by(sumosound::Signal::Speed, rumble.clone())
    };
    Ok(EmitterProfile::new("tram")
        .with_sound(bogie())
        .with_sound(bogie())
        .with_placement(PlacementSpec::Trail {
            spacing: vec![0.0, 25.0],
        }))
}
