//! Component runtime demo application
//!
//! Builds a small scene, attaches the sample behaviors through the component
//! editor and from persisted properties, and runs the fixed-step loop in real
//! time for a bounded number of ticks.
//!
//! Usage: `component_demo [config.toml|config.ron] [ticks]`

mod behaviors;

use component_engine::ecs::{EditorError, LoadError};
use component_engine::foundation::logging;
use component_engine::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

const DEFAULT_TICKS: u64 = 180;

#[derive(Error, Debug)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("cannot preload host modules: {0}")]
    Load(#[from] LoadError),

    #[error("invalid tick count {0:?}")]
    TickCount(String),
}

fn main() {
    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => RuntimeConfig::load_from_file(path)?,
        None => RuntimeConfig::default(),
    };
    logging::init_with_level(&config.log_level);

    let ticks = match args.get(1) {
        Some(text) => text.parse::<u64>().map_err(|_| DemoError::TickCount(text.clone()))?,
        None => DEFAULT_TICKS,
    };

    let mut loader = ComponentLoader::new(behaviors::registry());
    loader.preload("host")?;
    loader.preload("host.types")?;

    let naming = config.naming.clone();
    let logic_rate = config.logic_rate;
    let mut engine = Engine::new(config, loader)?;
    let index = engine.add_scene(build_scene(&naming));

    let mover = format!("{}.Mover", behaviors::MOTION_MODULE);
    let lifetime = format!("{}.Lifetime", behaviors::LIFETIME_MODULE);
    let ship = engine.scenes_mut()[index].spawn("ship");
    {
        let (mut editor, scenes) = engine.editor();
        for path in [&mover, &lifetime] {
            let defaults = editor.describe(path)?;
            let names: Vec<&str> = defaults.iter().map(|(name, _)| name).collect();
            log::info!("{path} declares {names:?}");
        }

        let Some(entity) = scenes[index].get_mut(ship) else {
            return Ok(());
        };
        editor.add_component(entity, &mover)?;
        editor.add_component(entity, &lifetime)?;

        let speed = format!("{}{mover}{}speed", naming.prefix, naming.separator);
        if let Err(err) = entity.union(speed).set(2.5) {
            log::warn!("Keeping default speed: {err}");
        }
    }

    let ticks_seen = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&ticks_seen);
    let report_every = u64::from(logic_rate.max(1));
    let _report = engine.install_hook(move |tick: &TickInfo, scenes: &mut [Scene]| {
        counter.set(tick.frame);
        if tick.frame % report_every == 0 {
            for entity in scenes.iter().flat_map(Scene::iter) {
                log::info!("[{}] {} {}", tick.frame, entity.name(), describe_state(entity));
            }
        }
    });

    let ran = engine.run(&mut SystemClock::new(), &mut TickLimit::new(ticks))?;
    log::info!("Ran {ran} tick(s); hook saw {}", ticks_seen.get());

    for entity in engine.scenes()[index].iter() {
        for (name, value) in entity.properties().iter() {
            log::debug!("{}: {name} = {value}", entity.name());
        }
    }
    Ok(())
}

// Persisted data the way a saved scene would carry it: a manifest plus stored
// argument overrides.
fn build_scene(naming: &NamingConvention) -> Scene {
    let spinner = format!("{}.Spinner", behaviors::MOTION_MODULE);
    let arg = |name: &str| format!("{}{spinner}{}{name}", naming.prefix, naming.separator);

    let mut scene = Scene::new("demo");
    let properties = [
        (naming.manifest_property.clone(), spinner.clone()),
        (arg("rate"), "90.0".to_string()),
        (arg("axis"), "\"z\"".to_string()),
        ("color".to_string(), "teal".to_string()),
    ];
    scene.spawn_with("beacon", properties.into_iter().collect());
    scene.spawn_with("rock", [("hp", "30")].into_iter().collect());
    scene
}

fn describe_state(entity: &Entity) -> String {
    let state: Vec<String> = ["position", "angle", "remaining"]
        .into_iter()
        .filter_map(|name| entity.properties().get(name).map(|value| format!("{name}={value}")))
        .collect();
    if state.is_empty() {
        "idle".to_string()
    } else {
        state.join(" ")
    }
}
