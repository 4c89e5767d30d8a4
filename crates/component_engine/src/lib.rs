//! # Component Engine
//!
//! A component runtime for scene entities: behaviors are resolved from import
//! paths at runtime, configured through arguments stored as entity
//! properties, and driven by a fixed-timestep simulation loop.
//!
//! ## Features
//!
//! - **Typed Arguments**: String, integer, float, boolean, vector and choice
//!   values persisted as self-describing text
//! - **Sandboxed Loading**: Import paths resolved against a module source with
//!   deterministic module cache cleanup
//! - **Lifecycle Management**: Idempotent start, per-tick update and
//!   configurable failure isolation
//! - **Fixed-Step Loop**: Accumulator scheduling with catch-up and exit
//!   within one tick
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use component_engine::prelude::*;
//!
//! struct Idle;
//!
//! impl Behavior for Idle {
//!     fn start(&mut self, _ctx: &mut ComponentContext<'_>, _args: &Arguments) -> Result<(), BehaviorError> {
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = ModuleRegistry::new();
//!     registry.register("demo", || {
//!         Module::new("demo").with_behavior(BehaviorFactory::new("Idle", || Box::new(Idle) as Box<dyn Behavior>))
//!     });
//!
//!     let mut engine = Engine::new(RuntimeConfig::default(), ComponentLoader::new(registry))?;
//!     let mut scene = Scene::new("main");
//!     scene.spawn_with("thing", [("_component_paths", "demo.Idle")].into_iter().collect());
//!     engine.add_scene(scene);
//!     engine.run(&mut SystemClock::new(), &mut TickLimit::new(60))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod value;
pub mod ecs;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        core::config::{FailurePolicy, NamingConvention, ParsePolicy, RuntimeConfig},
        config::{Config, ConfigError},
        foundation::{
            math::{Vec2, Vec3, Vec4},
            time::{Clock, ManualClock, Stopwatch, SystemClock},
        },
        value::{ChoiceSet, Value, ValueKind, UnionValue},
        ecs::{
            ArgumentDefaults, Arguments, Behavior, BehaviorError, BehaviorFactory, BehaviorType,
            ComponentContext, ComponentEditor, ComponentLoader, Entity, EntityId, ExitSignal,
            HostEnvironment, Module, ModuleRegistry, Scene, TickInfo, TickLimit,
        },
    };
}
