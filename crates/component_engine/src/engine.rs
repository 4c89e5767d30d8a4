//! Core engine implementation

use crate::{
    core::config::{ConfigError, FailurePolicy, RuntimeConfig},
    ecs::{
        ComponentEditor, ComponentLifecycleManager, ComponentLoader, EntityId, ExitSignal, FixedStepScheduler,
        FrameReport, HookGuard, HostEnvironment, LifecycleError, Scene, SchedulerError, TickHook, TickInfo,
    },
    foundation::time::{Clock, Stopwatch},
};
use thiserror::Error;

/// Main engine struct
///
/// The engine owns the scenes, the component lifecycle manager and the
/// fixed-step scheduler, and drives components from the real-time loop.
#[derive(Debug)]
pub struct Engine {
    scenes: Vec<Scene>,
    manager: ComponentLifecycleManager,
    scheduler: FixedStepScheduler,
    config: RuntimeConfig,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: RuntimeConfig, loader: ComponentLoader) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!(
            "Initializing engine at {} ticks per second ({:?})",
            config.logic_rate,
            config.failure_policy
        );
        Ok(Self {
            scenes: Vec::new(),
            manager: ComponentLifecycleManager::new(loader, &config),
            scheduler: FixedStepScheduler::from_config(&config),
            config,
        })
    }

    /// Load components with another host environment
    pub fn with_host(mut self, host: HostEnvironment) -> Self {
        self.manager = self.manager.with_host(host);
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Add a scene, returning its index
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    /// All scenes
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Mutable access to all scenes
    pub fn scenes_mut(&mut self) -> &mut [Scene] {
        &mut self.scenes
    }

    /// Find a scene by name
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.name() == name)
    }

    /// Find a scene by name for mutation
    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|scene| scene.name() == name)
    }

    /// Component lifecycle manager
    pub fn manager(&self) -> &ComponentLifecycleManager {
        &self.manager
    }

    /// Mutable component lifecycle manager
    pub fn manager_mut(&mut self) -> &mut ComponentLifecycleManager {
        &mut self.manager
    }

    /// Scheduler
    pub fn scheduler(&self) -> &FixedStepScheduler {
        &self.scheduler
    }

    /// Component editor together with the scenes it edits
    pub fn editor(&mut self) -> (ComponentEditor<'_>, &mut [Scene]) {
        (ComponentEditor::new(&mut self.manager), &mut self.scenes)
    }

    /// Install a hook run after every tick
    #[must_use = "the hook is uninstalled as soon as the guard is dropped"]
    pub fn install_hook(&self, hook: impl TickHook + 'static) -> HookGuard {
        self.scheduler.install_hook(hook)
    }

    /// Drop an entity's live components so they are rebuilt next tick
    pub fn reset_entity(&mut self, scene: usize, entity: EntityId) -> bool {
        let Some(entity) = self.scenes.get_mut(scene).and_then(|s| s.get_mut(entity)) else {
            return false;
        };
        self.manager.reset(entity);
        true
    }

    /// Run the loop until the exit signal fires, returning the number of ticks run
    pub fn run<C, X>(&mut self, clock: &mut C, exit: &mut X) -> Result<u64, EngineError>
    where
        C: Clock + ?Sized,
        X: ExitSignal + ?Sized,
    {
        let stopwatch = Stopwatch::start_new();
        log::info!("Starting main loop with {} scene(s)", self.scenes.len());

        let Self {
            scenes,
            manager,
            scheduler,
            ..
        } = self;
        let ticks = scheduler.run(clock, scenes, exit, |tick, scenes| run_tick(manager, tick, scenes))?;

        log::info!("Main loop stopped after {ticks} tick(s) in {:.3}s", stopwatch.elapsed_secs());
        Ok(ticks)
    }

    /// Spend `elapsed` seconds of real time without a clock
    pub fn step_frame<X>(&mut self, elapsed: f64, exit: &mut X) -> Result<FrameReport, EngineError>
    where
        X: ExitSignal + ?Sized,
    {
        let Self {
            scenes,
            manager,
            scheduler,
            ..
        } = self;
        scheduler.advance(elapsed, scenes, exit, |tick, scenes| run_tick(manager, tick, scenes))
    }
}

// One simulation tick: start and update every entity with component data in
// every active scene, in scene and spawn order.
fn run_tick(manager: &mut ComponentLifecycleManager, tick: &TickInfo, scenes: &mut [Scene]) -> Result<(), EngineError> {
    manager.begin_tick(*tick);
    for scene in scenes.iter_mut().filter(|scene| scene.is_active()) {
        for id in scene.entity_ids() {
            let Some(entity) = scene.get_mut(id) else {
                continue;
            };
            if !entity.is_initialized() && !manager.has_component_data(entity) {
                continue;
            }

            let result = manager
                .ensure_initialized(entity)
                .and_then(|_| manager.update(entity));
            if let Err(source) = result {
                let entity = entity.name().to_string();
                let err = EngineError::Lifecycle {
                    scene: scene.name().to_string(),
                    entity,
                    source,
                };
                match manager.failure_policy() {
                    FailurePolicy::FailFast => return Err(err),
                    FailurePolicy::IsolateAndContinue => log::error!("{err}"),
                }
            }
        }
    }
    Ok(())
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A component failed to start or update
    #[error("{scene}/{entity}: {source}")]
    Lifecycle {
        /// Scene name
        scene: String,
        /// Entity name
        entity: String,
        /// Lifecycle failure
        #[source]
        source: LifecycleError,
    },

    /// The loop cannot run
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
