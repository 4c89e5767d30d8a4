//! Entity-Component-System implementation
//!
//! Entities live in scenes and carry a flat list of persisted properties.
//! Components are behaviors resolved by import path at runtime; their
//! arguments are multiplexed into the property list by naming convention,
//! and the fixed-step scheduler starts and updates them tick by tick.

pub mod arguments;
pub mod component;
pub mod editor;
pub mod entity;
pub mod hooks;
pub mod lifecycle;
pub mod loader;
pub mod property;
pub mod scene;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use arguments::{merge_arguments, ArgumentError, ArgumentGroup, ArgumentGroups, ArgumentStore};
pub use component::{
    ArgumentDefault, ArgumentDefaults, Arguments, Behavior, BehaviorError, BehaviorFactory, BehaviorType,
    ComponentContext, ComponentInstance,
};
pub use editor::{ComponentEditor, EditorError};
pub use entity::{ComponentSlot, Entity, EntityId};
pub use hooks::{HookGuard, HookList, TickHook};
pub use lifecycle::{ComponentLifecycleManager, LifecycleError, UpdateSummary};
pub use loader::{
    CacheScope, ComponentLoader, HostEnvironment, ImportPath, LoadError, Module, ModuleCache, ModuleRegistry,
    ModuleSource,
};
pub use property::PropertyStore;
pub use scene::Scene;
pub use scheduler::{ExitSignal, FixedStepScheduler, FrameReport, SchedulerError, SchedulerState, TickInfo, TickLimit};
