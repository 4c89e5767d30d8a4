//! Component loader
//!
//! Resolves an import path such as `ships.movement.Mover` to a
//! [`BehaviorType`]. The part before the last `.` names a module, the part
//! after it names a member exported by that module.
//!
//! Modules come from a [`ModuleSource`] and are resolved into the loader's
//! module cache together with their transitive imports. Every load runs inside
//! a [`CacheScope`]: stand-in host modules from the [`HostEnvironment`] are
//! injected first, and when the scope ends every module the load introduced is
//! removed again, whether the load succeeded or not. Modules that were cached
//! before the load (preloaded ones) are left alone. Repeated loads therefore
//! see the current module definitions of the source.

use super::component::BehaviorType;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

/// Loader errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Import path cannot be split into module and member
    #[error("malformed import path {path:?}: {reason}")]
    MalformedPath {
        /// Offending path
        path: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Module or one of its transitive imports is not available
    #[error("module {module:?} not found{}", imported_by(.required_by))]
    Resolution {
        /// Missing module
        module: String,
        /// Module whose import failed, if the missing module is not the root
        required_by: Option<String>,
    },

    /// Module resolved but does not export the member
    #[error("module {module:?} has no member {member:?}")]
    MemberNotFound {
        /// Resolved module
        module: String,
        /// Missing member
        member: String,
    },
}

fn imported_by(required_by: &Option<String>) -> String {
    required_by
        .as_ref()
        .map(|parent| format!(" (imported by {parent:?})"))
        .unwrap_or_default()
}

/// Validated `module.Member` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportPath {
    path: String,
    split: usize,
}

impl ImportPath {
    /// Parse and validate an import path
    pub fn parse(path: &str) -> Result<Self, LoadError> {
        let malformed = |reason| LoadError::MalformedPath {
            path: path.to_string(),
            reason,
        };
        if path.is_empty() {
            return Err(malformed("empty path"));
        }
        if path.chars().any(|c| c == ',' || c.is_whitespace()) {
            return Err(malformed("contains a comma or whitespace"));
        }
        let split = path.rfind('.').ok_or_else(|| malformed("no '.' between module and member"))?;
        if split == 0 {
            return Err(malformed("empty module"));
        }
        if split + 1 == path.len() {
            return Err(malformed("empty member"));
        }
        Ok(Self {
            path: path.to_string(),
            split,
        })
    }

    /// Module portion
    pub fn module(&self) -> &str {
        &self.path[..self.split]
    }

    /// Member portion
    pub fn member(&self) -> &str {
        &self.path[self.split + 1..]
    }

    /// Full path
    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl FromStr for ImportPath {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A module definition: its imports and exported behavior types
#[derive(Clone)]
pub struct Module {
    name: String,
    imports: Vec<String>,
    members: IndexMap<String, Rc<dyn BehaviorType>>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            members: IndexMap::new(),
        }
    }

    /// Declare an imported module
    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.imports.push(module.into());
        self
    }

    /// Export a behavior type under its type name
    pub fn with_behavior(mut self, behavior: impl BehaviorType + 'static) -> Self {
        let name = behavior.type_name().to_string();
        self.members.insert(name, Rc::new(behavior));
        self
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Imported module names
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Look up an exported behavior type
    pub fn member(&self, name: &str) -> Option<Rc<dyn BehaviorType>> {
        self.members.get(name).cloned()
    }

    /// Exported member names
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("imports", &self.imports)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Where module definitions come from
pub trait ModuleSource {
    /// Produce the current definition of a module
    fn fetch(&self, name: &str) -> Option<Module>;
}

type ModuleBuilder = Rc<dyn Fn() -> Module>;

/// In-process module source keyed by module name
///
/// Registering a builder under an existing name replaces it, which is how
/// module code is swapped at runtime.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    builders: HashMap<String, ModuleBuilder>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a module builder
    pub fn register(&mut self, name: impl Into<String>, builder: impl Fn() -> Module + 'static) {
        self.builders.insert(name.into(), Rc::new(builder));
    }

    /// Register a fixed module definition
    pub fn register_module(&mut self, module: Module) {
        let name = module.name().to_string();
        self.register(name, move || module.clone());
    }

    /// Remove a module builder
    pub fn unregister(&mut self, name: &str) -> bool {
        self.builders.remove(name).is_some()
    }

    /// Whether a module is registered
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

impl ModuleSource for ModuleRegistry {
    fn fetch(&self, name: &str) -> Option<Module> {
        self.builders.get(name).map(|build| build())
    }
}

impl ModuleSource for Rc<RefCell<ModuleRegistry>> {
    fn fetch(&self, name: &str) -> Option<Module> {
        self.borrow().fetch(name)
    }
}

/// Capability handed to a load: the host modules visible to behavior code
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    stand_ins: Vec<Module>,
}

impl HostEnvironment {
    /// Environment with stand-in `host` and `host.types` modules, for
    /// resolving behaviors outside a running host
    pub fn sandbox() -> Self {
        Self {
            stand_ins: vec![Module::new("host"), Module::new("host.types")],
        }
    }

    /// Environment that relies on host modules already in the cache
    pub fn runtime() -> Self {
        Self::default()
    }

    /// Add a stand-in module
    pub fn with_module(mut self, module: Module) -> Self {
        self.stand_ins.push(module);
        self
    }

    fn inject(&self, cache: &mut ModuleCache) {
        for module in &self.stand_ins {
            if !cache.contains(module.name()) {
                cache.insert(module.clone());
            }
        }
    }
}

/// Resolved modules by name, in resolution order
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: IndexMap<String, Module>,
}

impl ModuleCache {
    /// Whether a module is cached
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Look up a cached module
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Cached module names in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Number of cached modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn insert(&mut self, module: Module) {
        self.modules.insert(module.name().to_string(), module);
    }
}

/// Guard that removes every module added to the cache while it is alive
pub struct CacheScope<'c> {
    cache: &'c mut ModuleCache,
    baseline: HashSet<String>,
}

impl<'c> CacheScope<'c> {
    /// Snapshot the cache
    pub fn new(cache: &'c mut ModuleCache) -> Self {
        let baseline = cache.modules.keys().cloned().collect();
        Self { cache, baseline }
    }
}

impl Deref for CacheScope<'_> {
    type Target = ModuleCache;

    fn deref(&self) -> &ModuleCache {
        self.cache
    }
}

impl DerefMut for CacheScope<'_> {
    fn deref_mut(&mut self) -> &mut ModuleCache {
        self.cache
    }
}

impl Drop for CacheScope<'_> {
    fn drop(&mut self) {
        let before = self.cache.modules.len();
        let baseline = &self.baseline;
        self.cache.modules.retain(|name, _| baseline.contains(name));
        let removed = before - self.cache.modules.len();
        if removed > 0 {
            log::debug!("Unloaded {removed} module(s) introduced by load");
        }
    }
}

/// Resolves import paths against a module source
pub struct ComponentLoader {
    source: Box<dyn ModuleSource>,
    cache: ModuleCache,
}

impl ComponentLoader {
    /// Create a loader over a module source
    pub fn new(source: impl ModuleSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: ModuleCache::default(),
        }
    }

    /// Resolve a module and its imports into the cache permanently
    pub fn preload(&mut self, module: &str) -> Result<(), LoadError> {
        resolve(self.source.as_ref(), &mut self.cache, module, None)?;
        log::debug!("Preloaded module {module:?}");
        Ok(())
    }

    /// Resolve an import path to its behavior type
    ///
    /// Modules introduced by this call are unloaded before it returns.
    pub fn load(&mut self, path: &str, host: &HostEnvironment) -> Result<Rc<dyn BehaviorType>, LoadError> {
        let path = ImportPath::parse(path)?;
        let mut scope = CacheScope::new(&mut self.cache);
        host.inject(&mut scope);
        resolve(self.source.as_ref(), &mut scope, path.module(), None)?;

        let behavior = scope
            .get(path.module())
            .and_then(|module| module.member(path.member()))
            .ok_or_else(|| LoadError::MemberNotFound {
                module: path.module().to_string(),
                member: path.member().to_string(),
            })?;
        log::debug!("Loaded {path}");
        Ok(behavior)
    }

    /// Module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }
}

impl fmt::Debug for ComponentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentLoader")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

// A module is cached before its imports are resolved so import cycles end.
fn resolve(
    source: &dyn ModuleSource,
    cache: &mut ModuleCache,
    name: &str,
    required_by: Option<&str>,
) -> Result<(), LoadError> {
    if cache.contains(name) {
        return Ok(());
    }
    let module = source.fetch(name).ok_or_else(|| LoadError::Resolution {
        module: name.to_string(),
        required_by: required_by.map(str::to_string),
    })?;
    let imports = module.imports().to_vec();
    cache.modules.insert(name.to_string(), module);
    for import in &imports {
        resolve(source, cache, import, Some(name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{
        ArgumentDefaults, Arguments, Behavior, BehaviorError, BehaviorFactory, ComponentContext,
    };
    use crate::value::Value;
    use std::cell::Cell;

    struct Inert;

    impl Behavior for Inert {
        fn start(&mut self, _ctx: &mut ComponentContext<'_>, _args: &Arguments) -> Result<(), BehaviorError> {
            Ok(())
        }

        fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
            Ok(())
        }
    }

    fn inert(name: &str, speed: f64) -> impl BehaviorType {
        BehaviorFactory::new(name, || Box::new(Inert) as Box<dyn Behavior>)
            .with_defaults(ArgumentDefaults::new().with("speed", speed))
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register("ships.util", || Module::new("ships.util"));
        registry.register("ships.movement", || {
            Module::new("ships.movement")
                .with_import("host")
                .with_import("ships.util")
                .with_behavior(inert("Mover", 1.0))
        });
        registry
    }

    #[test]
    fn test_import_path_split_at_last_dot() {
        let path = ImportPath::parse("ships.movement.Mover").expect("valid");
        assert_eq!(path.module(), "ships.movement");
        assert_eq!(path.member(), "Mover");
        assert_eq!(path.to_string(), "ships.movement.Mover");
    }

    #[test]
    fn test_malformed_paths() {
        for bad in ["", "Mover", ".Mover", "ships.", "a.B,c.D", "a. B"] {
            assert!(
                matches!(ImportPath::parse(bad), Err(LoadError::MalformedPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_load_unloads_introduced_modules() {
        let mut loader = ComponentLoader::new(registry());
        let behavior = loader
            .load("ships.movement.Mover", &HostEnvironment::sandbox())
            .expect("load");
        assert_eq!(behavior.type_name(), "Mover");
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_preloaded_modules_stay_cached() {
        let mut loader = ComponentLoader::new(registry());
        loader.preload("ships.util").expect("preload");
        loader
            .load("ships.movement.Mover", &HostEnvironment::sandbox())
            .expect("load");
        assert_eq!(loader.cache().names(), vec!["ships.util"]);
    }

    #[test]
    fn test_extra_stand_ins_resolve_and_unload() {
        let mut registry = registry();
        registry.register("ships.sensors", || {
            Module::new("ships.sensors")
                .with_import("host.physics")
                .with_behavior(inert("Radar", 0.0))
        });
        let mut loader = ComponentLoader::new(registry);

        assert!(matches!(
            loader.load("ships.sensors.Radar", &HostEnvironment::sandbox()),
            Err(LoadError::Resolution { module, .. }) if module == "host.physics"
        ));

        let host = HostEnvironment::sandbox().with_module(Module::new("host.physics"));
        let radar = loader.load("ships.sensors.Radar", &host).expect("stand-in provided");
        assert_eq!(radar.type_name(), "Radar");
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_runtime_environment_needs_host_modules() {
        let mut loader = ComponentLoader::new(registry());
        let err = loader
            .load("ships.movement.Mover", &HostEnvironment::runtime())
            .map(|_| ())
            .expect_err("host is not available");
        assert_eq!(
            err,
            LoadError::Resolution {
                module: "host".to_string(),
                required_by: Some("ships.movement".to_string()),
            }
        );
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_reload_sees_new_definition() {
        let registry = Rc::new(RefCell::new(registry()));
        let mut loader = ComponentLoader::new(Rc::clone(&registry));
        let host = HostEnvironment::sandbox();

        let first = loader.load("ships.movement.Mover", &host).expect("load");
        assert_eq!(first.declared_defaults().get("speed").map(|d| d.value().clone()), Some(Value::Float(1.0)));

        registry.borrow_mut().register("ships.movement", || {
            Module::new("ships.movement").with_behavior(inert("Mover", 4.0))
        });
        let second = loader.load("ships.movement.Mover", &host).expect("reload");
        assert_eq!(second.declared_defaults().get("speed").map(|d| d.value().clone()), Some(Value::Float(4.0)));
    }

    #[test]
    fn test_every_load_fetches_fresh() {
        let fetches = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fetches);
        let mut registry = ModuleRegistry::new();
        registry.register("a", move || {
            counter.set(counter.get() + 1);
            Module::new("a").with_behavior(inert("A", 0.0))
        });
        let mut loader = ComponentLoader::new(registry);
        let host = HostEnvironment::sandbox();
        loader.load("a.A", &host).expect("load");
        loader.load("a.A", &host).expect("load");
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_missing_transitive_import() {
        let mut registry = registry();
        registry.unregister("ships.util");
        let mut loader = ComponentLoader::new(registry);
        let err = loader
            .load("ships.movement.Mover", &HostEnvironment::sandbox())
            .map(|_| ())
            .expect_err("util is missing");
        assert!(matches!(err, LoadError::Resolution { module, .. } if module == "ships.util"));
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_member_not_found() {
        let mut loader = ComponentLoader::new(registry());
        let err = loader
            .load("ships.movement.Turret", &HostEnvironment::sandbox())
            .map(|_| ())
            .expect_err("no such member");
        assert_eq!(
            err,
            LoadError::MemberNotFound {
                module: "ships.movement".to_string(),
                member: "Turret".to_string(),
            }
        );
    }

    #[test]
    fn test_import_cycles_terminate() {
        let mut registry = ModuleRegistry::new();
        registry.register_module(Module::new("a").with_import("b").with_behavior(inert("A", 0.0)));
        registry.register_module(Module::new("b").with_import("a"));
        let mut loader = ComponentLoader::new(registry);
        assert!(loader.load("a.A", &HostEnvironment::sandbox()).is_ok());
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_error_messages() {
        let err = LoadError::Resolution {
            module: "b".to_string(),
            required_by: Some("a".to_string()),
        };
        assert_eq!(err.to_string(), "module \"b\" not found (imported by \"a\")");
    }
}
