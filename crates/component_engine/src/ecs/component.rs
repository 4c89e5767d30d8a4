//! Behavior trait and component instances
//!
//! A behavior is per-entity update logic resolved from an import path at
//! runtime. The [`BehaviorType`] is what the loader resolves; it declares the
//! default arguments and creates fresh [`Behavior`] objects. A
//! [`ComponentInstance`] pairs one such object with the arguments it was
//! started with and lives in its entity's live component list.

use super::entity::EntityId;
use super::property::PropertyStore;
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::value::{ChoiceSet, CodecError, UnionError, Value, ValueKind};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Error returned by a behavior's hooks
#[derive(Error, Debug)]
pub enum BehaviorError {
    /// Free-form failure
    #[error("{0}")]
    Message(String),

    /// Failure reading or writing a union property
    #[error(transparent)]
    Union(#[from] UnionError),

    /// Failure decoding a property
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl BehaviorError {
    /// Create a free-form error
    pub fn new(message: impl Into<String>) -> Self {
        BehaviorError::Message(message.into())
    }
}

impl From<String> for BehaviorError {
    fn from(message: String) -> Self {
        BehaviorError::Message(message)
    }
}

impl From<&str> for BehaviorError {
    fn from(message: &str) -> Self {
        BehaviorError::Message(message.to_string())
    }
}

/// What a hook can see of its owning entity
pub struct ComponentContext<'a> {
    /// Owning entity
    pub entity: EntityId,
    /// Owning entity's name
    pub entity_name: &'a str,
    /// Owning entity's persisted properties
    pub properties: &'a mut PropertyStore,
    /// Current simulation frame
    pub frame: u64,
    /// Length of one simulation tick in seconds
    pub tick_duration: f64,
}

/// Per-entity update logic
pub trait Behavior {
    /// Called once with the merged arguments before the first update
    fn start(&mut self, ctx: &mut ComponentContext<'_>, args: &Arguments) -> Result<(), BehaviorError>;

    /// Called once per simulation tick
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError>;
}

/// A resolvable behavior implementation
pub trait BehaviorType {
    /// Name the type is exported under in its module
    fn type_name(&self) -> &str;

    /// Declared default arguments
    fn declared_defaults(&self) -> ArgumentDefaults {
        ArgumentDefaults::default()
    }

    /// Create a fresh, unstarted behavior
    fn instantiate(&self) -> Box<dyn Behavior>;
}

/// [`BehaviorType`] built from a name, defaults and a constructor
pub struct BehaviorFactory<F> {
    name: String,
    defaults: ArgumentDefaults,
    constructor: F,
}

impl<F> BehaviorFactory<F>
where
    F: Fn() -> Box<dyn Behavior>,
{
    /// Create a factory with no declared arguments
    pub fn new(name: impl Into<String>, constructor: F) -> Self {
        Self {
            name: name.into(),
            defaults: ArgumentDefaults::default(),
            constructor,
        }
    }

    /// Set the declared default arguments
    pub fn with_defaults(mut self, defaults: ArgumentDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

impl<F> BehaviorType for BehaviorFactory<F>
where
    F: Fn() -> Box<dyn Behavior>,
{
    fn type_name(&self) -> &str {
        &self.name
    }

    fn declared_defaults(&self) -> ArgumentDefaults {
        self.defaults.clone()
    }

    fn instantiate(&self) -> Box<dyn Behavior> {
        (self.constructor)()
    }
}

/// One declared argument: its default value and, for choices, the allowed tags
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefault {
    value: Value,
    choices: Option<ChoiceSet>,
}

impl ArgumentDefault {
    /// Default value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value kind
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Allowed tags for choice arguments
    pub fn choices(&self) -> Option<&ChoiceSet> {
        self.choices.as_ref()
    }
}

/// Ordered argument declarations of a behavior type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentDefaults {
    entries: IndexMap<String, ArgumentDefault>,
}

impl ArgumentDefaults {
    /// Create an empty declaration list
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an argument with a default value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(
            name.into(),
            ArgumentDefault {
                value: value.into(),
                choices: None,
            },
        );
        self
    }

    /// Declare a choice argument; `selected` should be one of `choices`
    pub fn with_choice<I, S>(mut self, name: impl Into<String>, choices: I, selected: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            name.into(),
            ArgumentDefault {
                value: Value::Choice(selected.into()),
                choices: Some(ChoiceSet::new(choices)),
            },
        );
        self
    }

    /// Look up a declaration
    pub fn get(&self, name: &str) -> Option<&ArgumentDefault> {
        self.entries.get(name)
    }

    /// Whether `name` is declared
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Declarations in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentDefault)> {
        self.entries.iter().map(|(name, default)| (name.as_str(), default))
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merged arguments a behavior is started with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look up a value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String argument
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Integer argument
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    /// Float argument
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    /// Boolean argument
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// 2D vector argument
    pub fn get_vector2(&self, name: &str) -> Option<Vec2> {
        self.get(name).and_then(Value::as_vector2)
    }

    /// 3D vector argument
    pub fn get_vector3(&self, name: &str) -> Option<Vec3> {
        self.get(name).and_then(Value::as_vector3)
    }

    /// 4D vector argument
    pub fn get_vector4(&self, name: &str) -> Option<Vec4> {
        self.get(name).and_then(Value::as_vector4)
    }

    /// Choice argument
    pub fn get_choice(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_choice)
    }

    /// Values in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A started behavior attached to an entity
pub struct ComponentInstance {
    import_path: String,
    arguments: Arguments,
    behavior: Box<dyn Behavior>,
}

impl ComponentInstance {
    pub(crate) fn new(import_path: impl Into<String>, arguments: Arguments, behavior: Box<dyn Behavior>) -> Self {
        Self {
            import_path: import_path.into(),
            arguments,
            behavior,
        }
    }

    /// Import path the behavior was resolved from
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Arguments the behavior was started with
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut dyn Behavior {
        self.behavior.as_mut()
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("import_path", &self.import_path)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
