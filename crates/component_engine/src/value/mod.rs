//! Dynamically typed argument values
//!
//! Component arguments are edited through a generic property editor, so their
//! type is only known at runtime. [`Value`] is the closed set of kinds the
//! editor supports, [`codec`] turns them into persisted text and [`union`]
//! binds one named value to an entity's property list.

pub mod codec;
pub mod union;

pub use codec::{decode, encode, CodecError};
pub use union::{UnionError, UnionValue};

use crate::foundation::math::{Vec2, Vec3, Vec4};
use indexmap::IndexSet;
use std::fmt;
use std::str::FromStr;

/// Kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// Two float components
    Vector2,
    /// Three float components
    Vector3,
    /// Four float components
    Vector4,
    /// One tag out of a declared choice set
    Choice,
}

impl ValueKind {
    /// Every kind, in editor display order
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Vector2,
        ValueKind::Vector3,
        ValueKind::Vector4,
        ValueKind::Integer,
        ValueKind::Boolean,
        ValueKind::Float,
        ValueKind::String,
        ValueKind::Choice,
    ];

    /// Persisted tag name
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Vector2 => "vector2",
            ValueKind::Vector3 => "vector3",
            ValueKind::Vector4 => "vector4",
            ValueKind::Choice => "choice",
        }
    }

    /// Number of components for vector kinds
    pub fn vector_size(self) -> Option<usize> {
        match self {
            ValueKind::Vector2 => Some(2),
            ValueKind::Vector3 => Some(3),
            ValueKind::Vector4 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::Decode {
                fragment: s.to_string(),
                reason: "unknown value kind".to_string(),
            })
    }
}

/// A single argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string
    String(String),
    /// Signed 64-bit integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// Two float components
    Vector2(Vec2),
    /// Three float components
    Vector3(Vec3),
    /// Four float components
    Vector4(Vec4),
    /// Choice tag
    Choice(String),
}

impl Value {
    /// Build a choice value
    pub fn choice(tag: impl Into<String>) -> Self {
        Value::Choice(tag.into())
    }

    /// Kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Vector2(_) => ValueKind::Vector2,
            Value::Vector3(_) => ValueKind::Vector3,
            Value::Vector4(_) => ValueKind::Vector4,
            Value::Choice(_) => ValueKind::Choice,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// 2D vector payload
    pub fn as_vector2(&self) -> Option<Vec2> {
        match self {
            Value::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    /// 3D vector payload
    pub fn as_vector3(&self) -> Option<Vec3> {
        match self {
            Value::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// 4D vector payload
    pub fn as_vector4(&self) -> Option<Vec4> {
        match self {
            Value::Vector4(v) => Some(*v),
            _ => None,
        }
    }

    /// Choice tag payload
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Value::Choice(tag) => Some(tag),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec2> for Value {
    fn from(value: Vec2) -> Self {
        Value::Vector2(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Value::Vector3(value)
    }
}

impl From<Vec4> for Value {
    fn from(value: Vec4) -> Self {
        Value::Vector4(value)
    }
}

/// Ordered set of allowed choice tags
///
/// Order only matters for display. Values are persisted by tag, so reordering
/// the set never changes what a stored choice means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSet {
    tags: IndexSet<String>,
}

impl ChoiceSet {
    /// Build a set from tags; duplicates keep their first position
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `tag` is allowed
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Display position of `tag`
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.tags.get_index_of(tag)
    }

    /// Tags in display order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
