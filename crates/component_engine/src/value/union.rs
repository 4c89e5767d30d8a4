//! Named single-kind value bound to an entity property
//!
//! A union starts `Unset`. The first write binds it to the written kind and
//! every later write must use the same kind. The value text lives under the
//! union's own name; the kind tag and, for choices, the allowed tags live in
//! sibling properties so they survive a restart without inspecting the value.

use super::codec::{self, CodecError};
use super::{ChoiceSet, Value, ValueKind};
use crate::ecs::property::PropertyStore;
use crate::foundation::math::{Vec2, Vec3, Vec4};
use thiserror::Error;

const KIND_KEY_PREFIX: &str = "__kind__";
const CHOICES_KEY_PREFIX: &str = "__choices__";

/// Union errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnionError {
    /// Write or typed read of a kind other than the bound one
    #[error("union {name:?} is bound to {bound}, not {requested}")]
    Type {
        /// Union name
        name: String,
        /// Kind the union is bound to
        bound: ValueKind,
        /// Kind that was requested
        requested: ValueKind,
    },

    /// Read before any write
    #[error("union {name:?} has no value")]
    Unset {
        /// Union name
        name: String,
    },

    /// Stored text could not be decoded, or a choice is not allowed
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Property holding the kind tag of union `name`
pub fn kind_key(name: &str) -> String {
    format!("{KIND_KEY_PREFIX}{name}")
}

/// Property holding the choice set of union `name`
pub fn choices_key(name: &str) -> String {
    format!("{CHOICES_KEY_PREFIX}{name}")
}

/// Whether `name` is a union sibling property rather than data
pub fn is_sibling_key(name: &str) -> bool {
    name.starts_with(KIND_KEY_PREFIX) || name.starts_with(CHOICES_KEY_PREFIX)
}

/// Remove union `name` and its sibling properties
pub fn remove(properties: &mut PropertyStore, name: &str) {
    properties.remove(name);
    properties.remove(&kind_key(name));
    properties.remove(&choices_key(name));
}

/// A union view over an entity's property store
pub struct UnionValue<'a> {
    name: String,
    properties: &'a mut PropertyStore,
}

macro_rules! typed_accessors {
    ($($set:ident, $get:ident, $ty:ty, $kind:ident, $as:ident;)*) => {
        $(
            #[doc = concat!("Write a `", stringify!($kind), "` value")]
            pub fn $set(&mut self, value: $ty) -> Result<(), UnionError> {
                self.set(Value::$kind(value))
            }

            #[doc = concat!("Read the value as `", stringify!($kind), "`")]
            pub fn $get(&self) -> Result<$ty, UnionError> {
                let (_, value) = self.get_as(ValueKind::$kind)?;
                value.$as().ok_or_else(|| self.type_error(value.kind(), ValueKind::$kind))
            }
        )*
    };
}

impl<'a> UnionValue<'a> {
    /// Attach to union `name` stored in `properties`
    pub fn new(name: impl Into<String>, properties: &'a mut PropertyStore) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Union name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound kind, or `None` while unset
    pub fn kind(&self) -> Result<Option<ValueKind>, UnionError> {
        self.properties
            .get(&kind_key(&self.name))
            .map(str::parse::<ValueKind>)
            .transpose()
            .map_err(UnionError::from)
    }

    /// Write a value, binding the union on first write
    pub fn set(&mut self, value: impl Into<Value>) -> Result<(), UnionError> {
        let value = value.into();
        let requested = value.kind();
        if let Some(bound) = self.kind()? {
            if bound != requested {
                return Err(self.type_error(bound, requested));
            }
        }

        if let Value::Choice(tag) = &value {
            let choices = self.get_choices()?;
            if !choices.is_empty() && !choices.contains(tag) {
                return Err(CodecError::UnknownChoice { tag: tag.clone() }.into());
            }
        }

        self.properties.set(self.name.clone(), codec::encode(&value));
        self.properties.set(kind_key(&self.name), requested.as_str());
        Ok(())
    }

    /// Read the bound kind and value
    pub fn get(&self) -> Result<(ValueKind, Value), UnionError> {
        let kind = self.kind()?.ok_or_else(|| self.unset_error())?;
        let text = self.properties.get(&self.name).ok_or_else(|| self.unset_error())?;
        let choices = match kind {
            ValueKind::Choice => Some(self.get_choices()?),
            _ => None,
        };
        let choices = choices.filter(|set| !set.is_empty());
        let value = codec::decode(kind, text, choices.as_ref())?;
        Ok((kind, value))
    }

    /// Read the value, failing if the union is bound to another kind
    pub fn get_as(&self, kind: ValueKind) -> Result<(ValueKind, Value), UnionError> {
        let (bound, value) = self.get()?;
        if bound != kind {
            return Err(self.type_error(bound, kind));
        }
        Ok((bound, value))
    }

    /// Replace the allowed choice tags
    pub fn set_choices(&mut self, choices: &ChoiceSet) {
        self.properties.set(choices_key(&self.name), codec::encode_choices(choices));
    }

    /// Allowed choice tags; empty when none were declared
    pub fn get_choices(&self) -> Result<ChoiceSet, UnionError> {
        match self.properties.get(&choices_key(&self.name)) {
            Some(text) => Ok(codec::decode_choices(text)?),
            None => Ok(ChoiceSet::default()),
        }
    }

    /// Clear the value and kind tag so the union can be bound again
    ///
    /// Declared choices are kept.
    pub fn reset(&mut self) {
        self.properties.remove(&self.name);
        self.properties.remove(&kind_key(&self.name));
    }

    typed_accessors! {
        set_string, get_string, String, String, as_string_owned;
        set_integer, get_integer, i64, Integer, as_integer;
        set_float, get_float, f64, Float, as_float;
        set_bool, get_bool, bool, Boolean, as_bool;
        set_vector2, get_vector2, Vec2, Vector2, as_vector2;
        set_vector3, get_vector3, Vec3, Vector3, as_vector3;
        set_vector4, get_vector4, Vec4, Vector4, as_vector4;
    }

    /// Write a choice tag
    pub fn set_choice(&mut self, tag: impl Into<String>) -> Result<(), UnionError> {
        self.set(Value::Choice(tag.into()))
    }

    /// Read the value as a choice tag
    pub fn get_choice(&self) -> Result<String, UnionError> {
        match self.get_as(ValueKind::Choice)? {
            (_, Value::Choice(tag)) => Ok(tag),
            (_, other) => Err(self.type_error(other.kind(), ValueKind::Choice)),
        }
    }

    fn type_error(&self, bound: ValueKind, requested: ValueKind) -> UnionError {
        UnionError::Type {
            name: self.name.clone(),
            bound,
            requested,
        }
    }

    fn unset_error(&self) -> UnionError {
        UnionError::Unset {
            name: self.name.clone(),
        }
    }
}

impl Value {
    fn as_string_owned(&self) -> Option<String> {
        self.as_str().map(str::to_string)
    }
}
