//! Math types used by vector-valued component arguments

pub use nalgebra::{Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// Axis names in storage order. A vector of size N uses the first N names.
pub const AXES: [&str; 4] = ["x", "y", "z", "w"];
