//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for vector arguments
//! - Time sources for the fixed-step loop
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
