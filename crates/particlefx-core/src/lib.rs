//! Core types shared by the particlefx crates.
//!
//! Everything here is plain data: colors, the filter and shape enums, and the
//! engine configuration together with the partial patch used to update it.

mod color;
mod config;

pub use color::Rgba;
pub use config::{
    ConfigPatch, DEFAULT_EXPORT_FILENAME, EngineConfig, Filter, HUE_STEPS_PER_DEGREE, InvalidConfig,
    ParticleShape, wrap_degrees,
};
