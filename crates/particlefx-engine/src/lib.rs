//! Particle engine for the particlefx widget.
//!
//! An image is sampled into a field of particles, each tethered to the pixel
//! it came from. Every frame the particles are pulled back toward their
//! origins, pushed around by the pointer, damped, and drawn onto an RGBA
//! surface with an optional color filter and hue rotation.
//!
//! The [`Engine`] is the embeddable entry point; the remaining modules are
//! public so each stage can be driven and tested on its own.

pub mod color;
mod engine;
mod error;
pub mod field;
pub mod force;
pub mod integrator;
pub mod interaction;
pub mod render;
pub mod sampler;
mod source;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use field::{Origin, ParticleField, ParticleId};
pub use interaction::{ClickImpulse, PointerState};
pub use render::Surface;
pub use source::ImageSource;

pub use glam::Vec2;

pub use particlefx_core::{
    ConfigPatch, DEFAULT_EXPORT_FILENAME, EngineConfig, Filter, InvalidConfig, ParticleShape, Rgba,
};
