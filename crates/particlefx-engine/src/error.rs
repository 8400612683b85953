//! Engine error type.

use std::path::PathBuf;

use ::image::error::ImageError;
use particlefx_core::InvalidConfig;
use thiserror::Error;

/// Errors reported by the engine's public operations.
///
/// Calls made after [`Engine::destroy`](crate::Engine::destroy) never produce
/// an error; they are silently ignored.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The image could not be decoded. The previous particle field is kept.
    #[error("failed to decode image {origin}: {source}")]
    Decode {
        /// Where the image came from (path or a short description).
        origin: String,
        #[source]
        source: ImageError,
    },
    /// A configuration update was rejected. The previous configuration is kept.
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfig),
    /// The surface could not be encoded as PNG.
    #[error("failed to encode surface: {0}")]
    Export(#[source] ImageError),
    /// Writing an exported image failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
