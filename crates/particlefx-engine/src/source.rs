//! Image inputs and the built-in fallback picture.

use std::fmt;
use std::path::PathBuf;

use ::image::{ImageReader, RgbaImage};
use log::info;
use particlefx_core::Rgba;

use crate::error::{EngineError, Result};

/// Where the engine gets its picture from.
#[derive(Clone)]
pub enum ImageSource {
    /// An image file on disk, format guessed from its contents.
    Path(PathBuf),
    /// An encoded image held in memory (PNG, JPEG, ...).
    Encoded(Vec<u8>),
    /// Pixels that are already decoded.
    Decoded(RgbaImage),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            ImageSource::Decoded(image) => {
                write!(f, "Decoded({}x{})", image.width(), image.height())
            }
        }
    }
}

impl ImageSource {
    /// Decode the source into RGBA pixels.
    pub fn decode(self) -> Result<RgbaImage> {
        match self {
            ImageSource::Path(path) => {
                let origin = path.display().to_string();
                let image = ImageReader::open(&path)
                    .map_err(|e| EngineError::Decode {
                        origin: origin.clone(),
                        source: e.into(),
                    })?
                    .with_guessed_format()
                    .map_err(|e| EngineError::Decode {
                        origin: origin.clone(),
                        source: e.into(),
                    })?
                    .decode()
                    .map_err(|source| EngineError::Decode {
                        origin: origin.clone(),
                        source,
                    })?
                    .into_rgba8();
                info!(
                    "decoded {} ({}x{})",
                    origin,
                    image.width(),
                    image.height()
                );
                Ok(image)
            }
            ImageSource::Encoded(bytes) => {
                let image = ::image::load_from_memory(&bytes)
                    .map_err(|source| EngineError::Decode {
                        origin: format!("{} in-memory bytes", bytes.len()),
                        source,
                    })?
                    .into_rgba8();
                Ok(image)
            }
            ImageSource::Decoded(image) => Ok(image),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<RgbaImage> for ImageSource {
    fn from(image: RgbaImage) -> Self {
        ImageSource::Decoded(image)
    }
}

/// Gradient stops of the default picture, top-left to bottom-right.
const GRADIENT: [(f32, Rgba); 3] = [
    (0.0, Rgba::opaque(0x66, 0x66, 0xff)),
    (0.5, Rgba::opaque(0x33, 0x33, 0xcc)),
    (1.0, Rgba::opaque(0x00, 0x00, 0x99)),
];

/// Discs of the default picture on a 400×400 canvas: centre, radius, color.
const DISCS: [(f32, f32, f32, Rgba); 5] = [
    (100.0, 100.0, 40.0, Rgba::opaque(0xff, 0x66, 0x66)),
    (300.0, 100.0, 40.0, Rgba::opaque(0x66, 0xff, 0x66)),
    (200.0, 200.0, 60.0, Rgba::opaque(0xff, 0xff, 0x66)),
    (100.0, 300.0, 40.0, Rgba::opaque(0xff, 0x66, 0xff)),
    (300.0, 300.0, 40.0, Rgba::opaque(0x66, 0xff, 0xff)),
];

/// Opacity of the discs over the gradient.
const DISC_OPACITY: f32 = 0.8;

/// Render the built-in picture used when no image has been supplied.
pub fn builtin_gradient(width: u32, height: u32) -> RgbaImage {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    RgbaImage::from_fn(width, height, |x, y| {
        let u = (x as f32 + 0.5) / w;
        let v = (y as f32 + 0.5) / h;
        let mut color = gradient_at((u + v) / 2.0);

        // Disc layout is defined on a 400x400 canvas.
        let (px, py) = (u * 400.0, v * 400.0);
        for (cx, cy, r, disc) in DISCS {
            let dx = px - cx;
            let dy = py - cy;
            if dx * dx + dy * dy <= r * r {
                color = mix(color, disc, DISC_OPACITY);
            }
        }
        ::image::Rgba(color.to_array())
    })
}

fn gradient_at(t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    for pair in GRADIENT.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            return mix(c0, c1, (t - t0) / (t1 - t0));
        }
    }
    GRADIENT[GRADIENT.len() - 1].1
}

fn mix(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgba::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b), 255)
}
