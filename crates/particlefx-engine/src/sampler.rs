//! Turn a decoded image into a particle field.

use std::borrow::Cow;

use ::image::{RgbaImage, imageops::FilterType};
use log::debug;
use particlefx_core::Rgba;
use rand::Rng;

use crate::field::{Origin, ParticleField};
use glam::Vec2;

/// Maximum spawn offset from the origin, per axis.
pub const SPAWN_POSITION_JITTER: f32 = 50.0;

/// Maximum spawn velocity, per axis.
pub const SPAWN_VELOCITY_JITTER: f32 = 1.0;

/// Scale `image` to exactly `width × height`, borrowing it if it already fits.
pub fn fit_to_surface(image: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(::image::imageops::resize(
            image,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

/// Sample `image` on a `stride`-spaced grid after fitting it to the surface.
///
/// One particle is emitted for every sampled pixel with non-zero alpha.
/// Fully transparent pixels produce nothing.
pub fn sample<R: Rng + ?Sized>(
    image: &RgbaImage,
    width: u32,
    height: u32,
    stride: u32,
    rng: &mut R,
) -> ParticleField {
    let stride = stride.max(1) as usize;
    let buffer = fit_to_surface(image, width, height);

    let columns = (width as usize).div_ceil(stride);
    let rows = (height as usize).div_ceil(stride);
    let mut field = ParticleField::with_capacity(columns * rows);

    for y in (0..height).step_by(stride) {
        for x in (0..width).step_by(stride) {
            let color = Rgba::from(buffer.get_pixel(x, y).0);
            if !color.is_visible() {
                continue;
            }

            let home = Vec2::new(x as f32, y as f32);
            let position = home
                + Vec2::new(
                    rng.random_range(-SPAWN_POSITION_JITTER..=SPAWN_POSITION_JITTER),
                    rng.random_range(-SPAWN_POSITION_JITTER..=SPAWN_POSITION_JITTER),
                );
            let velocity = Vec2::new(
                rng.random_range(-SPAWN_VELOCITY_JITTER..=SPAWN_VELOCITY_JITTER),
                rng.random_range(-SPAWN_VELOCITY_JITTER..=SPAWN_VELOCITY_JITTER),
            );
            field.push(
                Origin {
                    position: home,
                    color,
                },
                position,
                velocity,
            );
        }
    }

    debug!(
        "sampled {} particles from {}x{} at stride {}",
        field.len(),
        width,
        height,
        stride
    );
    field
}
