//! Raster surface and particle drawing.

use std::io::Cursor;

use ::image::{ImageError, ImageFormat, RgbaImage};
use particlefx_core::{EngineConfig, Filter, ParticleShape, Rgba};

use crate::color;
use crate::field::{ParticleField, ParticleId};
use glam::Vec2;

/// RGBA drawing surface the particles are rendered onto.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Color of a pixel, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.image.get_pixel_checked(x, y).map(|p| Rgba::from(p.0))
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            px.0 = [0, 0, 0, 0];
        }
    }

    /// Composite `color` over one pixel. Coordinates outside the surface are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 {
            return;
        }
        let Some(dst) = self.image.get_pixel_mut_checked(x as u32, y as u32) else {
            return;
        };
        dst.0 = source_over(color, Rgba::from(dst.0)).to_array();
    }

    /// Fill a `size × size` block with its top-left corner at `(x, y)`.
    pub fn fill_rect(&mut self, x: i32, y: i32, size: i32, color: Rgba) {
        for j in y..y + size {
            for i in x..x + size {
                self.blend(i, j, color);
            }
        }
    }

    /// Fill every pixel within `radius` of `(cx, cy)`.
    pub fn fill_disc(&mut self, cx: i32, cy: i32, radius: f32, color: Rgba) {
        let reach = radius.max(0.0).floor() as i32;
        let r2 = radius * radius;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 <= r2 {
                    self.blend(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Fill an upward isosceles triangle with apex `half` above `(cx, cy)` and
    /// a base `2 * half` wide, `half` below it.
    pub fn fill_triangle(&mut self, cx: i32, cy: i32, half: f32, color: Rgba) {
        let reach = half.floor() as i32;
        if reach == 0 {
            self.blend(cx, cy, color);
            return;
        }
        for dy in -reach..=reach {
            // Half-width grows linearly from 0 at the apex to `half` at the base.
            let span = ((dy as f32 + half) / 2.0).floor() as i32;
            for dx in -span..=span {
                self.blend(cx + dx, cy + dy, color);
            }
        }
    }

    /// Encode the surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Straight-alpha source-over compositing.
fn source_over(src: Rgba, dst: Rgba) -> Rgba {
    if src.a == 255 || dst.a == 0 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }
    let sa = src.a as f32 / 255.0;
    let da = dst.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba::new(
        mix(src.r, dst.r),
        mix(src.g, dst.g),
        mix(src.b, dst.b),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

/// Draws a particle field onto a [`Surface`].
///
/// Transformed colors are cached per origin and rebuilt when the filter or
/// hue rotation changes, or after [`Renderer::invalidate`].
#[derive(Debug, Default)]
pub struct Renderer {
    palette: Vec<Rgba>,
    palette_key: Option<(Filter, u32)>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget cached colors. Call after the field is replaced.
    pub fn invalidate(&mut self) {
        self.palette.clear();
        self.palette_key = None;
    }

    /// Clear `surface` and draw every visible particle.
    pub fn render(&mut self, surface: &mut Surface, field: &ParticleField, config: &EngineConfig) {
        self.refresh_palette(field, config);
        surface.clear();

        let size = particle_size(config.particle_gap);
        for id in field.ids() {
            if field.is_hidden(id) || field.is_dead(id) {
                continue;
            }
            draw_shape(
                surface,
                field.position(id),
                self.palette[id.0],
                config.particle_shape,
                size,
            );
        }
    }

    fn refresh_palette(&mut self, field: &ParticleField, config: &EngineConfig) {
        let key = (config.filter, config.hue_rotation.to_bits());
        if self.palette_key == Some(key) && self.palette.len() == field.len() {
            return;
        }
        self.palette.clear();
        self.palette.extend(
            field
                .origins()
                .iter()
                .map(|o| color::transform(o.color, config.filter, config.hue_rotation)),
        );
        self.palette_key = Some(key);
    }
}

/// Draw a single particle, skipping it when hidden.
pub fn draw(surface: &mut Surface, field: &ParticleField, id: ParticleId, config: &EngineConfig) {
    if field.is_hidden(id) || field.is_dead(id) {
        return;
    }
    let color = color::transform(field.origin(id).color, config.filter, config.hue_rotation);
    draw_shape(
        surface,
        field.position(id),
        color,
        config.particle_shape,
        particle_size(config.particle_gap),
    );
}

/// Nominal shape size for a sampling stride.
pub fn particle_size(particle_gap: u32) -> f32 {
    particle_gap as f32 / 2.0
}

/// Draw `shape` centered on the truncated `position`.
pub fn draw_shape(
    surface: &mut Surface,
    position: Vec2,
    color: Rgba,
    shape: ParticleShape,
    size: f32,
) {
    let cx = position.x.trunc() as i32;
    let cy = position.y.trunc() as i32;
    match shape {
        ParticleShape::Circle => surface.fill_disc(cx, cy, size, color),
        ParticleShape::Triangle => surface.fill_triangle(cx, cy, size, color),
        ParticleShape::Square => {
            let side = size.round().max(1.0) as i32;
            surface.fill_rect(cx - side / 2, cy - side / 2, side, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Origin;

    const RED: Rgba = Rgba::opaque(255, 0, 0);

    fn painted(surface: &Surface) -> usize {
        surface
            .image()
            .pixels()
            .filter(|p| p.0[3] > 0)
            .count()
    }

    fn single(position: Vec2, color: Rgba) -> ParticleField {
        let mut field = ParticleField::default();
        field.push(Origin { position, color }, position, Vec2::ZERO);
        field
    }

    #[test]
    fn test_square_side_matches_size() {
        let mut surface = Surface::new(16, 16);
        draw_shape(&mut surface, Vec2::new(8.7, 8.2), RED, ParticleShape::Square, 2.0);
        assert_eq!(painted(&surface), 4);
        assert_eq!(surface.pixel(7, 7), Some(RED));
        assert_eq!(surface.pixel(8, 8), Some(RED));
    }

    #[test]
    fn test_tiny_square_still_draws_a_pixel() {
        let mut surface = Surface::new(4, 4);
        draw_shape(&mut surface, Vec2::new(1.0, 1.0), RED, ParticleShape::Square, 0.5);
        assert_eq!(painted(&surface), 1);
    }

    #[test]
    fn test_circle_radius() {
        let mut surface = Surface::new(16, 16);
        draw_shape(&mut surface, Vec2::new(8.0, 8.0), RED, ParticleShape::Circle, 2.0);
        // Lattice points with dx^2 + dy^2 <= 4.
        assert_eq!(painted(&surface), 13);
        assert_eq!(surface.pixel(10, 8), Some(RED));
        assert_eq!(surface.pixel(10, 10), Some(Rgba::default()));
    }

    #[test]
    fn test_triangle_points_up() {
        let mut surface = Surface::new(16, 16);
        draw_shape(&mut surface, Vec2::new(8.0, 8.0), RED, ParticleShape::Triangle, 4.0);
        // Apex row is one pixel, base row spans the full width.
        assert_eq!(surface.pixel(8, 4), Some(RED));
        assert_eq!(surface.pixel(7, 4), Some(Rgba::default()));
        assert_eq!(surface.pixel(4, 12), Some(RED));
        assert_eq!(surface.pixel(12, 12), Some(RED));
    }

    #[test]
    fn test_hidden_particles_are_skipped() {
        let mut field = single(Vec2::new(2.0, 2.0), RED);
        let id = ParticleId(0);
        field.set_hidden(id, true);
        let mut surface = Surface::new(8, 8);
        draw(&mut surface, &field, id, &EngineConfig::default());
        assert_eq!(painted(&surface), 0);
    }

    #[test]
    fn test_render_applies_color_transform() {
        let field = single(Vec2::new(3.0, 3.0), RED);
        let config = EngineConfig {
            filter: Filter::Invert,
            ..EngineConfig::default()
        };
        let mut surface = Surface::new(8, 8);
        let mut renderer = Renderer::new();
        renderer.render(&mut surface, &field, &config);
        assert_eq!(surface.pixel(3, 3), Some(Rgba::opaque(0, 255, 255)));

        // Changing the hue invalidates the cached palette.
        let rotated = EngineConfig {
            hue_rotation: 180.0,
            ..config
        };
        renderer.render(&mut surface, &field, &rotated);
        assert_eq!(surface.pixel(3, 3), Some(RED));
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let mut field = single(Vec2::new(1.0, 1.0), RED);
        let mut surface = Surface::new(8, 8);
        let mut renderer = Renderer::new();
        let config = EngineConfig::default();
        renderer.render(&mut surface, &field, &config);
        field.set_position(ParticleId(0), Vec2::new(5.0, 5.0));
        renderer.render(&mut surface, &field, &config);
        assert_eq!(surface.pixel(1, 1), Some(Rgba::default()));
        assert_eq!(surface.pixel(5, 5), Some(RED));
    }

    #[test]
    fn test_translucent_blend() {
        let mut surface = Surface::new(1, 1);
        surface.blend(0, 0, Rgba::opaque(0, 0, 255));
        surface.blend(0, 0, Rgba::new(255, 0, 0, 128));
        let px = surface.pixel(0, 0).unwrap();
        assert_eq!(px.a, 255);
        assert!(px.r > 120 && px.r < 135);
        assert!(px.b > 120 && px.b < 135);
    }

    #[test]
    fn test_png_signature() {
        let bytes = Surface::new(2, 2).encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
