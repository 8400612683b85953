//! Terminal rendering of the particle surface.

use particlefx_engine::{Rgba, Surface};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '▀';

/// Maps between terminal cells and surface pixels.
///
/// A cell is `scale` pixels wide and `2 * scale` pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGrid {
    pub scale: u32,
}

impl CellGrid {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    /// Surface size needed to fill `columns × rows` cells.
    pub fn surface_size(self, columns: u16, rows: u16) -> (u32, u32) {
        (
            (columns as u32 * self.scale).max(1),
            (rows as u32 * 2 * self.scale).max(1),
        )
    }

    /// Surface position at the centre of a cell.
    pub fn cell_center(self, column: u16, row: u16) -> (f32, f32) {
        let x = column as f32 * self.scale as f32 + self.scale as f32 / 2.0;
        let y = row as f32 * 2.0 * self.scale as f32 + self.scale as f32;
        (x, y)
    }
}

/// Draws a [`Surface`] into the terminal with two pixels per cell.
pub struct SurfaceView<'a> {
    surface: &'a Surface,
    grid: CellGrid,
}

impl<'a> SurfaceView<'a> {
    pub fn new(surface: &'a Surface, grid: CellGrid) -> Self {
        Self { surface, grid }
    }

    /// Most opaque pixel in the `scale × scale` block at `(x0, y0)`.
    fn block(&self, x0: u32, y0: u32) -> Rgba {
        let mut best = Rgba::default();
        for y in y0..y0 + self.grid.scale {
            for x in x0..x0 + self.grid.scale {
                if let Some(px) = self.surface.pixel(x, y) {
                    if px.a > best.a {
                        best = px;
                    }
                }
            }
        }
        best
    }
}

impl Widget for SurfaceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scale = self.grid.scale;
        for row in 0..area.height {
            for column in 0..area.width {
                let x0 = column as u32 * scale;
                let top = self.block(x0, row as u32 * 2 * scale);
                let bottom = self.block(x0, row as u32 * 2 * scale + scale);
                if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                    cell.set_char(HALF_BLOCK)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }
}

/// Composite over black for display.
fn to_color(px: Rgba) -> Color {
    if px.a == 0 {
        return Color::Black;
    }
    let premultiply = |c: u8| ((c as u16 * px.a as u16 + 127) / 255) as u8;
    Color::Rgb(premultiply(px.r), premultiply(px.g), premultiply(px.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grid_mapping() {
        let grid = CellGrid::new(2);
        assert_eq!(grid.surface_size(10, 5), (20, 20));
        assert_eq!(grid.cell_center(0, 0), (1.0, 2.0));
        assert_eq!(grid.cell_center(3, 1), (7.0, 6.0));
        assert_eq!(CellGrid::new(0).scale, 1);
    }

    #[test]
    fn test_half_blocks_carry_both_pixels() {
        let mut surface = Surface::new(2, 4);
        surface.blend(0, 0, Rgba::opaque(255, 0, 0));
        surface.blend(1, 3, Rgba::opaque(0, 0, 255));

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&surface, CellGrid::new(1)).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Black);
        assert_eq!(buf[(1, 1)].bg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_scaled_block_keeps_small_particles() {
        let mut surface = Surface::new(4, 8);
        surface.blend(3, 1, Rgba::opaque(0, 255, 0));
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&surface, CellGrid::new(4)).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(0, 255, 0));
    }

    #[test]
    fn test_translucent_pixels_darken() {
        assert_eq!(to_color(Rgba::new(255, 255, 255, 128)), Color::Rgb(128, 128, 128));
    }
}
