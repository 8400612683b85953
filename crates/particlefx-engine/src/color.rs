//! Color pipeline applied to particle colors before drawing.
//!
//! The filter always runs first; hue rotation is applied to the filtered
//! color. Alpha passes through untouched.

use particlefx_core::{Filter, Rgba, wrap_degrees};

/// Luma weights used by the grayscale filter.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Classic sepia tone matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Apply `filter` and then rotate the hue by `hue_rotation` degrees.
pub fn transform(color: Rgba, filter: Filter, hue_rotation: f32) -> Rgba {
    let filtered = apply_filter(color, filter);
    let rotation = wrap_degrees(hue_rotation);
    if rotation == 0.0 {
        return filtered;
    }
    rotate_hue(filtered, rotation)
}

/// Apply a single color filter.
pub fn apply_filter(color: Rgba, filter: Filter) -> Rgba {
    let Rgba { r, g, b, a } = color;
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    match filter {
        Filter::None => color,
        Filter::Grayscale => {
            let v = to_channel(LUMA[0] * rf + LUMA[1] * gf + LUMA[2] * bf);
            Rgba::new(v, v, v, a)
        }
        Filter::Sepia => {
            let row = |m: [f32; 3]| to_channel(m[0] * rf + m[1] * gf + m[2] * bf);
            Rgba::new(row(SEPIA[0]), row(SEPIA[1]), row(SEPIA[2]), a)
        }
        Filter::Invert => Rgba::new(255 - r, 255 - g, 255 - b, a),
    }
}

/// Rotate the hue of `color` by `degrees`, keeping saturation and lightness.
pub fn rotate_hue(color: Rgba, degrees: f32) -> Rgba {
    let (h, s, l) = rgb_to_hsl(color);
    let (r, g, b) = hsl_to_rgb(wrap_hue(h + wrap_degrees(degrees)), s, l);
    Rgba::new(r, g, b, color.a)
}

/// Convert RGB to HSL. Hue is in degrees `[0, 360)`, saturation and
/// lightness in `[0, 1]`.
pub fn rgb_to_hsl(color: Rgba) -> (f32, f32, f32) {
    let r = color.r as f32 / 255.0;
    let g = color.g as f32 / 255.0;
    let b = color.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (wrap_hue(h * 60.0), s, l)
}

/// Exact wrap of a color hue into `[0, 360)`, without snapping.
fn wrap_hue(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Convert HSL to RGB channels.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = to_channel(l * 255.0);
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    let h = h / 360.0;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (to_channel(r * 255.0), to_channel(g * 255.0), to_channel(b * 255.0))
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
