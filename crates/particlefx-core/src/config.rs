//! Engine configuration and partial updates.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name used when an export is requested without one.
pub const DEFAULT_EXPORT_FILENAME: &str = "particle-effect.png";

/// Color filter applied to every particle before hue rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
}

impl Filter {
    /// Cycle to the next filter.
    pub fn next(self) -> Self {
        match self {
            Filter::None => Filter::Grayscale,
            Filter::Grayscale => Filter::Sepia,
            Filter::Sepia => Filter::Invert,
            Filter::Invert => Filter::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::None => "none",
            Filter::Grayscale => "grayscale",
            Filter::Sepia => "sepia",
            Filter::Invert => "invert",
        }
    }
}

/// Shape drawn for every particle.
///
/// Deserialization is lenient: any unrecognised name becomes [`ParticleShape::Square`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParticleShape {
    #[default]
    Square,
    Circle,
    Triangle,
}

impl ParticleShape {
    /// Cycle to the next shape.
    pub fn next(self) -> Self {
        match self {
            ParticleShape::Square => ParticleShape::Circle,
            ParticleShape::Circle => ParticleShape::Triangle,
            ParticleShape::Triangle => ParticleShape::Square,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParticleShape::Square => "square",
            ParticleShape::Circle => "circle",
            ParticleShape::Triangle => "triangle",
        }
    }

    /// Parse a shape name, falling back to square for anything unknown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "circle" => ParticleShape::Circle,
            "triangle" => ParticleShape::Triangle,
            _ => ParticleShape::Square,
        }
    }
}

impl From<String> for ParticleShape {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ParticleShape> for String {
    fn from(shape: ParticleShape) -> Self {
        shape.name().to_string()
    }
}

impl fmt::Display for ParticleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration value was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value for `{field}`: {reason}")]
pub struct InvalidConfig {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human readable explanation.
    pub reason: String,
}

impl InvalidConfig {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Steps per degree that hue rotations are snapped to.
pub const HUE_STEPS_PER_DEGREE: f32 = 1000.0;

/// Wrap an angle in degrees into `[0, 360)`, snapped to
/// `1 / HUE_STEPS_PER_DEGREE` of a degree.
///
/// `h` and `h + 360.0` differ by f32 rounding after `rem_euclid`; snapping
/// maps both onto the same value.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    let snapped = (wrapped * HUE_STEPS_PER_DEGREE).round() / HUE_STEPS_PER_DEGREE;
    if snapped >= 360.0 { 0.0 } else { snapped }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pixel stride between sampled origins. Always at least 1.
    pub particle_gap: u32,
    /// Strength of the pointer repulsion (or vortex swirl).
    pub mouse_force: f32,
    /// Restoring coefficient; also drives velocity damping.
    pub gravity: f32,
    /// Amplitude of the random jitter added to the restoring target.
    pub noise: f32,
    /// Strength of the one-shot click ripple.
    pub click_strength: f32,
    /// Hue rotation in degrees, kept in `[0, 360)`.
    pub hue_rotation: f32,
    pub filter: Filter,
    pub particle_shape: ParticleShape,
    /// Clicks set a rotational anchor instead of a ripple.
    pub vortex_mode: bool,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Image to sample. `None` selects the built-in gradient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_src: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_gap: 4,
            mouse_force: 30.0,
            gravity: 0.08,
            noise: 10.0,
            click_strength: 100.0,
            hue_rotation: 0.0,
            filter: Filter::None,
            particle_shape: ParticleShape::Square,
            vortex_mode: false,
            width: 400,
            height: 400,
            image_src: None,
        }
    }
}

impl EngineConfig {
    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.particle_gap == 0 {
            return Err(InvalidConfig::new("particle_gap", "must be at least 1"));
        }
        if self.width == 0 {
            return Err(InvalidConfig::new("width", "must be at least 1"));
        }
        if self.height == 0 {
            return Err(InvalidConfig::new("height", "must be at least 1"));
        }
        let floats = [
            ("mouse_force", self.mouse_force),
            ("gravity", self.gravity),
            ("noise", self.noise),
            ("click_strength", self.click_strength),
            ("hue_rotation", self.hue_rotation),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(InvalidConfig::new(field, format!("{value} is not finite")));
            }
        }
        Ok(())
    }

    /// Validate and bring derived fields into canonical range.
    pub fn normalized(mut self) -> Result<Self, InvalidConfig> {
        self.validate()?;
        self.hue_rotation = wrap_degrees(self.hue_rotation);
        Ok(self)
    }

    /// Whether moving from `self` to `next` invalidates the sampled field.
    pub fn needs_resample(&self, next: &EngineConfig) -> bool {
        self.particle_gap != next.particle_gap
            || self.width != next.width
            || self.height != next.height
            || self.image_src != next.image_src
    }
}

/// A partial configuration update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub particle_gap: Option<i64>,
    pub mouse_force: Option<f32>,
    pub gravity: Option<f32>,
    pub noise: Option<f32>,
    pub click_strength: Option<f32>,
    pub hue_rotation: Option<f32>,
    pub filter: Option<Filter>,
    pub particle_shape: Option<ParticleShape>,
    pub vortex_mode: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `Some(Some(path))` loads an image, `Some(None)` selects the built-in picture.
    pub image_src: Option<Option<PathBuf>>,
}

impl ConfigPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch over `base`.
    ///
    /// The patch is applied atomically: if any field is invalid the error is
    /// returned and `base` remains the configuration in force.
    pub fn apply(&self, base: &EngineConfig) -> Result<EngineConfig, InvalidConfig> {
        let mut next = base.clone();
        if let Some(gap) = self.particle_gap {
            if gap < 1 {
                return Err(InvalidConfig::new(
                    "particle_gap",
                    format!("{gap} is below the minimum stride of 1"),
                ));
            }
            next.particle_gap = u32::try_from(gap)
                .map_err(|_| InvalidConfig::new("particle_gap", format!("{gap} is too large")))?;
        }
        if let Some(v) = self.mouse_force {
            next.mouse_force = v;
        }
        if let Some(v) = self.gravity {
            next.gravity = v;
        }
        if let Some(v) = self.noise {
            next.noise = v;
        }
        if let Some(v) = self.click_strength {
            next.click_strength = v;
        }
        if let Some(v) = self.hue_rotation {
            next.hue_rotation = v;
        }
        if let Some(v) = self.filter {
            next.filter = v;
        }
        if let Some(v) = self.particle_shape {
            next.particle_shape = v;
        }
        if let Some(v) = self.vortex_mode {
            next.vortex_mode = v;
        }
        if let Some(v) = self.width {
            next.width = v;
        }
        if let Some(v) = self.height {
            next.height = v;
        }
        if let Some(v) = &self.image_src {
            next.image_src = v.clone();
        }
        next.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_gap, 4);
        assert_eq!(config.mouse_force, 30.0);
        assert_eq!(config.gravity, 0.08);
        assert_eq!((config.width, config.height), (400, 400));
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
        assert!(wrap_degrees(-1e-9) < 360.0);
        assert_eq!(wrap_degrees(359.9999), 0.0);
    }

    #[test]
    fn test_wrap_degrees_is_exactly_periodic() {
        for k in 0..720 {
            let h = 0.1 + 0.5 * k as f32;
            assert_eq!(wrap_degrees(h), wrap_degrees(h + 360.0), "{h}");
            assert_eq!(wrap_degrees(h), wrap_degrees(h - 360.0), "{h}");
        }
        assert_eq!(wrap_degrees(231.6 + 360.0), wrap_degrees(231.6));
    }

    #[test]
    fn test_patch_merges_fields() {
        let base = EngineConfig::default();
        let patch = ConfigPatch {
            mouse_force: Some(50.0),
            filter: Some(Filter::Sepia),
            hue_rotation: Some(-30.0),
            ..Default::default()
        };
        let next = patch.apply(&base).unwrap();
        assert_eq!(next.mouse_force, 50.0);
        assert_eq!(next.filter, Filter::Sepia);
        assert_eq!(next.hue_rotation, 330.0);
        assert_eq!(next.particle_gap, base.particle_gap);
        assert!(!base.needs_resample(&next));
    }

    #[test]
    fn test_patch_rejects_bad_stride() {
        let base = EngineConfig::default();
        for gap in [0, -3] {
            let patch = ConfigPatch {
                particle_gap: Some(gap),
                mouse_force: Some(99.0),
                ..Default::default()
            };
            let err = patch.apply(&base).unwrap_err();
            assert_eq!(err.field, "particle_gap");
        }
    }

    #[test]
    fn test_patch_rejects_non_finite() {
        let patch = ConfigPatch {
            gravity: Some(f32::NAN),
            ..Default::default()
        };
        assert_eq!(
            patch.apply(&EngineConfig::default()).unwrap_err().field,
            "gravity"
        );
    }

    #[test]
    fn test_needs_resample() {
        let base = EngineConfig::default();
        let gap = ConfigPatch {
            particle_gap: Some(2),
            ..Default::default()
        }
        .apply(&base)
        .unwrap();
        assert!(base.needs_resample(&gap));

        let size = ConfigPatch {
            width: Some(200),
            ..Default::default()
        }
        .apply(&base)
        .unwrap();
        assert!(base.needs_resample(&size));
    }

    #[test]
    fn test_patch_sets_and_clears_image() {
        let base = EngineConfig::default();
        let set = ConfigPatch {
            image_src: Some(Some(PathBuf::from("logo.png"))),
            ..Default::default()
        }
        .apply(&base)
        .unwrap();
        assert_eq!(set.image_src, Some(PathBuf::from("logo.png")));
        assert!(base.needs_resample(&set));

        let cleared = ConfigPatch {
            image_src: Some(None),
            ..Default::default()
        }
        .apply(&set)
        .unwrap();
        assert_eq!(cleared.image_src, None);
        let untouched = ConfigPatch::default().apply(&set).unwrap();
        assert_eq!(untouched.image_src, Some(PathBuf::from("logo.png")));
    }

    #[test]
    fn test_shape_fallback() {
        assert_eq!(ParticleShape::from_name("Circle"), ParticleShape::Circle);
        assert_eq!(ParticleShape::from_name("hexagon"), ParticleShape::Square);
    }

    #[test]
    fn test_toml_round_trip_names() {
        let text = r#"
            particle_gap = 2
            filter = "grayscale"
            particle_shape = "star"
            vortex_mode = true
        "#;
        let config: EngineConfig = toml::from_str(text).unwrap();
        assert_eq!(config.particle_gap, 2);
        assert_eq!(config.filter, Filter::Grayscale);
        assert_eq!(config.particle_shape, ParticleShape::Square);
        assert!(config.vortex_mode);
        assert_eq!(config.mouse_force, 30.0);

        let out = toml::to_string(&config).unwrap();
        assert!(out.contains("filter = \"grayscale\""));
        assert!(out.contains("particle_shape = \"square\""));
        assert!(!out.contains("image_src"));
    }

    #[test]
    fn test_cycles() {
        assert_eq!(Filter::Invert.next(), Filter::None);
        assert_eq!(ParticleShape::Triangle.next(), ParticleShape::Square);
    }
}
