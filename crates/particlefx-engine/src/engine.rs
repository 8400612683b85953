//! The embeddable particle engine.

use std::path::{Path, PathBuf};

use ::image::RgbaImage;
use log::{debug, info, warn};
use particlefx_core::{ConfigPatch, DEFAULT_EXPORT_FILENAME, EngineConfig};
use rand::{SeedableRng, rngs::StdRng};

use crate::error::{EngineError, Result};
use crate::field::ParticleField;
use crate::force;
use crate::integrator;
use crate::interaction::PointerState;
use crate::render::{Renderer, Surface};
use crate::sampler;
use crate::source::{ImageSource, builtin_gradient};

/// Handle of the running frame loop. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopHandle(u64);

/// Owns the particle field and surface and drives the per-frame loop.
///
/// The host calls [`Engine::frame`] once per display frame. Pointer handlers
/// only record state; the next frame picks it up. After [`Engine::destroy`]
/// every method is a no-op.
#[derive(Debug)]
pub struct Engine {
    /// Current configuration, always valid.
    config: EngineConfig,
    /// Decoded source picture. `None` selects the built-in gradient.
    image: Option<RgbaImage>,
    field: ParticleField,
    /// Drawing surface; released on destroy.
    surface: Option<Surface>,
    renderer: Renderer,
    pointer: PointerState,
    /// Pending frame loop, `None` while stopped.
    animation: Option<LoopHandle>,
    /// Source of loop handle ids.
    next_loop_id: u64,
    /// Frames advanced since creation.
    frames: u64,
    destroyed: bool,
    rng: StdRng,
}

impl Engine {
    /// Create an engine from `config`, loading `config.image_src` if set.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_rng(config, None, StdRng::from_os_rng())
    }

    /// Create an engine that samples `source` instead of `config.image_src`.
    pub fn with_source(config: EngineConfig, source: ImageSource) -> Result<Self> {
        Self::with_rng(config, Some(source), StdRng::from_os_rng())
    }

    /// Create an engine with an explicit random generator.
    ///
    /// The animation loop is started immediately, as an embedded widget would.
    pub fn with_rng(
        config: EngineConfig,
        source: Option<ImageSource>,
        rng: StdRng,
    ) -> Result<Self> {
        let mut config = config.normalized()?;
        let source = match source {
            Some(ImageSource::Path(path)) => {
                config.image_src = Some(path.clone());
                Some(ImageSource::Path(path))
            }
            Some(other) => {
                config.image_src = None;
                Some(other)
            }
            None => config.image_src.clone().map(ImageSource::Path),
        };
        let image = source.map(ImageSource::decode).transpose()?;

        let mut engine = Self {
            surface: Some(Surface::new(config.width, config.height)),
            config,
            image,
            field: ParticleField::default(),
            renderer: Renderer::new(),
            pointer: PointerState::default(),
            animation: None,
            next_loop_id: 0,
            frames: 0,
            destroyed: false,
            rng,
        };
        engine.resample();
        engine.start_animation();
        Ok(engine)
    }

    /// Seeded constructor for reproducible runs.
    pub fn seeded(config: EngineConfig, source: Option<ImageSource>, seed: u64) -> Result<Self> {
        Self::with_rng(config, source, StdRng::seed_from_u64(seed))
    }

    /// Scatter every particle near its origin and stop all motion.
    pub fn reset_particles(&mut self) {
        if self.destroyed {
            return;
        }
        integrator::reset(&mut self.field, &mut self.rng);
        debug!("reset {} particles", self.field.len());
    }

    /// Kick every particle in a random direction.
    pub fn explode_particles(&mut self) {
        if self.destroyed {
            return;
        }
        integrator::explode(&mut self.field, &mut self.rng);
        debug!("exploded {} particles", self.field.len());
    }

    /// Merge `patch` into the configuration.
    ///
    /// A new stride, surface size or image path re-samples the field; every
    /// other field takes effect on the next frame. `image_src: Some(None)`
    /// switches back to the built-in picture. An invalid patch or an
    /// undecodable image leaves the engine exactly as it was.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<()> {
        if self.destroyed || patch.is_empty() {
            return Ok(());
        }

        let next = patch.apply(&self.config).inspect_err(|e| {
            warn!("rejected config update: {e}");
        })?;

        let new_image = match &patch.image_src {
            Some(Some(path)) if next.image_src != self.config.image_src => {
                Some(Some(ImageSource::Path(path.clone()).decode()?))
            }
            Some(None) if self.image.is_some() => Some(None),
            _ => None,
        };

        let resample = self.config.needs_resample(&next) || new_image.is_some();
        self.config = next;
        if let Some(image) = new_image {
            self.image = image;
        }
        if resample {
            self.resample();
        }
        Ok(())
    }

    /// Replace the source picture and re-sample.
    ///
    /// On decode failure the current image and field are kept.
    pub fn set_image(&mut self, source: ImageSource) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let path = match &source {
            ImageSource::Path(path) => Some(path.clone()),
            _ => None,
        };
        let image = source.decode()?;
        self.image = Some(image);
        self.config.image_src = path;
        self.resample();
        Ok(())
    }

    /// React to a new surface size. Same-size notifications are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.destroyed || (width, height) == (self.config.width, self.config.height) {
            return Ok(());
        }
        self.update_config(&ConfigPatch {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        })
    }

    /// Number of particles in the field. Zero after destroy.
    pub fn particle_count(&self) -> usize {
        self.field.len()
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> EngineConfig {
        self.config.clone()
    }

    /// Global speed scalar derived from the particle count.
    pub fn speed(&self) -> f32 {
        force::global_speed(self.field.len())
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// The drawing surface, `None` after destroy.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Cancel the frame loop. Subsequent [`Engine::frame`] calls do nothing.
    pub fn stop_animation(&mut self) {
        if let Some(LoopHandle(id)) = self.animation.take() {
            debug!("animation loop {id} stopped");
        }
    }

    /// Start the frame loop if it is not already running.
    pub fn start_animation(&mut self) {
        if self.destroyed || self.animation.is_some() {
            return;
        }
        let handle = LoopHandle(self.next_loop_id);
        self.next_loop_id += 1;
        debug!("animation loop {} started", handle.0);
        self.animation = Some(handle);
    }

    /// Run one frame of the loop: integrate, then draw.
    ///
    /// Returns `false` when the loop is stopped or the engine is destroyed.
    pub fn frame(&mut self) -> bool {
        if self.destroyed || self.animation.is_none() {
            return false;
        }
        self.advance();
        true
    }

    /// Integrate and draw one tick regardless of the loop state.
    pub fn advance(&mut self) {
        if self.destroyed {
            return;
        }
        integrator::step(
            &mut self.field,
            &self.config,
            &self.pointer,
            self.config.width,
            self.config.height,
            &mut self.rng,
        );
        self.draw();
        self.frames += 1;
    }

    /// The pointer moved to `(x, y)` over the surface.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.destroyed {
            return;
        }
        self.pointer.on_move(x, y);
    }

    /// The pointer left the surface.
    pub fn pointer_leave(&mut self) {
        if self.destroyed {
            return;
        }
        self.pointer.on_leave();
    }

    /// A click at `(x, y)`: a ripple, or a vortex anchor in vortex mode.
    pub fn click(&mut self, x: f32, y: f32) {
        if self.destroyed {
            return;
        }
        if let Some(impulse) = self.pointer.on_click(x, y, self.config.vortex_mode) {
            impulse.apply(&mut self.field, self.config.click_strength);
        }
    }

    /// Encode the current surface as PNG. `None` after destroy.
    pub fn export_png(&self) -> Result<Option<Vec<u8>>> {
        let Some(surface) = &self.surface else {
            return Ok(None);
        };
        surface.encode_png().map(Some).map_err(EngineError::Export)
    }

    /// Write the current surface as a PNG file.
    ///
    /// Without a filename [`DEFAULT_EXPORT_FILENAME`] is used. Returns the
    /// written path, or `None` after destroy.
    pub fn download_image(&self, filename: Option<&Path>) -> Result<Option<PathBuf>> {
        let Some(bytes) = self.export_png()? else {
            return Ok(None);
        };
        let path = filename
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILENAME));
        std::fs::write(&path, bytes).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        info!("saved surface to {}", path.display());
        Ok(Some(path))
    }

    /// Stop the loop and release the surface and field. Irreversible.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_animation();
        self.surface = None;
        self.field = ParticleField::default();
        self.image = None;
        self.renderer.invalidate();
        self.pointer = PointerState::default();
        self.destroyed = true;
        debug!("engine destroyed after {} frames", self.frames);
    }

    /// Rebuild the field from the current image, stride and surface size.
    fn resample(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        let needs_surface = self
            .surface
            .as_ref()
            .is_none_or(|s| (s.width(), s.height()) != (width, height));
        if needs_surface {
            self.surface = Some(Surface::new(width, height));
        }

        let fallback;
        let image = match &self.image {
            Some(image) => image,
            None => {
                fallback = builtin_gradient(width, height);
                &fallback
            }
        };
        self.field = sampler::sample(image, width, height, self.config.particle_gap, &mut self.rng);
        self.renderer.invalidate();
        debug!(
            "resampled {}x{} at gap {}: {} particles",
            width,
            height,
            self.config.particle_gap,
            self.field.len()
        );
        self.draw();
    }

    fn draw(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            self.renderer.render(surface, &self.field, &self.config);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}
