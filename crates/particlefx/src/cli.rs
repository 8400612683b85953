//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;
use particlefx_config::Config;

#[derive(Debug, Parser)]
#[command(name = "particlefx")]
#[command(about = "Turn an image into interactive particles in the terminal", long_about = None)]
#[command(version)]
pub struct Args {
    /// Image to sample (PNG, JPEG, GIF, BMP or WebP)
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Pixel stride between particles
    #[arg(short, long)]
    pub gap: Option<u32>,

    /// Configuration file to use instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Surface pixels per terminal column
    #[arg(long)]
    pub scale: Option<u32>,

    /// Start with clicks setting a vortex anchor
    #[arg(long)]
    pub vortex: bool,

    /// Write logs here instead of the data directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Override file settings with the ones given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(image) = &self.image {
            config.engine.image_src = Some(image.clone());
        }
        if let Some(gap) = self.gap {
            config.engine.particle_gap = gap;
        }
        if let Some(fps) = self.fps {
            config.player.fps = fps;
        }
        if let Some(scale) = self.scale {
            config.player.scale = scale;
        }
        if self.vortex {
            config.engine.vortex_mode = true;
        }
    }
}
