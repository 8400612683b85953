use std::fs::{self, File};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use log::{info, warn};
use particlefx_config::{Config, PlayerConfig};
use particlefx_engine::{ConfigPatch, Engine};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Color, Stylize},
    text::Line,
};

mod cli;
mod view;

use cli::Args;
use view::{CellGrid, SurfaceView};

/// Rows below the surface: status and help.
const CHROME_ROWS: u16 = 2;

/// Hue rotation step for `[` and `]`.
const HUE_STEP: f32 = 15.0;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => particlefx_config::default_config_path()?,
    };
    let mut config = Config::load(&config_path)?;
    args.apply(&mut config);
    config.validate()?;

    // Decode the image before taking over the terminal so errors print normally.
    let (columns, rows) = crossterm::terminal::size()?;
    let app = App::new(config, config_path, columns, rows)?;

    let terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture, EnableFocusChange)?;
    let result = app.run(terminal);
    let released = execute!(stdout(), DisableMouseCapture, DisableFocusChange);
    ratatui::restore();
    result?;
    released?;
    Ok(())
}

/// Send log records to a file; the terminal belongs to the UI.
fn init_logging(path: Option<&Path>) -> color_eyre::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => particlefx_config::default_log_path()?,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    engine: Engine,
    grid: CellGrid,
    player: PlayerConfig,
    /// Time budget of one frame.
    frame_time: Duration,
    /// Where `w` writes the configuration.
    config_path: PathBuf,
    /// Rows currently covered by the surface.
    surface_rows: u16,
    /// Last action result shown in the status line.
    message: Option<String>,
}

impl App {
    /// Construct a new instance of [`App`] for a terminal of `columns × rows`.
    pub fn new(
        config: Config,
        config_path: PathBuf,
        columns: u16,
        rows: u16,
    ) -> color_eyre::Result<Self> {
        let grid = CellGrid::new(config.player.scale);
        let surface_rows = rows.saturating_sub(CHROME_ROWS).max(1);
        let (width, height) = grid.surface_size(columns, surface_rows);
        let mut engine_config = config.engine;
        engine_config.width = width;
        engine_config.height = height;

        let engine = Engine::new(engine_config)?;
        info!(
            "started with {} particles on a {width}x{height} surface",
            engine.particle_count()
        );
        Ok(Self {
            running: false,
            engine,
            grid,
            frame_time: Duration::from_secs(1) / config.player.fps.max(1),
            player: config.player,
            config_path,
            surface_rows,
            message: None,
        })
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        while self.running {
            let started = Instant::now();
            self.engine.frame();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(self.frame_time.saturating_sub(started.elapsed()))?;
        }
        self.engine.destroy();
        Ok(())
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // Particle surface
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help text
        ])
        .split(frame.area());

        if let Some(surface) = self.engine.surface() {
            frame.render_widget(SurfaceView::new(surface, self.grid), chunks[0]);
        }
        frame.render_widget(self.status_line(), chunks[1]);
        frame.render_widget(help_line(), chunks[2]);
    }

    fn status_line(&self) -> Line<'static> {
        let config = self.engine.config();
        let mut spans = vec![
            format!("{} particles", self.engine.particle_count()).bold(),
            format!(" ({} visible)", self.engine.field().visible_count()).dark_gray(),
            format!("  speed {:.2}", self.engine.speed()).dark_gray(),
            format!("  gap {}", config.particle_gap).dark_gray(),
            format!("  {} / {}", config.filter, config.particle_shape).dark_gray(),
            format!("  hue {:.0}°", config.hue_rotation).dark_gray(),
        ];
        if config.vortex_mode {
            spans.push("  vortex".fg(Color::Cyan));
        }
        if !self.engine.is_animating() {
            spans.push("  paused".fg(Color::Yellow));
        }
        if let Some(message) = &self.message {
            spans.push(format!("  {message}").italic());
        }
        Line::from(spans).centered()
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits at most `timeout` so the next frame is not late.
    fn handle_crossterm_events(&mut self, timeout: Duration) -> color_eyre::Result<()> {
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(mouse) => self.on_mouse_event(mouse),
                Event::FocusLost => self.engine.pointer_leave(),
                Event::Resize(columns, rows) => self.on_resize(columns, rows),
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        let config = self.engine.config();
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('r')) => self.engine.reset_particles(),
            (_, KeyCode::Char('e')) => self.engine.explode_particles(),
            (_, KeyCode::Char('p')) => self.toggle_pause(),
            (_, KeyCode::Char('v')) => self.update(ConfigPatch {
                vortex_mode: Some(!config.vortex_mode),
                ..Default::default()
            }),
            (_, KeyCode::Char('f')) => self.update(ConfigPatch {
                filter: Some(config.filter.next()),
                ..Default::default()
            }),
            (_, KeyCode::Char('s')) => self.update(ConfigPatch {
                particle_shape: Some(config.particle_shape.next()),
                ..Default::default()
            }),
            (_, KeyCode::Char('[')) => self.update(ConfigPatch {
                hue_rotation: Some(config.hue_rotation - HUE_STEP),
                ..Default::default()
            }),
            (_, KeyCode::Char(']')) => self.update(ConfigPatch {
                hue_rotation: Some(config.hue_rotation + HUE_STEP),
                ..Default::default()
            }),
            (_, KeyCode::Char('-')) => self.update(ConfigPatch {
                particle_gap: Some(i64::from(config.particle_gap) - 1),
                ..Default::default()
            }),
            (_, KeyCode::Char('+' | '=')) => self.update(ConfigPatch {
                particle_gap: Some(i64::from(config.particle_gap) + 1),
                ..Default::default()
            }),
            (_, KeyCode::Char('d')) => self.download(),
            (_, KeyCode::Char('w')) => self.write_config(),
            _ => {}
        }
    }

    /// Forward pointer activity over the surface; anything below it counts as leaving.
    fn on_mouse_event(&mut self, mouse: MouseEvent) {
        if mouse.row >= self.surface_rows {
            self.engine.pointer_leave();
            return;
        }
        let (x, y) = self.grid.cell_center(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                self.engine.pointer_move(x, y)
            }
            MouseEventKind::Down(MouseButton::Left) => self.engine.click(x, y),
            _ => {}
        }
    }

    fn on_resize(&mut self, columns: u16, rows: u16) {
        self.surface_rows = rows.saturating_sub(CHROME_ROWS).max(1);
        let (width, height) = self.grid.surface_size(columns, self.surface_rows);
        if let Err(e) = self.engine.resize(width, height) {
            warn!("resize to {width}x{height} failed: {e}");
            self.message = Some(e.to_string());
        }
    }

    /// Apply a config change, reporting rejections in the status line.
    fn update(&mut self, patch: ConfigPatch) {
        self.message = match self.engine.update_config(&patch) {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        };
    }

    fn toggle_pause(&mut self) {
        if self.engine.is_animating() {
            self.engine.stop_animation();
        } else {
            self.engine.start_animation();
        }
    }

    /// Save the current frame as a PNG in the working directory.
    fn download(&mut self) {
        self.message = Some(match self.engine.download_image(None) {
            Ok(Some(path)) => format!("saved {}", path.display()),
            Ok(None) => "nothing to save".to_string(),
            Err(e) => {
                warn!("export failed: {e}");
                format!("export failed: {e}")
            }
        });
    }

    /// Persist the current settings to the config file.
    fn write_config(&mut self) {
        let config = Config {
            engine: self.engine.config(),
            player: self.player.clone(),
        };
        self.message = Some(match config.save(&self.config_path) {
            Ok(()) => format!("wrote {}", self.config_path.display()),
            Err(e) => {
                warn!("writing config failed: {e}");
                format!("writing config failed: {e}")
            }
        });
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

fn help_line() -> Line<'static> {
    let key = |k: &'static str| k.bold().fg(Color::Cyan);
    Line::from(vec![
        key("q"),
        " quit  ".dark_gray(),
        key("r"),
        " reset  ".dark_gray(),
        key("e"),
        " explode  ".dark_gray(),
        key("v"),
        " vortex  ".dark_gray(),
        key("f"),
        " filter  ".dark_gray(),
        key("s"),
        " shape  ".dark_gray(),
        key("[ ]"),
        " hue  ".dark_gray(),
        key("- +"),
        " gap  ".dark_gray(),
        key("p"),
        " pause  ".dark_gray(),
        key("d"),
        " save png  ".dark_gray(),
        key("w"),
        " write config".dark_gray(),
    ])
    .centered()
}
