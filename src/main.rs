use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};

use anyhow::Context;
use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spinwheel::{
    app::App,
    app_dirs::AppDirs,
    audio::{AudioCoordinator, TerminalBell},
    config::{Config, ConfigStore, FileConfigStore},
    engine::SpinEngine,
    progress::{record_visit, FileProgressStore},
    runtime::{CrosstermEventSource, FrameTicker, Runner, Ticker, WheelEvent, WheelEventSource},
    selector::Selector,
    session::Mode,
};

/// spin a wheel of names in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Spin a wheel of names in your terminal. Points mode keeps a leaderboard; chosen-once mode removes each winner until everyone has had a turn."
)]
pub struct Cli {
    /// names for the wheel, separated by commas or newlines
    #[clap(short = 'n', long)]
    names: Option<String>,

    /// read names from a file instead
    #[clap(short = 'f', long, conflicts_with = "names")]
    names_file: Option<PathBuf>,

    /// selection mode to start in
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// seconds from spin to settle
    #[clap(short = 's', long)]
    spin_secs: Option<f64>,

    /// seed the selector so a session can be replayed
    #[clap(long)]
    seed: Option<u64>,

    /// ring the terminal bell when a winner is picked
    #[clap(long)]
    bell: bool,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(secs) = self.spin_secs {
            config.spin_secs = secs;
        }
        if self.bell {
            config.bell = true;
        }
        config
    }

    fn names_text(&self) -> anyhow::Result<Option<String>> {
        if let Some(names) = &self.names {
            return Ok(Some(names.clone()));
        }
        match &self.names_file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("reading names from {}", path.display()))
                .map(Some),
            None => Ok(None),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn init_tracing(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let env_filter = EnvFilter::try_from_env("SPINWHEEL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;
    Ok(())
}

/// Wire config, flags and the visit greeting into a ready-to-run app.
fn build_app(cli: &Cli, config: &Config, welcome: Option<String>, now: Instant) -> anyhow::Result<App> {
    let selector = match cli.seed {
        Some(seed) => Selector::with_seed(seed),
        None => Selector::new(),
    };
    let audio = if config.bell {
        AudioCoordinator::new(Box::new(TerminalBell))
    } else {
        AudioCoordinator::silent()
    };

    let mut engine = SpinEngine::new(config.spin_settings())
        .with_mode(config.mode)
        .with_selector(Box::new(selector))
        .with_audio(audio);
    if let Some(names) = &config.default_names {
        engine = engine.with_names(names.clone());
    }
    if let Some(text) = cli.names_text()? {
        engine.load_names(&text);
    }
    engine.drain_events();

    let draft = engine.session().players().join(", ");
    Ok(App::new(engine, draft, welcome, now))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = AppDirs::log_path();
    if let Err(err) = init_tracing(&log_path) {
        eprintln!("logging disabled ({}): {err:#}", log_path.display());
    }

    let config = cli.apply(cli.config_store().load());
    let progress = record_visit(&FileProgressStore::new(), Utc::now());
    info!(visits = progress.visits, mode = %config.mode, "starting");

    let mut app = build_app(&cli, &config, progress.welcome_message(), Instant::now())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FrameTicker::default());
    let result = run(&mut terminal, &mut app, &runner);
    app.engine.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend, E: WheelEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> anyhow::Result<()> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit() {
        let event = runner.step(app.is_animating());
        let now = Instant::now();
        match event {
            WheelEvent::Key(key) => {
                app.on_key(key, now);
                // A fresh spin rests at 0° for exactly this frame.
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            WheelEvent::Paste(text) => app.on_paste(&text),
            WheelEvent::Resize | WheelEvent::Tick => {}
        }
        app.on_tick(now);
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }
    Ok(())
}
