use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use typedash::{
    config::{Config, ConfigStore, FileConfigStore},
    controller::{tick_interval, SessionController},
    runtime::{AppEvent, ChannelEventSource, Runner},
    session::{MAX_DURATION_SECS, MIN_DURATION_SECS},
    text_generator::{Corpus, TextGenerator, DEFAULT_CORPUS},
    ui::ScreenModel,
    Effect, EffectSink, KeyInput,
};

/// Seconds added or removed by the up/down keys
const DURATION_STEP_SECS: u32 = 15;

/// timed typing speed test with live wpm and a per-second results graph
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// number of seconds to run the test (5-300); remembered for next time
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(5..=300))]
    seconds: Option<u32>,

    /// json corpus file of the form {"name": ..., "excerpts": [...]}
    #[clap(short = 'c', long)]
    corpus: Option<PathBuf>,

    /// seed the text selection for a reproducible prompt
    #[clap(long)]
    seed: Option<u64>,

    /// write debug logs to this file
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

struct App<S: ConfigStore> {
    controller: SessionController,
    screen: ScreenModel,
    store: S,
    config: Config,
}

impl<S: ConfigStore> App<S> {
    fn new(cli: &Cli, store: S) -> Result<Self, Box<dyn Error>> {
        let mut config = store.load();
        if let Some(secs) = cli.seconds {
            config.duration_secs = secs;
        }
        if let Some(path) = &cli.corpus {
            config.corpus_path = Some(path.clone());
        }

        let corpus = match &config.corpus_path {
            Some(path) => Corpus::from_path(path)?,
            None => Corpus::builtin(DEFAULT_CORPUS)?,
        };
        let generator = match cli.seed {
            Some(seed) => TextGenerator::with_seed(corpus, seed),
            None => TextGenerator::new(corpus),
        };

        let controller = SessionController::new(generator, config.duration_secs);
        let mut screen = ScreenModel::new(controller.duration_secs());
        screen.apply_all(&controller.replay());

        let app = Self {
            controller,
            screen,
            store,
            config,
        };
        app.save_config();
        Ok(app)
    }

    fn save_config(&self) {
        if let Err(err) = self.store.save(&self.config) {
            tracing::warn!(%err, "could not save config");
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        self.screen.apply_all(&effects);
    }

    fn change_duration(&mut self, up: bool) {
        let current = self.controller.duration_secs();
        let stepped = if up {
            current.saturating_add(DURATION_STEP_SECS)
        } else {
            current.saturating_sub(DURATION_STEP_SECS)
        };
        let target = stepped.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);

        if target == current {
            return;
        }

        let effects = self.controller.configure(target);
        self.screen.duration_secs = self.controller.duration_secs();
        self.apply(effects);

        self.config.duration_secs = self.controller.duration_secs();
        self.save_config();
    }

    fn on_tick(&mut self) {
        for handle in self.controller.active_tasks() {
            let effects = self.controller.tick(handle);
            self.apply(effects);
        }
    }

    /// Rebuild the view from scratch; only presentation state changes
    fn on_resize(&mut self) {
        let mut screen = ScreenModel::new(self.controller.duration_secs());
        screen.apply_all(&self.controller.replay());
        self.screen = screen;
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit
            }
            KeyCode::Tab => {
                let effects = self.controller.request_restart();
                self.apply(effects);
            }
            KeyCode::Up => self.change_duration(true),
            KeyCode::Down => self.change_duration(false),
            KeyCode::Char('r') if self.screen.is_showing_results() => {
                let effects = self.controller.request_restart();
                self.apply(effects);
            }
            _ => {
                let effects = self.controller.submit_key(&KeyInput::from(&key));
                self.apply(effects);
            }
        }
        Flow::Continue
    }
}

fn init_logging(path: Option<&Path>) -> io::Result<()> {
    // without a log file nothing is installed; stderr belongs to the TUI
    if let Some(path) = path {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.as_deref())?;

    let mut app = App::new(&cli, FileConfigStore::new())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, S: ConfigStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(ChannelEventSource::terminal(), tick_interval());

    loop {
        terminal.draw(|f| f.render_widget(&app.screen, f.area()))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => app.on_resize(),
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
