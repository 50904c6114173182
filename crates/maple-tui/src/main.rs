use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use maple_config::{Config, ConfigManager, TransportMode};
use maple_conversation::{Controller, ControllerSettings};
use maple_gateway::{event_channel, EventReceiver};
use maple_observability::LogManager;
use maple_session::{sample_history, SessionStore};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

mod app;
mod markup;
mod ui;

use app::App;

const TICK_RATE: Duration = Duration::from_millis(250);
/// Time left for the polite close frames to go out before the runtime stops
const SHUTDOWN_GRACE: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "maple-tui")]
#[command(about = "Maple regional support chat", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (default: ~/.maple/config.json)
    #[arg(short, long, env = "MAPLE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the offline mock transport
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let manager = match &args.config {
        Some(path) => ConfigManager::load(path).await,
        None => ConfigManager::load_default().await,
    }
    .context("Failed to load config")?;
    let mut config = manager.snapshot().await;
    if args.mock {
        config.transport.mode = TransportMode::Mock;
    }

    let mut log_manager = init_logging(&config)?;
    info!(
        "Starting maple-tui (transport={}, region={}, language={})",
        config.transport.mode.as_str(),
        config.chat.default_region,
        config.chat.default_language
    );

    let (events_tx, events_rx) = event_channel();
    let connector = config.transport.build_connector(events_tx)?;
    let store = if config.chat.seed_history {
        SessionStore::with_history(sample_history(chrono::Utc::now()))
    } else {
        SessionStore::new()
    };
    let settings = ControllerSettings {
        region: config.chat.default_region,
        language: config.chat.default_language,
        show_history: config.chat.show_history,
    };
    let mut app = App::new(Controller::new(connector, store, settings));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, events_rx, &manager, &mut log_manager).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if !app.should_quit {
        app.quit();
    }
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    info!("maple-tui stopped");

    res
}

/// The terminal owns stdout, so logs only go to the file
fn init_logging(config: &Config) -> anyhow::Result<LogManager> {
    let file = config
        .logging
        .file
        .as_deref()
        .and_then(maple_config::expand_tilde)
        .or_else(maple_config::default_log_path)
        .context("Could not resolve a log file path")?;

    let logging = maple_observability::LoggingConfig::default()
        .with_level(config.logging.level.as_str())
        .with_json_format(config.logging.json_format)
        .with_stdout(false)
        .with_file(file);

    Ok(LogManager::new(&logging)?)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut transport: EventReceiver,
    manager: &ConfigManager,
    log_manager: &mut LogManager,
) -> anyhow::Result<()> {
    let mut terminal_events = EventStream::new();
    let mut tick = tokio::time::interval(TICK_RATE);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if is_reload_key(&key) => {
                    reload_log_level(manager, log_manager).await
                }
                Some(Ok(Event::Key(key))) => handle_key_event(app, key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => app.quit(),
            },
            Some(envelope) = transport.recv() => app.on_envelope(envelope),
            _ = tick.tick() => app.on_tick(),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn is_reload_key(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.code == KeyCode::Char('o')
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Re-read the config file and apply its log level; other settings take
/// effect on the next start
async fn reload_log_level(manager: &ConfigManager, log_manager: &mut LogManager) {
    if let Err(e) = manager.reload().await {
        warn!("Config reload failed: {}", e);
        return;
    }
    let level = manager.snapshot().await.logging.level;
    if let Err(e) = log_manager.update_level(level.as_str()) {
        warn!("Could not apply log level {}: {}", level.as_str(), e);
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.quit(),
        KeyCode::Char('r') if ctrl => app.cycle_region(),
        KeyCode::Char('l') if ctrl => app.cycle_language(),
        KeyCode::Char('g') if ctrl => app.jump_live(),
        KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.toggle_history(),
        KeyCode::Enter => app.submit(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::PageDown => app.scroll_down(),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(c) if !ctrl => app.push_char(c),
        _ => {}
    }
}
