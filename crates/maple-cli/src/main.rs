use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use maple_config::{Config, ConfigManager, TransportMode};
use maple_conversation::{
    format_history_time, format_message_time, Controller, ControllerSettings, Notice, Severity,
};
use maple_core::{Language, Region};
use maple_gateway::{event_channel, Connector, EventReceiver};
use maple_session::{sample_history, SessionStore};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Instrument;

mod runner;

use runner::{close_politely, latest_answer, pump_until_settled};

#[derive(Parser)]
#[command(name = "maple-cli")]
#[command(about = "Command line client for Maple regional support chat")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "MAPLE_CONFIG", default_value = "~/.maple/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ChatArgs {
    /// Region to ask about (defaults to chat.default_region)
    #[arg(long, short)]
    region: Option<Region>,

    /// Answer language (defaults to chat.default_language)
    #[arg(long, short)]
    language: Option<Language>,

    /// Use the offline mock transport
    #[arg(long)]
    mock: bool,

    /// Seconds to wait for each reply
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Question text
        question: String,
        #[command(flatten)]
        chat: ChatArgs,
    },
    /// Start an interactive chat
    Chat {
        #[command(flatten)]
        chat: ChatArgs,
    },
    /// List the sample chat history
    History,
    /// Configuration commands
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Read a config value
    Get {
        /// Config key (e.g. transport.mode, chat.default_region)
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key (e.g. transport.mode, chat.default_region)
        key: String,
        /// New value
        value: String,
    },
    /// Write the default config
    Init {
        /// Overwrite an existing config
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Print the current config
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = maple_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));
    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match cli.command {
        Commands::Ask { question, chat } => {
            let config = load_config(&config_path).await?;
            let _log = init_logging(&config, cli.debug)?;
            ask(&config, &chat, &question, cli.debug).await
        }
        Commands::Chat { chat } => {
            let config = load_config(&config_path).await?;
            let _log = init_logging(&config, cli.debug)?;
            run_interactive_chat(&config, &chat, cli.debug).await
        }
        Commands::History => show_history(),
        Commands::Config(args) => handle_config(args, config_path).await,
    }
}

async fn load_config(path: &Path) -> anyhow::Result<Config> {
    let manager = ConfigManager::load(path).await?;
    Ok(manager.snapshot().await)
}

/// Log to stderr only in debug mode so answers stay clean on stdout
fn init_logging(
    config: &Config,
    debug: bool,
) -> anyhow::Result<Option<maple_observability::LogManager>> {
    if !debug {
        return Ok(None);
    }
    let logging = maple_observability::LoggingConfig::default()
        .with_level("debug")
        .with_json_format(config.logging.json_format);
    Ok(Some(maple_observability::LogManager::new(&logging)?))
}

struct ChatSession {
    controller: Controller<Box<dyn Connector + Send>>,
    events: EventReceiver,
    timeout: Duration,
    close_grace: Duration,
}

impl ChatSession {
    fn open(config: &Config, chat: &ChatArgs) -> anyhow::Result<Self> {
        let mut transport = config.transport.clone();
        if chat.mock {
            transport.mode = TransportMode::Mock;
        }
        let (tx, events) = event_channel();
        let connector = transport.build_connector(tx)?;
        let settings = ControllerSettings {
            region: chat.region.unwrap_or(config.chat.default_region),
            language: chat.language.unwrap_or(config.chat.default_language),
            show_history: false,
        };

        Ok(Self {
            controller: Controller::new(connector, SessionStore::new(), settings),
            events,
            timeout: Duration::from_secs(chat.timeout),
            close_grace: Duration::from_millis(transport.close_grace_ms),
        })
    }

    /// Send one question and print whatever comes back
    async fn exchange(&mut self, question: &str, debug: bool) -> anyhow::Result<()> {
        let span = maple_observability::conversation_span(
            self.controller.live_session_id().unwrap_or("new"),
        );

        let start = Instant::now();
        span.in_scope(|| self.controller.send_message(question))?;
        let notices = pump_until_settled(&mut self.controller, &mut self.events, self.timeout)
            .instrument(span)
            .await?;

        if debug {
            eprintln!(
                "{}",
                format!(
                    "[DEBUG] Settled in {:?} (phase={}, session={:?})",
                    start.elapsed(),
                    self.controller.phase().name(),
                    self.controller.live_session_id()
                )
                .dimmed()
            );
        }

        let language = self.controller.language();
        for notice in &notices {
            print_notice(notice, language);
        }
        if let Some(answer) = latest_answer(&self.controller) {
            println!(
                "{} {}",
                "Bot:".green().bold(),
                format!("({})", format_message_time(answer.timestamp)).dimmed()
            );
            println!("{}", answer.text);
        }
        Ok(())
    }

    async fn close(&mut self) {
        close_politely(&mut self.controller, &mut self.events, self.close_grace).await;
    }
}

fn print_notice(notice: &Notice, language: Language) {
    let line = format!("{}: {}", notice.title(language), notice.description(language));
    match notice.severity() {
        Severity::Info => println!("{}", format!("ℹ️  {}", line).blue()),
        Severity::Warning => println!("{}", format!("⚠️  {}", line).yellow()),
        Severity::Error => println!("{}", format!("❌ {}", line).red()),
    }
}

async fn ask(config: &Config, chat: &ChatArgs, question: &str, debug: bool) -> anyhow::Result<()> {
    let mut session = ChatSession::open(config, chat)?;
    println!(
        "{}",
        format!(
            "🚀 Asking ({}, {}): {}",
            session.controller.region().label(),
            session.controller.language().label(),
            question
        )
        .cyan()
    );

    let result = session.exchange(question, debug).await;
    session.close().await;
    result
}

async fn run_interactive_chat(config: &Config, chat: &ChatArgs, debug: bool) -> anyhow::Result<()> {
    let mut session = ChatSession::open(config, chat)?;

    println!("{}", "🍁 Maple Interactive Chat".cyan().bold());
    println!(
        "{}",
        format!(
            "Region: {}  Language: {}",
            session.controller.region().label(),
            session.controller.language().label()
        )
        .dimmed()
    );
    println!("{}", "Commands: /region <name>, /language <en|fr>, exit".dimmed());
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }
        if input.is_empty() {
            continue;
        }

        if let Some(value) = input.strip_prefix("/region ") {
            match value.trim().parse::<Region>() {
                Ok(region) => {
                    session.controller.set_region(region);
                    println!("{}", format!("Region set to {}", region.label()).dimmed());
                }
                Err(e) => println!("{}", format!("❌ {}", e).red()),
            }
            continue;
        }
        if let Some(value) = input.strip_prefix("/language ") {
            match value.trim().parse::<Language>() {
                Ok(language) => {
                    session.controller.set_language(language);
                    println!("{}", format!("Language set to {}", language.label()).dimmed());
                }
                Err(e) => println!("{}", format!("❌ {}", e).red()),
            }
            continue;
        }

        if let Err(e) = session.exchange(input, debug).await {
            if debug {
                eprintln!("{}", format!("[DEBUG] Error: {:?}", e).dimmed());
            }
            println!("{}", format!("❌ Error: {}", e).red());
        }
        println!();
    }

    session.close().await;
    Ok(())
}

fn show_history() -> anyhow::Result<()> {
    let store = SessionStore::with_history(sample_history(chrono::Utc::now()));
    let sessions = store.all(None);

    if sessions.is_empty() {
        println!("{}", "No chat history yet.".yellow());
        return Ok(());
    }

    println!("{}", "📜 Chat History:".cyan().bold());
    println!();
    for session in sessions {
        println!(
            "{}  {}",
            format_history_time(session.start_time()).dimmed(),
            session.display_title().bold()
        );
        println!(
            "{}",
            format!(
                "    {} · {} · {} messages",
                session.region().label(),
                session.language().label(),
                session.messages().len()
            )
            .dimmed()
        );
    }
    Ok(())
}

async fn handle_config(args: ConfigArgs, config_path: PathBuf) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;

            let mut candidate = manager.snapshot().await;
            candidate.set_value(&key, &value)?;
            manager.update(|config| *config = candidate).await?;

            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            maple_config::init_maple_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
