use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use concierge_config::{Config, ConfigManager, FallbackKind};
use concierge_observability::LogManager;
use concierge_session::{
    ApologyResponder, ConciergeResponder, EngineOptions, FallbackResponder, HttpQueryClient,
    Message, SessionEngine,
};

#[derive(Parser)]
#[command(name = "concierge-cli")]
#[command(about = "Talk to the Four Seasons concierge from the terminal")]
#[command(version)]
struct Cli {
    /// Query service base URL (overrides remote.base_url)
    #[arg(long, env = "CONCIERGE_SERVER_URL")]
    server_url: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "CONCIERGE_CONFIG", default_value = "~/.concierge/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation
    Chat,
    /// Open a session, send one message and print the reply
    Send {
        /// Message text
        message: String,
        /// Print the whole message log as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Show the offline reply for a message without contacting the service
    Respond {
        /// Message text
        message: String,
    },
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
    /// Read a value
    Get {
        /// Dotted key (e.g. remote.base_url, widget.fallback)
        key: String,
    },
    /// Write a value
    Set {
        /// Dotted key (e.g. remote.base_url, widget.fallback)
        key: String,
        /// New value
        value: String,
    },
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Print the current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = concierge_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match cli.command {
        Commands::Config(args) => handle_config(args, &config_path).await,
        command => {
            let config = load_config(&config_path, cli.server_url.as_deref()).await?;
            let mut log_manager = init_logging(&config, cli.debug);

            if cli.debug {
                eprintln!(
                    "{}",
                    format!("[DEBUG] Server URL: {}", config.remote.base_url).dimmed()
                );
            }

            match command {
                Commands::Chat => run_interactive_chat(&config, log_manager.as_mut()).await,
                Commands::Send { message, json } => send_message(&config, &message, json).await,
                Commands::Respond { message } => {
                    preview_response(&config, &message);
                    Ok(())
                }
                Commands::Config(_) => Ok(()),
            }
        }
    }
}

async fn load_config(path: &Path, server_url: Option<&str>) -> anyhow::Result<Config> {
    let manager = ConfigManager::load(path).await?;
    let mut config = manager.snapshot().await;

    if let Some(url) = server_url {
        config.remote.base_url = url.to_string();
    }
    ConfigManager::validate(&config)?;

    Ok(config)
}

/// Logs go to the configured file only; stdout carries the conversation.
fn init_logging(config: &Config, debug: bool) -> Option<LogManager> {
    let mut log_config = concierge_observability::Config::from_concierge("concierge-cli", config)
        .with_stdout(false);
    if debug {
        log_config = log_config.with_log_level("debug");
    }

    match LogManager::new(&log_config) {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("{}", format!("⚠️  Logging disabled: {}", e).yellow());
            None
        }
    }
}

fn build_responder(config: &Config) -> Arc<dyn FallbackResponder> {
    match config.widget.fallback {
        FallbackKind::Concierge => Arc::new(ConciergeResponder),
        FallbackKind::Apology => Arc::new(ApologyResponder::default()),
    }
}

fn build_engine(config: &Config) -> SessionEngine {
    let remote = &config.remote;
    let mut client = HttpQueryClient::new(&remote.base_url)
        .with_query_path(&remote.query_path)
        .with_thread_header(&remote.thread_header)
        .with_greeting(&remote.handshake_greeting);
    if let Some(timeout) = remote.timeout() {
        client = client.with_timeout(timeout);
    }

    // rich text is a terminal widget concern; the CLI prints replies verbatim
    let mut options = EngineOptions::default().with_rich_text(false);
    if let Some(welcome) = &config.widget.welcome_message {
        options = options.with_welcome_message(welcome);
    }

    SessionEngine::new(Arc::new(client), build_responder(config), options)
}

fn print_bot(message: &Message) {
    println!("{} {}", "Concierge:".green().bold(), message.text);
    if message.degraded {
        println!("{}", "   (offline reply)".yellow().italic());
    }
}

async fn send_message(config: &Config, message: &str, json: bool) -> anyhow::Result<()> {
    let mut engine = build_engine(config);

    let start = Instant::now();
    engine.open_and_handshake().await;

    match engine.send(message).await {
        Some(reply) => {
            if !json {
                print_bot(reply);
            }
        }
        None => {
            println!("{}", "❌ Nothing to send".red());
            return Ok(());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(engine.messages())?);
    } else {
        println!(
            "{}",
            format!("{} in {:?}", engine.connectivity(), start.elapsed()).dimmed()
        );
    }

    Ok(())
}

fn preview_response(config: &Config, message: &str) {
    if config.widget.fallback == FallbackKind::Concierge {
        let topic = ConciergeResponder
            .classify(message)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "generic".to_string());
        println!("{}", format!("Topic: {}", topic).dimmed());
    }

    let reply = build_responder(config).respond(message);
    println!("{} {}", "Concierge:".green().bold(), reply);
}

async fn run_interactive_chat(
    config: &Config,
    mut log_manager: Option<&mut LogManager>,
) -> anyhow::Result<()> {
    let mut engine = build_engine(config);

    println!("{}", "🛎  Four Seasons Concierge".cyan().bold());
    println!(
        "{}",
        "Type '/new' to start over, '/log <level>' to change logging, 'exit' or 'quit' to leave"
            .dimmed()
    );
    println!();

    engine.open_and_handshake().await;
    if let Some(welcome) = engine.messages().first() {
        print_bot(welcome);
    }
    println!("{}", engine.connectivity().to_string().dimmed());
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

        if input == "/new" {
            engine.close();
            engine.open_and_handshake().await;
            println!("{}", "✨ New conversation".cyan());
            if let Some(welcome) = engine.messages().first() {
                print_bot(welcome);
            }
            println!();
            continue;
        }

        if let Some(level) = parse_log_command(input) {
            match log_manager.as_mut() {
                Some(manager) => match manager.update_level(level) {
                    Ok(()) => println!("{}", format!("📝 Log level set to {}", level).cyan()),
                    Err(e) => println!("{}", format!("❌ {}", e).red()),
                },
                None => println!("{}", "⚠️  Logging is disabled".yellow()),
            }
            continue;
        }

        if input.is_empty() {
            continue;
        }

        if let Some(reply) = engine.send(input).await {
            print_bot(reply);
        }
        println!();
    }

    engine.close();
    Ok(())
}

/// `/log <level>` takes a level or filter directive, e.g. `/log concierge_session=debug`.
fn parse_log_command(input: &str) -> Option<&str> {
    let level = input.strip_prefix("/log")?;
    if !level.starts_with(char::is_whitespace) {
        return None;
    }
    let level = level.trim();
    (!level.is_empty()).then_some(level)
}

async fn handle_config(args: ConfigArgs, config_path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not set or unknown: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(config_path).await?;

            let mut updated = manager.snapshot().await;
            if let Err(e) = updated.set_value(&key, &value) {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }
            manager.update(|config| *config = updated).await?;

            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            concierge_config::init_concierge_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.to_path_buf());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "concierge-cli",
            "--server-url",
            "http://localhost:4000",
            "send",
            "book a trip",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.server_url.as_deref(), Some("http://localhost:4000"));
        match cli.command {
            Commands::Send { message, json } => {
                assert_eq!(message, "book a trip");
                assert!(json);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_cli_parses_config_set() {
        let cli = Cli::try_parse_from(["concierge-cli", "config", "set", "widget.fallback", "apology"])
            .unwrap();
        match cli.command {
            Commands::Config(ConfigArgs {
                command: ConfigCommands::Set { key, value },
            }) => {
                assert_eq!(key, "widget.fallback");
                assert_eq!(value, "apology");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_parse_log_command() {
        assert_eq!(parse_log_command("/log debug"), Some("debug"));
        assert_eq!(
            parse_log_command("/log  concierge_session=trace "),
            Some("concierge_session=trace")
        );
        assert_eq!(parse_log_command("/log"), None);
        assert_eq!(parse_log_command("/log   "), None);
        assert_eq!(parse_log_command("/logger warn"), None);
        assert_eq!(parse_log_command("log debug"), None);
    }

    #[test]
    fn test_build_responder_follows_config() {
        let mut config = Config::default();
        assert_eq!(
            build_responder(&config).respond("spa"),
            ConciergeResponder.respond("spa")
        );

        config.widget.fallback = FallbackKind::Apology;
        assert_eq!(
            build_responder(&config).respond("spa"),
            concierge_session::CONNECTIVITY_APOLOGY
        );
    }
}
