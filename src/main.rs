//! Ticket Desk - support ticket bot
//!
//! Entry point: loads configuration, connects to Discord, publishes the
//! ticket panel and serves the control API.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use ticketdesk_core::{
    api::{ApiServer, ApiServerConfig, AppState},
    config::DEFAULT_CONFIG_PATH,
    discord::DiscordClient,
    error::Result,
    BotConfig, ChatPlatform, PanelRenderer, RuleStore, TicketController,
};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "Support ticket bot with a rules control API", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "TICKETDESK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect, publish the panel, and serve the control API (default)
    Serve,

    /// Connect and publish a single panel, then exit
    PublishPanel,

    /// Print the current rules document
    ShowRules,
}

/// Everything wired from one configuration
struct Bot {
    config: BotConfig,
    client: Arc<DiscordClient>,
    rules: Arc<RuleStore>,
    panel: Arc<PanelRenderer>,
}

impl Bot {
    fn new(config: BotConfig) -> Self {
        let client = Arc::new(DiscordClient::new(&config.token, &config.api_base));
        let rules = Arc::new(RuleStore::new(&config.rules_path));
        let panel = Arc::new(PanelRenderer::new(
            client.clone(),
            rules.clone(),
            config.ticket_channel_id,
        ));
        Self {
            config,
            client,
            rules,
            panel,
        }
    }
}

async fn serve(config: BotConfig) -> Result<()> {
    let verifier = Arc::new(config.signature_verifier()?);
    let bot = Bot::new(config);

    bot.client.connect().await?;
    bot.panel.publish().await;

    let platform: Arc<dyn ChatPlatform> = bot.client.clone();
    let tickets = Arc::new(TicketController::new(
        platform.clone(),
        bot.rules.clone(),
        bot.config.ticket_settings(),
    ));

    let server_config = ApiServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], bot.config.port)),
        web_dir: bot.config.web_dir.clone(),
    };
    let state = AppState {
        rules: bot.rules.clone(),
        panel: bot.panel.clone(),
        platform,
        tickets,
        verifier,
    };

    ApiServer::new(server_config, state).serve().await?;
    Ok(())
}

async fn publish_panel(config: BotConfig) -> Result<()> {
    let bot = Bot::new(config);
    bot.client.connect().await?;
    bot.panel.publish().await;
    Ok(())
}

async fn show_rules(config: BotConfig) -> Result<()> {
    let rules = RuleStore::new(&config.rules_path).load().await;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Requested level for our crates, quieter for HTTP plumbing
    let level = level.as_str().to_lowercase();
    let filter = EnvFilter::new(format!(
        "ticketdesk={level},ticketdesk_core={level},tower_http=warn,hyper=warn,reqwest=warn"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Ticket Desk v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::PublishPanel => publish_panel(config).await,
        Commands::ShowRules => show_rules(config).await,
    }
}
