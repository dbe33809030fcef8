//! Echobot webhook server binary.
//!
//! Start the production server with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p echobot-telegram -- serve
//! ```
//!
//! Or develop locally behind ngrok:
//! ```bash
//! ngrok http 7172 &
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p echobot-telegram -- dev
//! ```

use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use echobot_core::config;
use echobot_telegram::config::{DEFAULT_NGROK_API_URL, DEFAULT_WEBHOOK_HOST, DEFAULT_WEBHOOK_PORT};
use echobot_telegram::ngrok::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY};
use echobot_telegram::webhook::{self, shutdown_signal};
use echobot_telegram::{
    AppState, BotConfig, NgrokTunnel, TelegramClient, TunnelProbe, WebhookCache, WebhookManager,
};
use tracing_subscriber::EnvFilter;

/// Echobot - a Telegram echo bot served over a webhook
#[derive(Parser, Debug)]
#[command(name = "echobot")]
#[command(about = "Telegram echo bot webhook server")]
struct Args {
    #[command(subcommand)]
    command: Mode,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Serve the webhook endpoint
    Serve(ServerArgs),
    /// Serve locally and point the webhook at an ngrok tunnel until shutdown
    Dev(DevArgs),
}

#[derive(ClapArgs, Debug)]
struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "WEBHOOK_HOST", default_value = DEFAULT_WEBHOOK_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "WEBHOOK_PORT", default_value_t = DEFAULT_WEBHOOK_PORT)]
    port: u16,
}

#[derive(ClapArgs, Debug)]
struct DevArgs {
    #[command(flatten)]
    server: ServerArgs,

    /// ngrok local API endpoint
    #[arg(long, env = "NGROK_API_URL", default_value = DEFAULT_NGROK_API_URL)]
    ngrok_api: String,

    /// Start ngrok ourselves instead of using a running one
    #[arg(long)]
    spawn_ngrok: bool,

    /// How many times to poll for the tunnel URL
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: u32,
}

impl ServerArgs {
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Environment files first so clap's `env` defaults see them.
    config::load_dotenv();
    let args = Args::parse();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "echobot=info,echobot_telegram=info,echobot_core=info",
        1 => "echobot=debug,echobot_telegram=debug,echobot_core=debug",
        2 => "echobot=trace,echobot_telegram=trace,echobot_core=trace",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bot_config = BotConfig::from_env()?;
    tracing::info!(config = ?bot_config, "Configuration loaded");

    match args.command {
        Mode::Serve(server) => run_server(bot_config, server).await?,
        Mode::Dev(dev) => run_dev(bot_config, dev).await?,
    }

    Ok(())
}

async fn run_server(bot_config: BotConfig, server: ServerArgs) -> echobot_telegram::Result<()> {
    let addr = server.addr();
    let state = AppState::new(bot_config, server.port);

    println!("\n[robot] Echobot webhook server");
    println!("   Listening: http://{}", addr);
    println!("   Press Ctrl+C to stop\n");

    webhook::serve(&addr, state, shutdown_signal()).await
}

async fn run_dev(bot_config: BotConfig, dev: DevArgs) -> echobot_telegram::Result<()> {
    if let Err(e) = config::ensure_state_dir() {
        tracing::warn!(error = %e, "Failed to create state directory");
    }

    let probe = TunnelProbe::new(dev.ngrok_api.clone()).with_retry(dev.attempts, DEFAULT_RETRY_DELAY);

    // Held for the whole session; dropping it stops ngrok.
    let _tunnel = if dev.spawn_ngrok {
        Some(NgrokTunnel::spawn(dev.server.port, &probe).await?)
    } else {
        if !probe.health_check().await {
            tracing::warn!(api = %probe.api_url(), "ngrok API not reachable yet, will keep polling");
        }
        None
    };

    let client = TelegramClient::from_config(&bot_config);
    let manager = WebhookManager::new(client, WebhookCache::default_location(), probe)
        .with_step_delay(Duration::from_secs(1));

    let addr = dev.server.addr();
    let state = AppState::new(bot_config, dev.server.port).with_webhook_state(manager.state());

    // Ctrl+C while still setting up skips serving but still restores.
    manager
        .run(shutdown_signal(), |tunnel_url| async move {
            println!("\n[robot] Echobot dev server");
            println!("   Local:   http://{}", addr);
            println!("   Webhook: {}", tunnel_url);
            println!("   Status:  http://{}/status", addr);
            println!("\n[phone] Open Telegram and send /start to begin");
            println!("   Press Ctrl+C to stop and restore the previous webhook\n");

            webhook::serve(&addr, state, shutdown_signal()).await
        })
        .await?
}
