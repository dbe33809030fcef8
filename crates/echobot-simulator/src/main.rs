//! Echobot chat simulator binary.
//!
//! ```bash
//! cargo run -p echobot-simulator
//! LAMBDA_WEBHOOK_URL=https://example.com/webhook cargo run -p echobot-simulator
//! ```

use clap::Parser;
use echobot_core::config;
use echobot_simulator::config::{DEFAULT_HOST, DEFAULT_PORT};
use echobot_simulator::{serve, AppState, SimulatorConfig};
use tracing_subscriber::EnvFilter;

/// Echobot Simulator - chat with the bot without Telegram
#[derive(Parser, Debug)]
#[command(name = "echobot-simulator")]
#[command(about = "Local chat simulator API for Echobot")]
struct Args {
    /// Address to bind
    #[arg(long, env = "SIMULATOR_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "SIMULATOR_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Deployed webhook for remote mode
    #[arg(long, env = "LAMBDA_WEBHOOK_URL")]
    remote_url: Option<String>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_dotenv();
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "echobot_simulator=info,echobot_telegram=info",
        1 => "echobot_simulator=debug,echobot_telegram=debug",
        2 => "echobot_simulator=trace,echobot_telegram=trace",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let sim_config = SimulatorConfig::new(args.host, args.port).with_remote_url(args.remote_url);

    println!("\n[robot] Echobot Simulator");
    println!("   Listening: http://{}", sim_config.bind_address());
    println!(
        "   Remote webhook: {}",
        sim_config.remote_url.as_deref().unwrap_or("not configured")
    );
    println!("   Press Ctrl+C to stop\n");

    serve(AppState::new(sim_config)).await?;
    Ok(())
}
