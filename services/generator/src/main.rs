//! Market update generator entry point

use anyhow::{Context, Result};
use clap::Parser;
use codec::Framing;
use generator_config::{GeneratorConfig, SizeProfile};
use market_generator::{SessionController, TracingStatsSink};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Receiver host
    #[arg(long)]
    host: Option<String>,

    /// Receiver UDP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Total packets to send
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Target packets per second
    #[arg(short, long)]
    rate: Option<u64>,

    /// Prefix every datagram with the 4-byte packet header
    #[arg(long)]
    framed: bool,

    /// Send each second's packets back-to-back, then sleep
    #[arg(long, conflicts_with = "random_count")]
    batch: bool,

    /// Framed datagrams carrying 1-20 records each (implies --framed)
    #[arg(long)]
    random_count: bool,

    /// Draw whole-number sizes in [1, 100)
    #[arg(long)]
    integer_size: bool,

    /// RNG seed for a reproducible payload
    #[arg(long)]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn build_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::load(args.config.as_deref())?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(count) = args.count {
        config.total_packets = count;
    }
    if let Some(rate) = args.rate {
        config.target_rate = rate;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.integer_size {
        config.size_profile = SizeProfile::Integer;
    }
    if args.batch || args.random_count {
        config.pacing = GeneratorConfig::pacing_from_flags(args.batch, args.random_count)?;
    }
    if args.framed || args.random_count {
        config.framing = Framing::Framed;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting market update generator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = build_config(&args).context("Invalid generator configuration")?;
    let mut controller = SessionController::new(config, TracingStatsSink)?;
    let cancel = controller.cancel_token();

    let mut run = tokio::task::spawn_blocking(move || controller.run());

    let summary = tokio::select! {
        joined = &mut run => joined.context("Send loop panicked")??,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("Received shutdown signal, stopping after the current packet");
                    cancel.cancel();
                }
                Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
            }
            run.await.context("Send loop panicked")??
        }
    };

    info!(
        "{} packets sent ({} send errors)",
        summary.packets_sent, summary.send_errors
    );
    Ok(())
}
