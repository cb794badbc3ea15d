use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rfm69_transport::constants::MAX_FRAME_LEN;
use rfm69_transport::{
    init_logger, log_info, simulated_transport, DriverVariant, SimRadioHandle, TransportConfig,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rfm69-transport")]
#[command(about = "RFM69 transport layer tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Buffered,
    Polling,
}

impl From<Variant> for DriverVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Buffered => DriverVariant::Buffered,
            Variant::Polling => DriverVariant::Polling,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON transport configuration
    CheckConfig { path: PathBuf },
    /// Run the transport against a simulated radio and peer
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "10")]
        frames: u32,
        #[arg(short, long, default_value = "50")]
        interval_ms: u64,
        #[arg(short, long, value_enum)]
        variant: Option<Variant>,
        /// Address of this node
        #[arg(long, default_value = "1")]
        address: u8,
        /// Address of the simulated peer
        #[arg(long, default_value = "2")]
        peer: u8,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => {
            let config = TransportConfig::from_file(&path)
                .with_context(|| format!("invalid config {}", path.display()))?;
            log_info(&format!(
                "Config OK: {:?} variant, {} Hz, network {}, {} rx slots",
                config.variant, config.frequency_hz, config.network_id, config.rx_buffer_size
            ));
        }
        Commands::Simulate {
            config,
            frames,
            interval_ms,
            variant,
            address,
            peer,
        } => {
            let mut config = match config {
                Some(path) => TransportConfig::from_file(&path)
                    .with_context(|| format!("invalid config {}", path.display()))?,
                None => TransportConfig::default(),
            };
            if let Some(variant) = variant {
                config.variant = variant.into();
            }
            simulate(config, frames, interval_ms, address, peer).await?;
        }
    }

    Ok(())
}

/// Peer side of the simulated link: random frames at a fixed interval.
async fn inject_frames(air: SimRadioHandle, frames: u32, interval: Duration) {
    let mut rng = StdRng::from_entropy();
    for _ in 0..frames {
        let len = rng.gen_range(1..=MAX_FRAME_LEN);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let rssi = rng.gen_range(-100..=-40);
        air.inject(&payload, rng.gen_bool(0.5), rssi);
        tokio::time::sleep(interval).await;
    }
}

async fn simulate(
    config: TransportConfig,
    frames: u32,
    interval_ms: u64,
    address: u8,
    peer: u8,
) -> anyhow::Result<()> {
    let variant = config.variant;
    let (mut transport, air) = simulated_transport(config)?;
    transport.set_address(address);
    if !transport.init() {
        bail!("transport init failed");
    }
    log_info(&format!("Simulating {frames} frames ({variant:?} variant)"));

    let interval = Duration::from_millis(interval_ms.max(1));
    let injector = tokio::spawn(inject_frames(air, frames, interval));

    let mut ticker = tokio::time::interval(interval / 2);
    let mut buf = [0u8; MAX_FRAME_LEN];
    let mut received = 0u32;
    let mut replied = 0u32;

    loop {
        ticker.tick().await;
        while transport.available() {
            let len = transport.receive(&mut buf);
            if len == 0 {
                break;
            }
            received += 1;
            // Echo the first byte back so the send path is exercised too
            if transport.send(peer, &buf[..1], false) {
                replied += 1;
            }
        }
        if injector.is_finished() && !transport.available() {
            break;
        }
    }
    injector.await.context("frame injector panicked")?;

    log_info(&format!(
        "Received {received}/{frames} frames, {replied} replies acknowledged, {} lost, RSSI {} dBm, mode {:?}",
        transport.lost_frames(),
        transport.receiving_rssi(),
        transport.mode()
    ));
    Ok(())
}
