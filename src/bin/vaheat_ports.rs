use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use vaheat::adapters::serial::list_ports;
use vaheat::core::discovery::is_vaheat;
use vaheat::utils::logger;
use vaheat::PortInfo;

#[derive(Parser)]
#[command(name = "vaheat-ports")]
#[command(about = "List serial ports with a VAHEAT attached")]
struct Args {
    /// Include every serial port, not only VAHEAT devices
    #[arg(short, long)]
    all: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct PortScan {
    scanned_at: DateTime<Utc>,
    ports: Vec<ScannedPort>,
}

#[derive(Serialize)]
struct ScannedPort {
    #[serde(flatten)]
    info: PortInfo,
    vaheat: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let ports: Vec<ScannedPort> = list_ports()
        .context("Failed to enumerate serial ports")?
        .into_iter()
        .map(|info| ScannedPort {
            vaheat: is_vaheat(&info),
            info,
        })
        .filter(|port| args.all || port.vaheat)
        .collect();

    tracing::debug!("Found {} port(s)", ports.len());

    let scan = PortScan {
        scanned_at: Utc::now(),
        ports,
    };
    let json = serde_json::to_string_pretty(&scan).context("Failed to serialize port scan")?;
    println!("{}", json);
    Ok(())
}
