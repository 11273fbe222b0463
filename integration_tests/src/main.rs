//! Integration tests for the boost gauge firmware.
//!
//! Run after flashing the firmware. Connects over BLE and exercises the
//! gauge service.

mod gauge_client;
mod tests;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use gauge_client::GaugeClient;
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the boost gauge firmware")]
struct Args {
    /// Advertised device name
    #[arg(short, long, default_value = "Rupert's MR2")]
    name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", "Boost Gauge Integration Tests".bold());
    println!("Device: \"{}\"", args.name);
    println!();

    println!("Scanning...");
    let gauge = GaugeClient::connect_by_name(&args.name, Duration::from_secs(args.scan_timeout)).await?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&gauge).await;
    print_results(&results);

    let _ = gauge.disconnect().await;

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
