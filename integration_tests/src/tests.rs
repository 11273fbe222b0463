//! Integration test cases.

use std::future::Future;
use std::time::Duration;

use colored::Colorize;

use crate::gauge_client::{
    parse_value, GaugeClient, MAX_PRESSURE_UUID, PRESSURE_UUID, RESET_MAX_PRESSURE,
    RESET_ZEROING, SENSOR_CONTROL_UUID, SENSOR_VOLTAGE_UUID, ZERO_SENSOR,
};

/// Time for a control write to take effect and a reading to be published
const SETTLE: Duration = Duration::from_millis(600);

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: Some(message.to_string()),
        }
    }
}

/// Run a test and print results as it happens.
async fn run_test<Fut>(name: &str, test: Fut) -> TestResult
where
    Fut: Future<Output = anyhow::Result<()>>,
{
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();

    let result = match test.await {
        Ok(()) => TestResult::pass(name),
        Err(e) => TestResult::fail(name, &format!("Error: {:#}", e)),
    };

    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(msg) = &result.message {
            println!("    {}", msg.red());
        }
    }

    result
}

/// Run all tests and return results.
pub async fn run_all_tests(gauge: &GaugeClient) -> Vec<TestResult> {
    vec![
        run_test("Descriptions label every characteristic", test_descriptions(gauge)).await,
        run_test("Telemetry values carry their units", test_value_format(gauge)).await,
        run_test("Telemetry is notified periodically", test_notifications(gauge)).await,
        run_test("Max pressure tracks the peak", test_max_pressure_is_peak(gauge)).await,
        run_test("Reset max pressure", test_reset_max_pressure(gauge)).await,
        run_test("Zero sensor then reset zeroing", test_zero_and_reset(gauge)).await,
        run_test("Unknown opcodes are ignored", test_unknown_opcode(gauge)).await,
    ]
}

/// Print test results summary.
pub fn print_results(results: &[TestResult]) {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Test Results".bold());
    println!("{}", "=".repeat(60));

    let mut passed = 0;
    let mut failed = 0;

    for result in results {
        if result.passed {
            println!("  {} {}", "[PASS]".green().bold(), result.name);
            passed += 1;
        } else {
            println!("  {} {}", "[FAIL]".red().bold(), result.name);
            if let Some(msg) = &result.message {
                println!("         {}", msg.red());
            }
            failed += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Total: {} passed, {} failed",
        passed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
    println!("{}", "=".repeat(60));
}

// --- Individual Tests ---

async fn test_descriptions(gauge: &GaugeClient) -> anyhow::Result<()> {
    let expected = [
        (PRESSURE_UUID, "Pressure"),
        (MAX_PRESSURE_UUID, "Max pressure"),
        (SENSOR_VOLTAGE_UUID, "Sensor voltage"),
        (SENSOR_CONTROL_UUID, "General purpose sensor control"),
    ];

    let labels = gauge.read_descriptions().await?;
    for (uuid, label) in expected {
        match labels.iter().find(|(u, _)| *u == uuid) {
            Some((_, actual)) if actual == label => {}
            Some((_, actual)) => anyhow::bail!("{}: expected '{}', got '{}'", uuid, label, actual),
            None => anyhow::bail!("{}: no description", uuid),
        }
    }
    Ok(())
}

async fn test_value_format(gauge: &GaugeClient) -> anyhow::Result<()> {
    let pressure = gauge.read_pressure().await?;
    let max = gauge.read_max_pressure().await?;
    let voltage = gauge.read_sensor_voltage().await?;

    parse_value(&pressure, " psi")?;
    parse_value(&max, " psi")?;
    let volts = parse_value(&voltage, "V")?;
    if !(0.0..=3.3).contains(&volts) {
        anyhow::bail!("Sensor voltage out of ADC range: {}", voltage);
    }

    print!("({}, max {}, {}) ", pressure, max, voltage);
    Ok(())
}

async fn test_notifications(gauge: &GaugeClient) -> anyhow::Result<()> {
    gauge.take_notifications().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    let received = gauge.take_notifications().await;

    // Readings are published every 200 ms
    let pressure = received.iter().filter(|n| n.uuid == PRESSURE_UUID).count();
    let voltage = received.iter().filter(|n| n.uuid == SENSOR_VOLTAGE_UUID).count();
    if pressure < 5 || voltage < 5 {
        anyhow::bail!(
            "Expected at least 5 of each, got {} pressure and {} voltage",
            pressure,
            voltage
        );
    }

    for notification in received.iter().filter(|n| n.uuid == PRESSURE_UUID) {
        let text = String::from_utf8(notification.value.clone())?;
        parse_value(&text, " psi")?;
    }
    Ok(())
}

async fn test_max_pressure_is_peak(gauge: &GaugeClient) -> anyhow::Result<()> {
    for _ in 0..5 {
        let pressure = parse_value(&gauge.read_pressure().await?, " psi")?;
        let max = parse_value(&gauge.read_max_pressure().await?, " psi")?;
        // Pressure may be published between the two reads
        if max + 0.5 < pressure {
            anyhow::bail!("Max pressure {} below pressure {}", max, pressure);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    Ok(())
}

async fn test_reset_max_pressure(gauge: &GaugeClient) -> anyhow::Result<()> {
    gauge.write_control(&[RESET_MAX_PRESSURE]).await?;
    tokio::time::sleep(SETTLE).await;

    let pressure = parse_value(&gauge.read_pressure().await?, " psi")?;
    let max = parse_value(&gauge.read_max_pressure().await?, " psi")?;
    // After a reset the peak is zero or whatever has been read since
    if max > pressure.max(0.0) + 0.5 {
        anyhow::bail!("Max pressure {} not reset (pressure {})", max, pressure);
    }
    Ok(())
}

async fn test_zero_and_reset(gauge: &GaugeClient) -> anyhow::Result<()> {
    gauge.write_control(&[RESET_ZEROING]).await?;
    tokio::time::sleep(SETTLE).await;
    let raw = parse_value(&gauge.read_pressure().await?, " psi")?;

    gauge.write_control(&[ZERO_SENSOR]).await?;
    tokio::time::sleep(SETTLE).await;
    let zeroed = parse_value(&gauge.read_pressure().await?, " psi")?;
    if zeroed.abs() > 0.5 {
        anyhow::bail!("Expected ~0 psi after zeroing, got {}", zeroed);
    }

    gauge.write_control(&[RESET_ZEROING]).await?;
    tokio::time::sleep(SETTLE).await;
    let restored = parse_value(&gauge.read_pressure().await?, " psi")?;
    if (restored - raw).abs() > 0.5 {
        anyhow::bail!("Expected ~{} psi after reset, got {}", raw, restored);
    }
    Ok(())
}

async fn test_unknown_opcode(gauge: &GaugeClient) -> anyhow::Result<()> {
    let before = parse_value(&gauge.read_max_pressure().await?, " psi")?;

    gauge.write_control(&[0x09]).await?;
    gauge.write_control(&[RESET_MAX_PRESSURE, 0x00]).await?;
    tokio::time::sleep(SETTLE).await;

    // Still connected and the peak was not reset
    let after = parse_value(&gauge.read_max_pressure().await?, " psi")?;
    if after + 0.001 < before {
        anyhow::bail!("Max pressure changed from {} to {}", before, after);
    }
    Ok(())
}
