// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use labwired_loopback::mmio::{DEFAULT_DEVICE, WINDOW_SIZE};
use labwired_loopback::{
    BoardVariant, LoopbackConfig, LoopbackError, LoopbackObserver, LoopbackTester, Mismatch,
    RegisterAccess, RegisterWindow, RunReport, SimulatedFixture,
};

const EXIT_PASS: u8 = 0;
const EXIT_LOOPBACK_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn parse_size(s: &str) -> Result<usize, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex size '{}': {}", s, e))
    } else {
        usize::from_str(trimmed).map_err(|e| format!("Invalid size '{}': {}", s, e))
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Walking-bit GPIO loopback test for FPGA breakout boards",
    long_about = None
)]
struct Cli {
    /// UIO device exposing the GPIO register block
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Board variant: a (single-bank, pzsdr1) or b (triple-bank, pzsdr2)
    #[arg(short, long, default_value = "a")]
    variant: BoardVariant,

    /// Bytes to map from the device (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x10000", value_parser = parse_size)]
    map_size: usize,

    /// Run against a simulated loopback fixture instead of the device
    #[arg(long)]
    simulate: bool,

    /// Hold this input bit low on every bank of the simulated fixture
    #[arg(long, requires = "simulate", value_parser = clap::value_parser!(u32).range(..32))]
    simulate_stuck: Option<u32>,

    /// Print the run report as a single JSON line on stdout
    #[arg(long)]
    json: bool,

    /// Write the run report (pretty JSON) to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable per-pin debug logging
    #[arg(short, long)]
    trace: bool,
}

/// Prints every failing sub-check as soon as it is seen.
#[derive(Debug)]
struct ConsoleObserver;

impl LoopbackObserver for ConsoleObserver {
    fn on_mismatch(&self, mismatch: &Mismatch) {
        println!("{}", mismatch);
    }
}

#[derive(Debug, Serialize)]
struct ResultArtifact<'a> {
    config: &'a LoopbackConfig,
    simulated: bool,
    #[serde(flatten)]
    report: &'a RunReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only diagnostics and the report.
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = LoopbackConfig {
        device: cli.device.clone(),
        map_size: if cli.simulate { WINDOW_SIZE } else { cli.map_size },
        variant: cli.variant,
    };

    if cli.simulate {
        info!("Simulating {} loopback fixture", config.variant);
        let mut fixture = SimulatedFixture::new(config.variant);
        if let Some(bit) = cli.simulate_stuck {
            info!("Injecting stuck-low fault on input bit {}", bit);
            fixture = fixture.with_stuck_low(bit);
        }
        return run_loopback(&cli, &config, fixture);
    }

    let window = match RegisterWindow::acquire(&config.device, config.map_size) {
        Ok(window) => window,
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };
    run_loopback(&cli, &config, window)
}

fn run_loopback<W: RegisterAccess>(cli: &Cli, config: &LoopbackConfig, window: W) -> ExitCode {
    let mut tester = match LoopbackTester::new(window, config.variant) {
        Ok(tester) => tester,
        Err(e @ LoopbackError::OffsetOutOfRange { .. }) => {
            error!(
                "{:#}",
                anyhow::Error::new(e).context(format!(
                    "map size {:#x} too small for {} board",
                    config.map_size, config.variant
                ))
            );
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };
    tester.add_observer(Arc::new(ConsoleObserver));

    let report = match tester.run() {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e).context("loopback run aborted"));
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    if let Err(e) = write_report(cli, config, &report) {
        error!("{:#}", e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    if report.passed() {
        info!("All {} pins passed", report.pin_count);
        ExitCode::from(EXIT_PASS)
    } else {
        error!(
            "{} loopback errors on {} pin steps",
            report.failure_count,
            report.failed_pins().count()
        );
        ExitCode::from(EXIT_LOOPBACK_FAIL)
    }
}

fn write_report(cli: &Cli, config: &LoopbackConfig, report: &RunReport) -> anyhow::Result<()> {
    let artifact = ResultArtifact {
        config,
        simulated: cli.simulate,
        report,
    };

    if cli.json {
        println!("{}", serde_json::to_string(&artifact)?);
    }

    if let Some(path) = &cli.output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create report {:?}", path))?;
        serde_json::to_writer_pretty(file, &artifact)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        info!("Report written to {:?}", path);
    }

    Ok(())
}
