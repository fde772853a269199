// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ccpdf: host replay and calibration tool.
//
// Entry point. Initialises logging and services, then runs one command:
//
//   ccpdf replay <script.json> <out.ps>
//   ccpdf calibrate request [printer]
//   ccpdf calibrate resolve <setup.json> [printer]

mod cli;
mod services;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;

use ccpdf_bridge::stub::IoSpool;
use ccpdf_core::PrinterId;
use ccpdf_core::error::Result;
use ccpdf_core::human_errors::humanize_error;

use cli::{CalibrateStep, Cli, Commands};
use services::app_services::AppServices;
use services::calibrate::{self, CalibrationSetup};
use services::replay::{self, ReplayScript};

fn run(command: &Commands) -> Result<()> {
    let services = AppServices::init()?;
    match command {
        Commands::Replay { script, output } => {
            let script = ReplayScript::load(script)?;
            let mut spool = IoSpool(BufWriter::new(File::create(output)?));
            let summary = replay::replay(&services, &script, &mut spool)?;
            spool.0.flush()?;
            println!(
                "{} page(s) written to {} ({} escape(s) rejected)",
                summary.pages,
                output.display(),
                summary.rejected_escapes
            );
        }
        Commands::Calibrate {
            step: CalibrateStep::Request { printer },
        } => {
            let printer = PrinterId::new(printer.as_str());
            calibrate::request(&services, &printer)?;
            println!("measurement requested; print the marker page on {printer}");
        }
        Commands::Calibrate {
            step: CalibrateStep::Resolve { setup, printer },
        } => {
            let setup = CalibrationSetup::load(setup)?;
            let calibration = calibrate::resolve(&services, &PrinterId::new(printer.as_str()), &setup)?;
            println!("{}", serde_json::to_string_pretty(&calibration_report(&calibration))?);
        }
    }
    Ok(())
}

fn calibration_report(calibration: &ccpdf_print::Calibration) -> serde_json::Value {
    let axis = |a: &ccpdf_print::AxisCalibration| {
        serde_json::json!({
            "factor": a.factor,
            "offset": a.offset,
            "full_size": a.full_size,
            "center": a.center,
        })
    };
    serde_json::json!({
        "horizontal": axis(&calibration.horizontal),
        "vertical": axis(&calibration.vertical),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, class = ?e.class(), "command failed");
            let human = humanize_error(&e, cli.command.printer());
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}
