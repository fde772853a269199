// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command line of the ccpdf tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::services::replay::DEFAULT_PRINTER;

/// Replay recorded printer jobs and run the link calibration handshake.
#[derive(Debug, Parser)]
#[command(name = "ccpdf", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a recorded host job into a PostScript file
    Replay {
        /// Job script (JSON)
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// PostScript output file
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },

    /// Two-pass calibration of spreadsheet link positions
    Calibrate {
        #[command(subcommand)]
        step: CalibrateStep,
    },
}

#[derive(Debug, Subcommand)]
pub enum CalibrateStep {
    /// Turn the next document printed on the printer into a measurement pass
    Request {
        /// Printer name
        #[arg(default_value = DEFAULT_PRINTER)]
        printer: String,
    },

    /// Compute and store the calibration for a page setup
    Resolve {
        /// Page setup and marker positions (JSON)
        #[arg(value_name = "SETUP")]
        setup: PathBuf,

        /// Printer name
        #[arg(default_value = DEFAULT_PRINTER)]
        printer: String,
    },
}

impl Commands {
    /// Printer the command works with, for error messages.
    pub fn printer(&self) -> &str {
        match self {
            Self::Replay { .. } => DEFAULT_PRINTER,
            Self::Calibrate {
                step: CalibrateStep::Request { printer } | CalibrateStep::Resolve { printer, .. },
            } => printer.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_replay() {
        let cli = Cli::try_parse_from(["ccpdf", "replay", "job.json", "out.ps"]).expect("replay");
        match cli.command {
            Commands::Replay { script, output } => {
                assert_eq!(script, PathBuf::from("job.json"));
                assert_eq!(output, PathBuf::from("out.ps"));
            }
            other => panic!("expected Replay, got {other:?}"),
        }
    }

    #[test]
    fn parse_calibrate_request_defaults_printer() {
        let cli = Cli::try_parse_from(["ccpdf", "calibrate", "request"]).expect("request");
        assert_eq!(cli.command.printer(), DEFAULT_PRINTER);
        assert!(matches!(
            cli.command,
            Commands::Calibrate {
                step: CalibrateStep::Request { .. }
            }
        ));
    }

    #[test]
    fn parse_calibrate_resolve_with_printer() {
        let cli = Cli::try_parse_from(["ccpdf", "calibrate", "resolve", "setup.json", "Office PDF"])
            .expect("resolve");
        assert_eq!(cli.command.printer(), "Office PDF");
        match cli.command {
            Commands::Calibrate {
                step: CalibrateStep::Resolve { setup, .. },
            } => assert_eq!(setup, PathBuf::from("setup.json")),
            other => panic!("expected Resolve, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(Cli::try_parse_from(["ccpdf"]).is_err());
        assert!(Cli::try_parse_from(["ccpdf", "replay", "job.json"]).is_err());
        assert!(Cli::try_parse_from(["ccpdf", "calibrate", "request", "a", "b"]).is_err());
        assert!(Cli::try_parse_from(["ccpdf", "calibrate", "resolve"]).is_err());
    }
}
