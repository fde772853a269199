// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages shown when a print job cannot be produced.
//
// The driver has no UI of its own; the host shows `message` in a message box
// and logs `suggestion`.

use crate::error::CcpdfError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The job was aborted; printing again may work.
    Aborted,
    /// User must do something (reinstall, free disk space, fix settings).
    ActionRequired,
    /// The document was produced but some links or overlays are missing.
    Degraded,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `CcpdfError` into a `HumanError` for the printer named `printer`.
pub fn humanize_error(err: &CcpdfError, printer: &str) -> HumanError {
    match err {
        CcpdfError::ShortWrite { .. } | CcpdfError::Spool(_) => HumanError {
            message: format!("Cannot access the {printer}."),
            suggestion: "The print spooler stopped accepting data. Check free disk space and print again.".into(),
            severity: Severity::Aborted,
        },

        CcpdfError::ResourceUnavailable(detail) => HumanError {
            message: format!("Cannot access the {printer}."),
            suggestion: format!("A resource needed for printing is missing ({detail}). Reinstalling the printer may help."),
            severity: Severity::ActionRequired,
        },

        CcpdfError::CalibrationFailed(_) | CcpdfError::StoreRoundTrip(_) => HumanError {
            message: format!("There was an error working with printer {printer}."),
            suggestion: "The page measurement pass did not return usable data. Print again; links will not be placed until it succeeds.".into(),
            severity: Severity::Aborted,
        },

        CcpdfError::InvalidEscape { .. } | CcpdfError::MalformedEscape(_) => HumanError {
            message: "A link sent by the application was ignored.".into(),
            suggestion: "The application passed link data the printer could not read. Update the add-in.".into(),
            severity: Severity::Degraded,
        },

        CcpdfError::InvalidTransition { .. } => HumanError {
            message: format!("There was an error working with printer {printer}."),
            suggestion: "The application called the printer out of order. Print again.".into(),
            severity: Severity::Aborted,
        },

        CcpdfError::Catalog(_) | CcpdfError::Database(_) => HumanError {
            message: "The license page could not be created.".into(),
            suggestion: "The license database may be missing or damaged. Reinstalling the printer restores it.".into(),
            severity: Severity::Degraded,
        },

        CcpdfError::ImageError(_) => HumanError {
            message: "A license image could not be added.".into(),
            suggestion: "The badge or logo image may be missing or damaged. Reinstalling the printer restores it.".into(),
            severity: Severity::Degraded,
        },

        CcpdfError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: format!("Cannot access the {printer}."),
                    suggestion: "The printer does not have permission to write its data files. Check the folder permissions.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: format!("Cannot access the {printer}."),
                    suggestion: "There was a problem reading or writing a file. Your disk may be full.".into(),
                    severity: Severity::Aborted,
                }
            }
        }

        CcpdfError::Serialization(_) => HumanError {
            message: format!("There was an error working with printer {printer}."),
            suggestion: "Stored link data could not be read. Print again.".into(),
            severity: Severity::Aborted,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spool_failure_names_printer() {
        let err = CcpdfError::ShortWrite {
            written: 3,
            expected: 10,
        };
        let human = humanize_error(&err, "ccPDF Printer");
        assert_eq!(human.message, "Cannot access the ccPDF Printer.");
        assert_eq!(human.severity, Severity::Aborted);
    }

    #[test]
    fn calibration_mentions_working_with_printer() {
        let err = CcpdfError::CalibrationFailed("one marker".into());
        let human = humanize_error(&err, "ccPDF");
        assert!(human.message.contains("working with printer"));
    }

    #[test]
    fn catalog_is_degraded() {
        let human = humanize_error(&CcpdfError::Catalog("no row".into()), "p");
        assert_eq!(human.severity, Severity::Degraded);
    }
}
