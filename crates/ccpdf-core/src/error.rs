// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ccpdf.

use thiserror::Error;

/// Top-level error type for all ccpdf operations.
#[derive(Debug, Error)]
pub enum CcpdfError {
    // -- Spool / printer --
    #[error("spool write failed: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("spool error: {0}")]
    Spool(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    // -- Two-pass handshake --
    #[error("calibration failed: {0}")]
    CalibrationFailed(String),

    #[error("link store round-trip failed: {0}")]
    StoreRoundTrip(String),

    // -- Host contract --
    #[error("escape payload too short: {size} bytes, need at least {required}")]
    InvalidEscape { size: usize, required: usize },

    #[error("invalid escape payload: {0}")]
    MalformedEscape(String),

    #[error("invalid lifecycle transition: {event} while {state}")]
    InvalidTransition { event: &'static str, state: String },

    // -- Resources --
    #[error("license catalog error: {0}")]
    Catalog(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a failure is handled by the rendering hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Abort the page or document and tell the user; never retried.
    ResourceUnavailable,
    /// Stored or measured data does not add up; abort before the real pass.
    DataInconsistency,
    /// Output is still produced, just with less markup.
    Degraded,
    /// The host called us with bad arguments; reject the call.
    HostContract,
}

impl CcpdfError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ShortWrite { .. }
            | Self::Spool(_)
            | Self::ResourceUnavailable(_)
            | Self::Database(_)
            | Self::Io(_) => ErrorClass::ResourceUnavailable,
            Self::CalibrationFailed(_) | Self::StoreRoundTrip(_) | Self::Serialization(_) => {
                ErrorClass::DataInconsistency
            }
            Self::Catalog(_) | Self::ImageError(_) => ErrorClass::Degraded,
            Self::InvalidEscape { .. } | Self::MalformedEscape(_) | Self::InvalidTransition { .. } => {
                ErrorClass::HostContract
            }
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CcpdfError>;
