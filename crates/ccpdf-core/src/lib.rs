// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ccpdf: Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod license;
pub mod types;

pub use config::{DocumentSettings, RenderConfig};
pub use error::{CcpdfError, ErrorClass, Result};
pub use license::*;
pub use types::*;
