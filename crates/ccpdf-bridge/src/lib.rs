// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ccpdf: Host seams of the rendering hooks.
//
// The printer driver owns the spool file, realizes fonts and ships the license
// database. The renderer only talks to those through the traits defined here,
// so it can be driven by the real driver, by the replay tool, or by tests.

pub mod stub;
pub mod traits;

pub use traits::{GlyphSource, LicenseCatalog, PageHost, SpoolWriter, UnicodeRange};
