// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ccpdf: Data exchanged between the spreadsheet add-in and the printer.
//
// The add-in describes links per page, the printer resolves them while the
// job renders, and measurement passes flow back through the same link store.

pub mod calibration;
pub mod catalog;
pub mod links;
pub mod store;

pub use calibration::{AxisCalibration, Calibration, MeasuredMarkers, PageSetup, SettingsStore};
pub use catalog::SqliteLicenseCatalog;
pub use links::{LinkData, LinkRecord, LinkTarget, PageLinkSet};
pub use store::{FileLinkStore, LinkStore, MemoryLinkStore};
