// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: wires the ccpdf crates to the command line.

pub mod app_services;
pub mod calibrate;
pub mod data_dir;
pub mod replay;
