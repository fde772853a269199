// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page text rebuilt from draw calls, and searches over it.

pub mod geometry;
pub mod search;

pub use geometry::{Advance, Letter, Line, TextArea, Word};
pub use search::{UrlMatch, split_phrase};
