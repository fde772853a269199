// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ccpdf-render: Rendering hooks of the ccpdf PostScript printer.
//
// Rebuilds page text from the driver's draw calls, finds link targets and
// URLs in it, and writes pdfmark directives (links, destinations, license
// metadata, badges and the license page) into the PostScript stream.

pub mod escape;
pub mod glyph;
pub mod hooks;
pub mod license_page;
pub mod postscript;
pub mod text;

pub use escape::{EscapeLink, EscapeResponse};
pub use glyph::{GlyphMap, GlyphTranslator};
pub use hooks::{DocumentRenderer, DocumentState, RunContent, TextRun};
pub use text::{Advance, Line, TextArea, UrlMatch, Word};
