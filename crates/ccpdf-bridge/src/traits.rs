// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the capabilities the host driver provides.

use ccpdf_core::error::Result;
use ccpdf_core::{FontDescriptor, LicenseInfo, LicenseText};

/// Byte sink of the print job (the driver's spool file).
pub trait SpoolWriter {
    /// Write `data` and return how many bytes the spooler accepted.
    ///
    /// Accepting fewer bytes than offered is not an error here; callers
    /// treat it as one.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize>;
}

/// Page boundaries of the base driver, for pages the hooks add on their own.
///
/// Pages the host prints are framed by the host itself; a page synthesized
/// at document end must be opened and closed through this seam so it ends
/// up as a page of its own in the output.
pub trait PageHost {
    /// Open page `page` (counted from 1) on `spool`.
    fn start_page(&mut self, spool: &mut dyn SpoolWriter, page: u32) -> Result<()>;

    /// Close the open page and output it.
    fn send_page(&mut self, spool: &mut dyn SpoolWriter) -> Result<()>;
}

/// Contiguous run of Unicode code points a font covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeRange {
    pub first: u32,
    pub count: u32,
}

impl UnicodeRange {
    /// Code points of the range that are valid `char`s.
    pub fn chars(&self) -> impl Iterator<Item = char> {
        (self.first..self.first.saturating_add(self.count)).filter_map(char::from_u32)
    }
}

/// Font queries answered by the host's font engine.
pub trait GlyphSource {
    /// Unicode coverage of the realized font.
    fn unicode_ranges(&self, font: &FontDescriptor) -> Result<Vec<UnicodeRange>>;

    /// Glyph index the font uses for `ch`.
    ///
    /// `Ok(None)` means the font has no glyph for `ch`; an error means the
    /// lookup itself failed.
    fn glyph_index(&self, font: &FontDescriptor, ch: char) -> Result<Option<u16>>;
}

/// Source of license page text.
pub trait LicenseCatalog {
    fn license_text(&self, info: &LicenseInfo, language_id: i64) -> Result<LicenseText>;
}
