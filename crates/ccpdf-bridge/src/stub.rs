// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-less implementations of the bridge traits, used by the replay tool
// and by tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{FontDescriptor, LicenseInfo, LicenseText};

use crate::traits::*;

// -- Spools -------------------------------------------------------------------

/// Spool that keeps everything in memory.
///
/// With a limit set, it accepts bytes only up to the limit and then reports
/// short writes, like a spooler running out of disk.
#[derive(Debug, Default)]
pub struct MemorySpool {
    data: Vec<u8>,
    limit: Option<usize>,
}

impl MemorySpool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Spool contents as text; PostScript output is ASCII.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

impl SpoolWriter for MemorySpool {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        let accepted = match self.limit {
            Some(limit) => data.len().min(limit.saturating_sub(self.data.len())),
            None => data.len(),
        };
        self.data.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }
}

/// Spool backed by any `std::io::Write`, e.g. a buffered output file.
pub struct IoSpool<W: Write>(pub W);

impl<W: Write> SpoolWriter for IoSpool<W> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        self.0
            .write_all(data)
            .map_err(|e| CcpdfError::Spool(e.to_string()))?;
        Ok(data.len())
    }
}

// -- Page host --------------------------------------------------------------------

fn write_all(spool: &mut dyn SpoolWriter, text: &str) -> Result<()> {
    let written = spool.write_bytes(text.as_bytes())?;
    if written != text.len() {
        return Err(CcpdfError::ShortWrite {
            written,
            expected: text.len(),
        });
    }
    Ok(())
}

/// Page host that frames pages with DSC comments and a `showpage`, the way
/// a PostScript base driver emits them.
#[derive(Debug, Default)]
pub struct DscPageHost {
    open: bool,
}

impl DscPageHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageHost for DscPageHost {
    fn start_page(&mut self, spool: &mut dyn SpoolWriter, page: u32) -> Result<()> {
        write_all(spool, &format!("%%Page: {page} {page}\nsave\n"))?;
        self.open = true;
        Ok(())
    }

    fn send_page(&mut self, spool: &mut dyn SpoolWriter) -> Result<()> {
        if !self.open {
            return Err(CcpdfError::Spool("no page is open".into()));
        }
        write_all(spool, "restore showpage\n")?;
        self.open = false;
        Ok(())
    }
}

// -- Glyph source ---------------------------------------------------------------

/// First glyph index of printable ASCII in a standard TrueType ordering
/// (`.notdef`, `.null`, CR, then space).
const ASCII_GLYPH_BASE: u16 = 3;

/// Glyph tables keyed by face name.
#[derive(Debug, Default)]
pub struct TableGlyphSource {
    faces: HashMap<String, BTreeMap<char, u16>>,
    broken: HashSet<char>,
    range_queries: AtomicUsize,
}

impl TableGlyphSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a face mapping printable ASCII (space..`~`) to consecutive glyphs.
    pub fn with_ascii_face(mut self, face: &str) -> Self {
        let table = (b' '..=b'~')
            .map(|b| (b as char, (b - b' ') as u16 + ASCII_GLYPH_BASE))
            .collect();
        self.faces.insert(face.to_owned(), table);
        self
    }

    pub fn with_face(mut self, face: &str, glyphs: impl IntoIterator<Item = (char, u16)>) -> Self {
        self.faces
            .entry(face.to_owned())
            .or_default()
            .extend(glyphs);
        self
    }

    /// Make lookups of `ch` fail, as a damaged font would.
    pub fn with_broken_glyph(mut self, ch: char) -> Self {
        self.broken.insert(ch);
        self
    }

    /// Glyph index of `ch` in the ASCII layout of [`Self::with_ascii_face`].
    pub fn ascii_glyph(ch: char) -> Option<u16> {
        (' '..='~')
            .contains(&ch)
            .then(|| (ch as u8 - b' ') as u16 + ASCII_GLYPH_BASE)
    }

    /// How many times range enumeration has been requested.
    pub fn range_queries(&self) -> usize {
        self.range_queries.load(Ordering::Relaxed)
    }
}

impl GlyphSource for TableGlyphSource {
    fn unicode_ranges(&self, font: &FontDescriptor) -> Result<Vec<UnicodeRange>> {
        self.range_queries.fetch_add(1, Ordering::Relaxed);
        let table = self.faces.get(&font.face_name).ok_or_else(|| {
            CcpdfError::ResourceUnavailable(format!("font {} not installed", font.face_name))
        })?;

        let covered: BTreeSet<char> = table.keys().chain(self.broken.iter()).copied().collect();
        let mut ranges: Vec<UnicodeRange> = Vec::new();
        for ch in covered {
            let code = ch as u32;
            match ranges.last_mut() {
                Some(last) if last.first + last.count == code => last.count += 1,
                _ => ranges.push(UnicodeRange {
                    first: code,
                    count: 1,
                }),
            }
        }
        Ok(ranges)
    }

    fn glyph_index(&self, font: &FontDescriptor, ch: char) -> Result<Option<u16>> {
        if self.broken.contains(&ch) {
            return Err(CcpdfError::ResourceUnavailable(format!(
                "glyph lookup for U+{:04X} failed",
                ch as u32
            )));
        }
        Ok(self
            .faces
            .get(&font.face_name)
            .and_then(|table| table.get(&ch).copied()))
    }
}

// -- License catalog ------------------------------------------------------------

/// Catalog returning one fixed text for every license.
#[derive(Debug, Clone, Default)]
pub struct FixedLicenseCatalog(pub LicenseText);

impl LicenseCatalog for FixedLicenseCatalog {
    fn license_text(&self, info: &LicenseInfo, _language_id: i64) -> Result<LicenseText> {
        tracing::debug!(license = %info.name, "fixed license catalog lookup");
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_spool_reports_short_write() {
        let mut spool = MemorySpool::with_limit(4);
        assert_eq!(spool.write_bytes(b"ab").expect("write"), 2);
        assert_eq!(spool.write_bytes(b"cdef").expect("write"), 2);
        assert_eq!(spool.bytes(), b"abcd");
    }

    #[test]
    fn dsc_pages_frame_their_content() {
        let mut spool = MemorySpool::new();
        let mut pages = DscPageHost::new();
        assert!(pages.send_page(&mut spool).is_err());

        pages.start_page(&mut spool, 3).expect("start");
        spool.write_bytes(b"body\n").expect("body");
        pages.send_page(&mut spool).expect("send");
        assert_eq!(spool.text(), "%%Page: 3 3\nsave\nbody\nrestore showpage\n");
    }

    #[test]
    fn dsc_page_short_write_fails() {
        let mut spool = MemorySpool::with_limit(5);
        let err = DscPageHost::new()
            .start_page(&mut spool, 1)
            .expect_err("short");
        assert!(matches!(err, CcpdfError::ShortWrite { written: 5, .. }));
    }

    #[test]
    fn ascii_face_ranges_are_contiguous() {
        let source = TableGlyphSource::new().with_ascii_face("Arial");
        let font = FontDescriptor {
            face_name: "Arial".into(),
            ..Default::default()
        };
        let ranges = source.unicode_ranges(&font).expect("ranges");
        assert_eq!(
            ranges,
            vec![UnicodeRange {
                first: 0x20,
                count: 95
            }]
        );
        assert_eq!(source.glyph_index(&font, 'A').expect("lookup"), Some(36));
        assert_eq!(TableGlyphSource::ascii_glyph('A'), Some(36));
    }

    #[test]
    fn broken_glyph_fails_lookup() {
        let source = TableGlyphSource::new()
            .with_ascii_face("Arial")
            .with_broken_glyph('\u{e9}');
        let font = FontDescriptor {
            face_name: "Arial".into(),
            ..Default::default()
        };
        assert!(source.glyph_index(&font, '\u{e9}').is_err());
        assert_eq!(source.unicode_ranges(&font).expect("ranges").len(), 2);
    }
}
