// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reverse glyph tables: glyph index back to Unicode character.
//
// Drivers often receive text as font glyph indices. To search the page text
// we invert each font's character-to-glyph mapping once and cache it under
// the font's signature. Only complete tables are cached, so a failed build
// is retried on the next request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, instrument, warn};

use ccpdf_bridge::GlyphSource;
use ccpdf_core::FontDescriptor;

/// Stands in for glyphs the table cannot translate.
pub const MISSING_GLYPH: char = '\u{7f}';

/// Glyph index to character table of one font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphMap {
    chars: HashMap<u16, char>,
}

impl GlyphMap {
    pub fn char_for(&self, glyph: u16) -> Option<char> {
        self.chars.get(&glyph).copied()
    }

    /// Translate a glyph run; unknown glyphs become [`MISSING_GLYPH`].
    pub fn translate(&self, glyphs: &[u16]) -> String {
        glyphs
            .iter()
            .map(|g| self.char_for(*g).unwrap_or(MISSING_GLYPH))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn build(source: &dyn GlyphSource, font: &FontDescriptor) -> ccpdf_core::Result<Self> {
        let mut chars = HashMap::new();
        for range in source.unicode_ranges(font)? {
            for ch in range.chars() {
                if let Some(glyph) = source.glyph_index(font, ch)? {
                    // Several characters can share a glyph; the lowest wins.
                    chars.entry(glyph).or_insert(ch);
                }
            }
        }
        Ok(Self { chars })
    }
}

/// Cache of glyph maps shared by the renderers of one process.
#[derive(Debug, Default)]
pub struct GlyphTranslator {
    fonts: Mutex<HashMap<String, Arc<GlyphMap>>>,
}

impl GlyphTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyph map for `font`, building and caching it on first use.
    ///
    /// `None` when the font's tables cannot be read; text drawn with such a
    /// font is left out of the page text.
    #[instrument(skip_all, fields(face = %font.face_name))]
    pub fn font_translation(
        &self,
        source: &dyn GlyphSource,
        font: &FontDescriptor,
    ) -> Option<Arc<GlyphMap>> {
        let key = font.signature();
        let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = fonts.get(&key) {
            return Some(Arc::clone(map));
        }

        match GlyphMap::build(source, font) {
            Ok(map) => {
                debug!(glyphs = map.len(), "glyph map built");
                let map = Arc::new(map);
                fonts.insert(key, Arc::clone(&map));
                Some(map)
            }
            Err(e) => {
                warn!(error = %e, "font cannot be translated");
                None
            }
        }
    }

    pub fn cached_fonts(&self) -> usize {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every cached map.
    pub fn clear(&self) {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpdf_bridge::stub::TableGlyphSource;

    fn arial() -> FontDescriptor {
        FontDescriptor {
            face_name: "Arial".into(),
            height: 12,
            weight: 400,
            ..Default::default()
        }
    }

    fn glyphs(text: &str) -> Vec<u16> {
        text.chars()
            .map(|c| TableGlyphSource::ascii_glyph(c).expect("ascii"))
            .collect()
    }

    #[test]
    fn glyph_run_translates_back_to_text() {
        let source = TableGlyphSource::new().with_ascii_face("Arial");
        let translator = GlyphTranslator::new();
        let map = translator.font_translation(&source, &arial()).expect("map");
        assert_eq!(map.translate(&glyphs("Read more")), "Read more");
    }

    #[test]
    fn unknown_glyphs_become_sentinel() {
        let source = TableGlyphSource::new().with_ascii_face("Arial");
        let translator = GlyphTranslator::new();
        let map = translator.font_translation(&source, &arial()).expect("map");
        assert_eq!(map.translate(&[36, 0, 2000]), "A\u{7f}\u{7f}");
    }

    #[test]
    fn equal_signatures_share_one_build() {
        let source = TableGlyphSource::new().with_ascii_face("Arial");
        let translator = GlyphTranslator::new();
        let first = translator.font_translation(&source, &arial()).expect("map");

        let same = FontDescriptor {
            char_set: 7,
            ..arial()
        };
        let second = translator.font_translation(&source, &same).expect("map");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.range_queries(), 1);

        let bold = FontDescriptor {
            weight: 700,
            ..arial()
        };
        translator.font_translation(&source, &bold).expect("map");
        assert_eq!(translator.cached_fonts(), 2);
    }

    #[test]
    fn first_character_wins_for_shared_glyph() {
        let source = TableGlyphSource::new().with_face("Sym", [('a', 5), ('b', 5), ('c', 6)]);
        let font = FontDescriptor {
            face_name: "Sym".into(),
            ..Default::default()
        };
        let map = GlyphTranslator::new()
            .font_translation(&source, &font)
            .expect("map");
        assert_eq!(map.char_for(5), Some('a'));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn failed_lookup_is_not_cached() {
        let broken = TableGlyphSource::new()
            .with_ascii_face("Arial")
            .with_broken_glyph('\u{e9}');
        let translator = GlyphTranslator::new();
        assert!(translator.font_translation(&broken, &arial()).is_none());
        assert_eq!(translator.cached_fonts(), 0);

        let healthy = TableGlyphSource::new().with_ascii_face("Arial");
        assert!(translator.font_translation(&healthy, &arial()).is_some());
    }

    #[test]
    fn missing_font_yields_none() {
        let source = TableGlyphSource::new();
        assert!(GlyphTranslator::new().font_translation(&source, &arial()).is_none());
    }

    #[test]
    fn clear_empties_the_cache() {
        let source = TableGlyphSource::new().with_ascii_face("Arial");
        let translator = GlyphTranslator::new();
        translator.font_translation(&source, &arial());
        translator.clear();
        assert_eq!(translator.cached_fonts(), 0);
    }
}
