// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Checked writes of PostScript fragments into the spool.

use ccpdf_bridge::SpoolWriter;
use ccpdf_core::error::{CcpdfError, Result};

use super::{centered_text_at, text_at};

/// Writer that fails on any short write to the spool.
pub struct PsWriter<'a> {
    spool: &'a mut dyn SpoolWriter,
    written: usize,
}

impl<'a> PsWriter<'a> {
    pub fn new(spool: &'a mut dyn SpoolWriter) -> Self {
        Self { spool, written: 0 }
    }

    pub fn write(&mut self, fragment: &str) -> Result<()> {
        let bytes = fragment.as_bytes();
        let written = self.spool.write_bytes(bytes)?;
        self.written += written;
        if written != bytes.len() {
            return Err(CcpdfError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    /// Bytes accepted by the spool through this writer.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Draw `text` wrapped to `width`, one line every `line_height` below
    /// `y`. Returns the height used.
    #[allow(clippy::too_many_arguments)]
    pub fn text_block(
        &mut self,
        font_size: i32,
        x: i32,
        y: i32,
        width: i32,
        line_height: i32,
        text: &str,
        centered: bool,
    ) -> Result<i32> {
        let mut height = 0;
        for line in wrap_lines(text, font_size, width) {
            height += line_height;
            let fragment = if centered {
                centered_text_at(font_size, x, y + height, width, &line)
            } else {
                text_at(font_size, x, y + height, &line)
            };
            self.write(&fragment)?;
        }
        Ok(height)
    }
}

/// Break `text` into lines that fit `width`, assuming characters half as
/// wide as `font_size`. Lines break at the last space that fits; a word
/// longer than a line is split.
pub fn wrap_lines(text: &str, font_size: i32, width: i32) -> Vec<String> {
    let advance = (font_size / 2).max(1) as usize;
    let width = width.max(0) as usize;
    let mut rest: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();

    while rest.len() > 1 && rest.len() * advance > width {
        let limit = (width / advance).clamp(1, rest.len() - 1);
        let split = (1..=limit).rev().find(|&i| rest[i] == ' ').unwrap_or(limit);
        lines.push(rest[..split].iter().collect());
        let skip = usize::from(rest[split] == ' ');
        rest.drain(..split + skip);
    }
    if !rest.is_empty() {
        lines.push(rest.into_iter().collect());
    }
    lines
}
