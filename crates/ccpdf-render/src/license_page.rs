// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The license page appended to licensed documents.
//
// Layout is proportional to the page height: one sixtieth of it is the base
// line height, and every other measure derives from that.

use std::path::Path;

use tracing::{debug, instrument, warn};

use ccpdf_core::error::Result;
use ccpdf_core::{LicenseText, RenderConfig, Size};

use crate::postscript::image::{MAX_PAGE_IMAGE_SCALE, dpi_multiplier};
use crate::postscript::{
    CREATED_BY_TEXT, HYPERLINK_PROC, LICENSE_DESTINATION, PsImage, PsWriter, center_for, circle,
    hyperlink, jump_destination, show_text,
};

/// Logo drawn across the top of the page.
pub const LOGO_FILE: &str = "CCLogo.bmp";

/// Line heights per page.
const LINES_PER_PAGE: i32 = 60;

fn load_image(dir: &Path, file: &str) -> Option<PsImage> {
    match PsImage::open(dir.join(file)) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(file, error = %e, "license page image skipped");
            None
        }
    }
}

/// Writes the license page for one document.
pub struct LicensePage<'a> {
    pub text: &'a LicenseText,
    pub page_size: Size,
    pub dpi: i32,
    pub config: &'a RenderConfig,
}

impl LicensePage<'_> {
    #[instrument(skip_all, fields(license = %self.text.name))]
    pub fn render(&self, out: &mut PsWriter<'_>) -> Result<()> {
        let width = self.page_size.cx;
        let height = self.page_size.cy;
        let line = (height / LINES_PER_PAGE).max(1);
        let font = (line - 2).max(1);
        let margin = line * 2;
        let scale = dpi_multiplier(self.dpi, Some(MAX_PAGE_IMAGE_SCALE));
        let mut y = line * 6;

        out.write(&jump_destination(LICENSE_DESTINATION))?;

        if let Some(logo) = load_image(&self.config.image_dir, LOGO_FILE) {
            let target = logo.centered_in(0, width, y, scale);
            out.write(&logo.render(target))?;
            y = target.bottom + line;
        }

        out.write(HYPERLINK_PROC)?;

        let title = font * 3 / 2;
        out.write(&center_for(title, 0, y, width, &self.text.name))?;
        out.write(&hyperlink(title, &self.text.name, &self.text.deed_url()))?;
        y += title + line;

        for paragraph in &self.text.paragraphs {
            if paragraph.header {
                y += out.text_block(
                    font * 5 / 4,
                    margin,
                    y,
                    width - 2 * margin,
                    line * 5 / 4,
                    &paragraph.text,
                    false,
                )?;
            } else {
                let bullet_width = line * 5;
                let mut image_height = 0;
                if let Some(file) = &paragraph.image_file {
                    if let Some(image) = load_image(&self.config.image_dir, file) {
                        y += line / 2;
                        let target = image.centered_in(margin, margin + bullet_width, y, scale);
                        out.write(&image.render(target))?;
                        image_height = target.height();
                    }
                }
                let text_height = out.text_block(
                    line,
                    margin + bullet_width,
                    y,
                    width - (2 * margin + bullet_width),
                    line,
                    &paragraph.text,
                    false,
                )?;
                if image_height == 0 {
                    out.write(&circle(margin + bullet_width / 2, y + line / 2, line / 4))?;
                }
                y += text_height.max(image_height);
            }
            y += line / 2;
        }

        let product = &self.config.product_name;
        let footer = format!("{CREATED_BY_TEXT}{product}");
        out.write(&center_for(font, 0, height - 2 * line, width, &footer))?;
        out.write(&show_text(CREATED_BY_TEXT))?;
        out.write(&hyperlink(font, product, &self.config.product_url))?;

        debug!(paragraphs = self.text.paragraphs.len(), "license page written");
        Ok(())
    }
}
