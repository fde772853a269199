// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster images (badges, bullets, logo) as inline PostScript `image` calls.
//
// Images are converted to 8-bit grayscale and embedded as hex data inside
// the page, so the output needs no external resources.

use std::fmt::Write as _;
use std::path::Path;

use image::{DynamicImage, GrayImage};
use tracing::{debug, instrument};

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{Rect, Size};

/// Resolution images are designed for.
const IMAGE_DPI: f64 = 72.0;

/// Largest upscale applied to license page images.
pub const MAX_PAGE_IMAGE_SCALE: f64 = 2.0;

/// Device pixels per image pixel at `dpi`, optionally capped.
pub fn dpi_multiplier(dpi: i32, cap: Option<f64>) -> f64 {
    if dpi <= 0 {
        return 1.0;
    }
    let multiplier = f64::from(dpi) / IMAGE_DPI;
    cap.map_or(multiplier, |cap| multiplier.min(cap))
}

/// Grayscale image ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct PsImage {
    pixels: GrayImage,
}

impl PsImage {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            CcpdfError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "image loaded");
        Ok(Self::from_dynamic(&img))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            pixels: image.to_luma8(),
        }
    }

    pub fn from_gray(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn size(&self) -> Size {
        Size::new(
            i32::try_from(self.pixels.width()).unwrap_or(i32::MAX),
            i32::try_from(self.pixels.height()).unwrap_or(i32::MAX),
        )
    }

    /// Size on the page after scaling by `multiplier`.
    pub fn scaled_size(&self, multiplier: f64) -> Size {
        let size = self.size();
        Size::new(
            (f64::from(size.cx) * multiplier) as i32,
            (f64::from(size.cy) * multiplier) as i32,
        )
    }

    /// Where the image lands when centred horizontally between `left` and
    /// `right` with its top at `top`.
    pub fn centered_in(&self, left: i32, right: i32, top: i32, multiplier: f64) -> Rect {
        let drawn = self.scaled_size(multiplier);
        let x = (left + right) / 2 - drawn.cx / 2;
        Rect::new(x, top, x + drawn.cx, top + drawn.cy)
    }

    /// PostScript drawing the image into `target`.
    pub fn render(&self, target: Rect) -> String {
        let (width, height) = (self.pixels.width(), self.pixels.height());
        let mut out = format!(
            "gsave\n{} {} translate\n{} {} scale\n{width} {height} 8 [{width} 0 0 -{height} 0 {height}] {{<\n",
            target.left,
            target.top,
            target.width(),
            target.height(),
        );
        for row in self.pixels.rows() {
            for pixel in row {
                let _ = write!(out, "{:02x}", pixel.0[0]);
            }
            out.push('\n');
        }
        out.push_str("\n>} image\ngrestore\n");
        out
    }
}
