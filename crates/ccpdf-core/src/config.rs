// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-job and per-printer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::license::{LicenseInfo, LicenseLocation};

/// Settings carried with a single print job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Target PDF file name, written as a `%%File:` directive.
    pub output_filename: Option<String>,
    /// Detect `http://` / `https://` URLs in page text and link them.
    pub auto_urls: bool,
    /// Ask the converter to open the PDF when done.
    pub auto_open: bool,
    /// Ask the converter to produce a temporary file.
    pub create_as_temp: bool,
    /// Emit DOCINFO rights metadata on the first page.
    pub set_properties: bool,
    pub license: LicenseInfo,
    pub location: LicenseLocation,
    /// Device resolution in dots per inch.
    pub print_quality_dpi: i32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            output_filename: None,
            auto_urls: true,
            auto_open: false,
            create_as_temp: false,
            set_properties: true,
            license: LicenseInfo::default(),
            location: LicenseLocation::default(),
            print_quality_dpi: 600,
        }
    }
}

/// Persistent settings of one installed printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// SQLite database holding license texts.
    pub license_db: PathBuf,
    /// Directory with badge, bullet and logo images.
    pub image_dir: PathBuf,
    /// Directory the link store writes between passes.
    pub store_dir: PathBuf,
    /// Shown in the license page footer.
    pub product_name: String,
    pub product_url: String,
    /// Language used for license catalog lookups.
    pub language_id: i64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            license_db: PathBuf::from("licenses.db"),
            image_dir: PathBuf::from("images"),
            store_dir: PathBuf::from("links"),
            product_name: "ccPDF".into(),
            product_url: "http://www.ccpdf.org".into(),
            language_id: 1,
        }
    }
}

impl RenderConfig {
    /// Read a config file written by [`RenderConfig::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        debug!(path = %path.display(), "render config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Resolve relative paths against `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for path in [&mut self.license_db, &mut self.image_dir, &mut self.store_dir] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
