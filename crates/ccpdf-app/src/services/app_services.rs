// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: resolves the printer configuration and opens the
// stores the renderer and the calibration handshake share.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use ccpdf_core::RenderConfig;
use ccpdf_core::error::Result;
use ccpdf_print::calibration::SqliteSettingsStore;
use ccpdf_print::{FileLinkStore, SqliteLicenseCatalog};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const SETTINGS_DB: &str = "settings.db";

pub struct AppServices {
    data_dir: PathBuf,
    config: RenderConfig,
}

impl AppServices {
    /// Open services in the default data directory.
    pub fn init() -> Result<Self> {
        Self::at(data_dir::data_dir())
    }

    /// Open services rooted at `dir`. Relative config paths resolve against it.
    pub fn at(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let config = load_config(&dir).unwrap_or_default().rooted_at(&dir);
        info!(path = %dir.display(), "services initialised");
        Ok(Self {
            data_dir: dir,
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn link_store(&self) -> Result<FileLinkStore> {
        FileLinkStore::open(&self.config.store_dir)
    }

    pub fn settings_store(&self) -> Result<SqliteSettingsStore> {
        SqliteSettingsStore::open(self.data_dir.join(SETTINGS_DB))
    }

    /// License catalog, if one is installed. License pages are skipped
    /// without it.
    pub fn license_catalog(&self) -> Option<SqliteLicenseCatalog> {
        let path = &self.config.license_db;
        if !path.exists() {
            debug!(path = %path.display(), "no license catalog installed");
            return None;
        }
        match SqliteLicenseCatalog::open(path) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                warn!(error = %e, "license catalog unavailable");
                None
            }
        }
    }
}

fn load_config(data_dir: &Path) -> Option<RenderConfig> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return None;
    }
    match RenderConfig::load(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "config unreadable; using defaults");
            None
        }
    }
}
