// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key/value stores that carry link data between the two processes of a job.
//
// Keys are printer identities. `write` must not return before the data is
// durable: the second pass starts as soon as the first one's document ends.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::PrinterId;

pub trait LinkStore {
    fn read(&self, printer: &PrinterId) -> Result<Option<Vec<u8>>>;
    fn write(&self, printer: &PrinterId, data: &[u8]) -> Result<()>;
    /// Removing a key that is not present succeeds.
    fn remove(&self, printer: &PrinterId) -> Result<()>;
}

/// Store keeping one file per printer in a directory.
///
/// File names are the SHA-256 of the printer name, so any printer name maps
/// to a valid file name.
pub struct FileLinkStore {
    dir: PathBuf,
}

impl FileLinkStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, printer: &PrinterId) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(printer.as_str().as_bytes());
        self.dir.join(format!("{}.links", hex::encode(hasher.finalize())))
    }
}

impl LinkStore for FileLinkStore {
    fn read(&self, printer: &PrinterId) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(printer)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip_all, fields(printer = %printer, bytes = data.len()))]
    fn write(&self, printer: &PrinterId, data: &[u8]) -> Result<()> {
        let path = self.path_for(printer);
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "link data flushed");
        Ok(())
    }

    fn remove(&self, printer: &PrinterId) -> Result<()> {
        match fs::remove_file(self.path_for(printer)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and single-process replays.
#[derive(Default)]
pub struct MemoryLinkStore {
    entries: Mutex<HashMap<PrinterId, Vec<u8>>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<PrinterId, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| CcpdfError::ResourceUnavailable("link store lock poisoned".into()))
    }
}

impl LinkStore for MemoryLinkStore {
    fn read(&self, printer: &PrinterId) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(printer).cloned())
    }

    fn write(&self, printer: &PrinterId, data: &[u8]) -> Result<()> {
        self.entries()?.insert(printer.clone(), data.to_vec());
        Ok(())
    }

    fn remove(&self, printer: &PrinterId) -> Result<()> {
        self.entries()?.remove(printer);
        Ok(())
    }
}
