// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// License texts shipped with the printer, stored in SQLite.
//
// The database is produced by the license team and installed read-only next
// to the driver; only tests create the schema themselves.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, instrument};

use ccpdf_bridge::LicenseCatalog;
use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{License, LicenseInfo, LicenseParagraph, LicenseText};

/// Jurisdiction used when the job does not name one.
const DEFAULT_JURISDICTION: i64 = 1;

/// Schema of the license database.
pub const CATALOG_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS TblLicenseType (
        LicenseTypeID INTEGER PRIMARY KEY,
        LicenseShortName TEXT NOT NULL,
        commercial INTEGER NOT NULL DEFAULT 0,
        derivs INTEGER NOT NULL DEFAULT 0,
        mode INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tblLicenseName (
        LicenseTypeID INTEGER NOT NULL,
        LangID INTEGER NOT NULL,
        LicenseName TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tblJurisdictionName (
        jurisdictionsID INTEGER NOT NULL,
        LanguageID INTEGER NOT NULL,
        JurisdictionName TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tblJurisdiction (
        JurisdictionID INTEGER NOT NULL,
        mode INTEGER NOT NULL,
        Version TEXT,
        ShortName TEXT
    );
    CREATE TABLE IF NOT EXISTS tblImages (
        ImageID INTEGER PRIMARY KEY,
        ImageFile TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tblText (
        Text_ID INTEGER NOT NULL,
        Lang INTEGER NOT NULL,
        Data TEXT NOT NULL,
        header INTEGER NOT NULL DEFAULT 0,
        Imageid INTEGER
    );
    CREATE TABLE IF NOT EXISTS tblTextOrder (
        LicenseTypeID INTEGER NOT NULL,
        textid INTEGER NOT NULL,
        textorder INTEGER NOT NULL
    );
"#;

fn db_err(context: &str, e: rusqlite::Error) -> CcpdfError {
    CcpdfError::Database(format!("{context}: {e}"))
}

/// License catalog reading the installed SQLite database.
pub struct SqliteLicenseCatalog {
    conn: Connection,
}

impl SqliteLicenseCatalog {
    /// Open an existing database read-only.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| CcpdfError::ResourceUnavailable(format!("license database: {e}")))?;
        info!("license catalog opened");
        Ok(Self { conn })
    }

    /// Open an empty in-memory catalog with the schema created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open in-memory", e))?;
        conn.execute_batch(CATALOG_SCHEMA_SQL)
            .map_err(|e| db_err("create schema", e))?;
        debug!("in-memory license catalog opened");
        Ok(Self { conn })
    }

    /// Raw connection, for loading catalog content.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn license_type(&self, license: &License) -> Result<(i64, String, i64)> {
        let row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String)> {
            Ok((row.get(0)?, row.get(1)?))
        };
        let found: Option<(i64, String)> = match *license {
            License::CreativeCommons {
                commercial_use,
                modification,
            } => self.conn.query_row(
                "SELECT LicenseTypeID, LicenseShortName FROM TblLicenseType
                 WHERE commercial = ?1 AND derivs = ?2 AND mode = 0",
                params![i64::from(commercial_use), modification.code()],
                row,
            ),
            License::Sampling(kind) => self.conn.query_row(
                "SELECT LicenseTypeID, LicenseShortName FROM TblLicenseType
                 WHERE derivs = ?1 AND mode = 1",
                params![kind.code()],
                row,
            ),
            License::DevelopingNations => self.conn.query_row(
                "SELECT LicenseTypeID, LicenseShortName FROM TblLicenseType WHERE mode = 2",
                [],
                row,
            ),
            License::None | License::PublicDomain => {
                return Err(CcpdfError::Catalog(format!("{license:?} has no license text")));
            }
        }
        .optional()
        .map_err(|e| db_err("license type", e))?;

        let mode = license.catalog_mode().unwrap_or_default();
        found
            .map(|(id, short)| (id, short, mode))
            .ok_or_else(|| CcpdfError::Catalog(format!("no license type for {license:?}")))
    }

    fn jurisdiction_id(&self, info: &LicenseInfo) -> Result<i64> {
        let Some(name) = info.jurisdiction.as_deref().filter(|_| info.has_jurisdiction()) else {
            return Ok(DEFAULT_JURISDICTION);
        };
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT jurisdictionsID FROM tblJurisdictionName WHERE JurisdictionName = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_err("jurisdiction id", e))?;
        Ok(id.unwrap_or(DEFAULT_JURISDICTION))
    }

    fn paragraphs(&self, license_id: i64, language_id: i64) -> Result<Vec<LicenseParagraph>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT tblText.header, tblText.Data, tblImages.ImageFile
                 FROM tblTextOrder
                 INNER JOIN tblText ON tblText.Text_ID = tblTextOrder.textid
                 LEFT JOIN tblImages ON tblText.Imageid = tblImages.ImageID
                 WHERE tblTextOrder.LicenseTypeID = ?1 AND tblText.Lang = ?2
                 ORDER BY textorder",
            )
            .map_err(|e| db_err("prepare text query", e))?;
        let rows = stmt
            .query_map(params![license_id, language_id], |row| {
                Ok(LicenseParagraph {
                    header: row.get::<_, i64>(0)? == 1,
                    text: row.get(1)?,
                    image_file: row.get::<_, Option<String>>(2)?.filter(|f| !f.is_empty()),
                })
            })
            .map_err(|e| db_err("query text", e))?;
        let paragraphs = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| db_err("read text", e))?;
        Ok(paragraphs)
    }
}

impl LicenseCatalog for SqliteLicenseCatalog {
    #[instrument(skip_all, fields(license = %info.name, language_id = language_id))]
    fn license_text(&self, info: &LicenseInfo, language_id: i64) -> Result<LicenseText> {
        let (license_id, short_name, mode) = self.license_type(&info.license)?;

        let mut name: String = self
            .conn
            .query_row(
                "SELECT LicenseName FROM tblLicenseName WHERE LicenseTypeID = ?1 AND LangID = ?2",
                params![license_id, language_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_err("license name", e))?
            .ok_or_else(|| CcpdfError::Catalog(format!("no name for license type {license_id}")))?;

        let jurisdiction = self.jurisdiction_id(info)?;
        let record: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT Version, ShortName FROM tblJurisdiction WHERE JurisdictionID = ?1 AND mode = ?2",
                params![jurisdiction, mode],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| db_err("jurisdiction", e))?;
        let (version, jurisdiction_short) = record.unwrap_or_default();
        if let Some(version) = version.as_deref().filter(|v| !v.is_empty()) {
            name.push(' ');
            name.push_str(version);
        }

        let jurisdiction_name: String = self
            .conn
            .query_row(
                "SELECT JurisdictionName FROM tblJurisdictionName
                 WHERE jurisdictionsID = ?1 AND LanguageID = ?2",
                params![jurisdiction, language_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_err("jurisdiction name", e))?
            .ok_or_else(|| CcpdfError::Catalog(format!("no name for jurisdiction {jurisdiction}")))?;
        name.push(' ');
        name.push_str(&jurisdiction_name);

        let paragraphs = self.paragraphs(license_id, language_id)?;
        debug!(paragraphs = paragraphs.len(), "license text loaded");

        Ok(LicenseText {
            name,
            short_name,
            version,
            jurisdiction_short,
            paragraphs,
        })
    }
}
