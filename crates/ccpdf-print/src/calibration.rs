// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping spreadsheet page positions to printer device units.
//
// The spreadsheet reports cell positions in its own (imprecise) page units.
// To place links exactly, a one-page measurement job is printed with two
// linked marker cells, the renderer records where their text really landed,
// and the two positions give a scale and offset per axis. Results are cached
// in a settings store keyed by the page setup, so the measurement only runs
// once per distinct setup.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{Rect, Size};

use crate::links::{LinkData, LinkRecord, LinkTarget};

/// Settings key under which calibration records live.
pub const SETTINGS_ROOT: &str = "Software\\ccpdf\\Excel Addin";

pub const TOP_LEFT_MARKER: &str = "a";
pub const TOP_LEFT_URL: &str = "http://topleft.com";
pub const BOTTOM_RIGHT_MARKER: &str = "b";
pub const BOTTOM_RIGHT_URL: &str = "http://bottomright.com";

/// Value names inside a calibration key.
const VALUE_FACTOR: &str = "Factor";
const VALUE_OFFSET: &str = "Offset";
const VALUE_FULL_SIZE: &str = "FullSize";
const VALUE_FORCE_DPI: &str = "ForceDPI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn prefix(self) -> &'static str {
        match self {
            Self::Horizontal => "Horz",
            Self::Vertical => "Vert",
        }
    }
}

/// Spreadsheet page setup along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub dpi: f64,
    pub start_margin: f64,
    pub end_margin: f64,
    /// Content is centered on the page along this axis.
    pub center: bool,
    /// Size and name of the workbook's normal style font.
    pub font_size: i32,
    pub font_name: String,
}

impl PageSetup {
    /// Identifies setups that print identically.
    pub fn signature(&self) -> String {
        format!(
            "{}{:.2}{:.2}{}{}{}",
            self.dpi as i64,
            self.start_margin,
            self.end_margin,
            u8::from(self.center),
            self.font_size,
            self.font_name
        )
    }

    /// Settings key holding the calibration of `axis` for this setup.
    pub fn settings_key(&self, axis: Axis) -> String {
        format!("{SETTINGS_ROOT}\\PD_{}{}", axis.prefix(), self.signature())
    }
}

// -- Settings store -----------------------------------------------------------

/// Named binary values grouped under hierarchical keys.
pub trait SettingsStore {
    fn get_value(&self, key: &str, name: &str) -> Result<Option<Vec<u8>>>;
    fn set_value(&self, key: &str, name: &str, value: &[u8]) -> Result<()>;
}

const CREATE_SETTINGS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT NOT NULL,
        name TEXT NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (key, name)
    )
"#;

fn db_err(context: &str, e: rusqlite::Error) -> CcpdfError {
    CcpdfError::Database(format!("{context}: {e}"))
}

/// Settings store backed by a SQLite database.
pub struct SqliteSettingsStore {
    conn: Connection,
}

impl SqliteSettingsStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| db_err("open", e))?;
        conn.execute_batch(CREATE_SETTINGS_SQL)
            .map_err(|e| db_err("create table", e))?;
        info!("settings database opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open in-memory", e))?;
        conn.execute_batch(CREATE_SETTINGS_SQL)
            .map_err(|e| db_err("create table", e))?;
        debug!("in-memory settings database opened");
        Ok(Self { conn })
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get_value(&self, key: &str, name: &str) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1 AND name = ?2",
                params![key, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_err("read setting", e))
    }

    fn set_value(&self, key: &str, name: &str, value: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, name, value) VALUES (?1, ?2, ?3)",
                params![key, name, value],
            )
            .map_err(|e| db_err("write setting", e))?;
        Ok(())
    }
}

// -- Per-axis calibration -------------------------------------------------------

/// Scale and offset mapping spreadsheet positions to device units on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCalibration {
    pub factor: f64,
    pub offset: i32,
    /// Full page size in device units.
    pub full_size: i32,
    pub center: bool,
    /// The requested DPI was unsupported and 300 was printed instead.
    pub force_dpi: bool,
}

impl AxisCalibration {
    /// Derive the mapping from one measured span.
    ///
    /// `device_*` are where the markers printed, `sheet_*` where the
    /// spreadsheet claims they are.
    pub fn from_data(
        setup: &PageSetup,
        device_end: i32,
        device_start: i32,
        sheet_end: f64,
        sheet_start: f64,
        full_size: i32,
    ) -> Result<Self> {
        let sheet_span = sheet_end - sheet_start;
        if sheet_span == 0.0 || !sheet_span.is_finite() {
            return Err(CcpdfError::CalibrationFailed(format!(
                "markers share a spreadsheet position ({sheet_start})"
            )));
        }
        let offset = if setup.center {
            (device_start + device_end) / 2
        } else {
            device_start
        };
        Ok(Self {
            factor: f64::from(device_end - device_start) / sheet_span,
            offset,
            full_size,
            center: setup.center,
            force_dpi: false,
        })
    }

    /// Device position of spreadsheet position `pos` on a page whose
    /// spreadsheet size is `full_page`. Truncates towards zero.
    pub fn fix_location(&self, pos: f64, full_page: f64) -> i32 {
        let pos = if self.center { pos - full_page / 2.0 } else { pos };
        (f64::from(self.offset) + pos * self.factor) as i32
    }

    /// Read a stored record; `None` when any required value is missing.
    pub fn read(store: &dyn SettingsStore, setup: &PageSetup, axis: Axis) -> Result<Option<Self>> {
        let key = setup.settings_key(axis);
        let (Some(factor), Some(offset), Some(full_size)) = (
            store.get_value(&key, VALUE_FACTOR)?,
            store.get_value(&key, VALUE_OFFSET)?,
            store.get_value(&key, VALUE_FULL_SIZE)?,
        ) else {
            return Ok(None);
        };
        let (Ok(factor), Ok(offset), Ok(full_size)) = (
            <[u8; 8]>::try_from(factor.as_slice()),
            <[u8; 4]>::try_from(offset.as_slice()),
            <[u8; 4]>::try_from(full_size.as_slice()),
        ) else {
            warn!(key = %key, "stored calibration has unexpected value sizes");
            return Ok(None);
        };
        let force_dpi = store
            .get_value(&key, VALUE_FORCE_DPI)?
            .is_some_and(|v| v.first() == Some(&1));

        Ok(Some(Self {
            factor: f64::from_le_bytes(factor),
            offset: i32::from_le_bytes(offset),
            full_size: i32::from_le_bytes(full_size),
            center: setup.center,
            force_dpi,
        }))
    }

    pub fn write(&self, store: &dyn SettingsStore, setup: &PageSetup, axis: Axis) -> Result<()> {
        let key = setup.settings_key(axis);
        store.set_value(&key, VALUE_FACTOR, &self.factor.to_le_bytes())?;
        store.set_value(&key, VALUE_OFFSET, &self.offset.to_le_bytes())?;
        store.set_value(&key, VALUE_FULL_SIZE, &self.full_size.to_le_bytes())?;
        store.set_value(&key, VALUE_FORCE_DPI, &[u8::from(self.force_dpi)])?;
        Ok(())
    }
}

// -- Measurement handshake ------------------------------------------------------

/// Link data for the one-page measurement job.
pub fn measurement_request() -> LinkData {
    let mut data = LinkData::new();
    data.add_text_link(1, TOP_LEFT_MARKER, 1, TOP_LEFT_URL, None);
    data.add_text_link(1, BOTTOM_RIGHT_MARKER, 1, BOTTOM_RIGHT_URL, None);
    data.set_test_page(true);
    data
}

/// Marker positions found by the renderer during a measurement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasuredMarkers {
    /// Left/top of the top-left marker.
    pub top_left: (i32, i32),
    /// Right/bottom of the bottom-right marker.
    pub bottom_right: (i32, i32),
    pub page_size: Size,
}

impl MeasuredMarkers {
    /// Validate the data returned by a measurement pass.
    pub fn from_link_data(data: &LinkData) -> Result<Self> {
        let fail = |why: &str| CcpdfError::CalibrationFailed(why.to_owned());
        if data.page_count() != 1 {
            return Err(fail(&format!("expected one measured page, got {}", data.page_count())));
        }
        let page = data
            .page_data(1)
            .ok_or_else(|| fail("measured data is not for page 1"))?;
        if page.links.len() != 2 {
            return Err(fail(&format!("expected two markers, got {}", page.links.len())));
        }

        let mut top_left = None;
        let mut bottom_right = None;
        for link in &page.links {
            let LinkRecord::Location {
                rect,
                target: LinkTarget::Url { url, .. },
            } = link
            else {
                return Err(fail("a marker was not located on the page"));
            };
            match url.as_str() {
                TOP_LEFT_URL => top_left = Some((rect.left, rect.top)),
                BOTTOM_RIGHT_URL => bottom_right = Some((rect.right, rect.bottom)),
                other => return Err(fail(&format!("unexpected marker link {other}"))),
            }
        }

        match (top_left, bottom_right) {
            (Some(top_left), Some(bottom_right)) => Ok(Self {
                top_left,
                bottom_right,
                page_size: page.size,
            }),
            _ => Err(fail("a marker was measured twice")),
        }
    }
}

/// Calibration of both axes for one page setup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub horizontal: AxisCalibration,
    pub vertical: AxisCalibration,
}

impl Calibration {
    /// Combine measured marker positions with the spreadsheet's claimed
    /// positions of the same markers, given as `(x, y)`.
    pub fn from_measurement(
        horizontal: &PageSetup,
        vertical: &PageSetup,
        markers: &MeasuredMarkers,
        sheet_top_left: (f64, f64),
        sheet_bottom_right: (f64, f64),
    ) -> Result<Self> {
        let calibration = Self {
            horizontal: AxisCalibration::from_data(
                horizontal,
                markers.bottom_right.0,
                markers.top_left.0,
                sheet_bottom_right.0,
                sheet_top_left.0,
                markers.page_size.cx,
            )?,
            vertical: AxisCalibration::from_data(
                vertical,
                markers.bottom_right.1,
                markers.top_left.1,
                sheet_bottom_right.1,
                sheet_top_left.1,
                markers.page_size.cy,
            )?,
        };
        info!(
            x_factor = calibration.horizontal.factor,
            y_factor = calibration.vertical.factor,
            "page calibration measured"
        );
        Ok(calibration)
    }

    /// Stored calibration for the setups, if both axes are known.
    pub fn load(store: &dyn SettingsStore, horizontal: &PageSetup, vertical: &PageSetup) -> Result<Option<Self>> {
        let horz = AxisCalibration::read(store, horizontal, Axis::Horizontal)?;
        let vert = AxisCalibration::read(store, vertical, Axis::Vertical)?;
        Ok(horz.zip(vert).map(|(horizontal, vertical)| Self {
            horizontal,
            vertical,
        }))
    }

    pub fn save(&self, store: &dyn SettingsStore, horizontal: &PageSetup, vertical: &PageSetup) -> Result<()> {
        self.horizontal.write(store, horizontal, Axis::Horizontal)?;
        self.vertical.write(store, vertical, Axis::Vertical)?;
        debug!("page calibration stored");
        Ok(())
    }

    /// Device rectangle of a spreadsheet area on a page of spreadsheet size
    /// `sheet_page` (width, height).
    pub fn map_rect(&self, left: f64, top: f64, right: f64, bottom: f64, sheet_page: (f64, f64)) -> Rect {
        Rect::new(
            self.horizontal.fix_location(left, sheet_page.0),
            self.vertical.fix_location(top, sheet_page.1),
            self.horizontal.fix_location(right, sheet_page.0),
            self.vertical.fix_location(bottom, sheet_page.1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(center: bool) -> PageSetup {
        PageSetup {
            dpi: 600.0,
            start_margin: 0.7,
            end_margin: 0.75,
            center,
            font_size: 10,
            font_name: "Arial".into(),
        }
    }

    fn measured() -> LinkData {
        let mut data = LinkData::new();
        data.add_url_link(1, Rect::new(10, 10, 20, 20), TOP_LEFT_URL, None);
        data.add_url_link(1, Rect::new(100, 100, 120, 120), BOTTOM_RIGHT_URL, None);
        data.set_page_size(1, Size::new(200, 200));
        data
    }

    #[test]
    fn signature_formats_like_settings_key() {
        assert_eq!(setup(true).signature(), "6000.700.75110Arial");
        assert_eq!(
            setup(false).settings_key(Axis::Vertical),
            "Software\\ccpdf\\Excel Addin\\PD_Vert6000.700.75010Arial"
        );
    }

    #[test]
    fn markers_map_back_to_measured_span() {
        let markers = MeasuredMarkers::from_link_data(&measured()).expect("markers");
        assert_eq!(markers.top_left, (10, 10));
        assert_eq!(markers.bottom_right, (120, 120));

        let calibration =
            Calibration::from_measurement(&setup(false), &setup(false), &markers, (0.0, 0.0), (55.0, 55.0))
                .expect("calibration");
        let axis = calibration.horizontal;
        assert_eq!(axis.full_size, 200);
        assert!((axis.fix_location(0.0, 100.0) - 10).abs() <= 1);
        assert!((axis.fix_location(55.0, 100.0) - 120).abs() <= 1);
        assert_eq!(axis.fix_location(27.5, 100.0), 65);
    }

    #[test]
    fn centered_axis_measures_from_page_middle() {
        let axis = AxisCalibration::from_data(&setup(true), 120, 10, 55.0, 0.0, 200).expect("axis");
        assert_eq!(axis.offset, 65);
        assert_eq!(axis.fix_location(50.0, 100.0), 65);
        assert_eq!(axis.fix_location(60.0, 100.0), 85);
    }

    #[test]
    fn identical_sheet_positions_fail() {
        let err = AxisCalibration::from_data(&setup(false), 120, 10, 5.0, 5.0, 200).expect_err("zero span");
        assert!(matches!(err, CcpdfError::CalibrationFailed(_)));
    }

    #[test]
    fn wrong_marker_count_is_inconsistent() {
        let mut data = measured();
        data.add_url_link(1, Rect::default(), TOP_LEFT_URL, None);
        assert!(MeasuredMarkers::from_link_data(&data).is_err());

        let mut two_pages = measured();
        two_pages.set_page_size(2, Size::new(200, 200));
        assert!(MeasuredMarkers::from_link_data(&two_pages).is_err());
    }

    #[test]
    fn duplicate_marker_is_inconsistent() {
        let mut data = LinkData::new();
        data.add_url_link(1, Rect::new(10, 10, 20, 20), TOP_LEFT_URL, None);
        data.add_url_link(1, Rect::new(10, 10, 20, 20), TOP_LEFT_URL, None);
        assert!(MeasuredMarkers::from_link_data(&data).is_err());
    }

    #[test]
    fn measurement_request_marks_test_page() {
        let request = measurement_request();
        assert!(request.is_test_page());
        let page = request.page_data(1).expect("page 1");
        assert_eq!(page.links.len(), 2);
        assert!(page.has_text_links());
    }

    #[test]
    fn calibration_persists_per_setup() {
        let store = SqliteSettingsStore::open_in_memory().expect("open");
        let (horz, vert) = (setup(false), setup(true));
        assert!(Calibration::load(&store, &horz, &vert).expect("load").is_none());

        let mut calibration = Calibration {
            horizontal: AxisCalibration::from_data(&horz, 120, 10, 55.0, 0.0, 200).expect("horz"),
            vertical: AxisCalibration::from_data(&vert, 300, 20, 70.0, 0.0, 400).expect("vert"),
        };
        calibration.vertical.force_dpi = true;
        calibration.save(&store, &horz, &vert).expect("save");

        let loaded = Calibration::load(&store, &horz, &vert)
            .expect("load")
            .expect("stored");
        assert_eq!(loaded, calibration);

        let other = PageSetup {
            font_size: 11,
            ..setup(false)
        };
        assert!(Calibration::load(&store, &other, &vert).expect("load").is_none());
    }
}
