// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spreadsheet side of the two-pass calibration handshake.
//
// `request` stores a measurement request for the printer; the host then
// prints the marker page, and `resolve` turns what the renderer measured
// into a stored calibration for the page setup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use ccpdf_core::PrinterId;
use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_print::calibration::measurement_request;
use ccpdf_print::{Calibration, LinkData, MeasuredMarkers, PageSetup};

use super::app_services::AppServices;

/// Page setup and the spreadsheet's own idea of where the markers are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSetup {
    pub horizontal: PageSetup,
    pub vertical: PageSetup,
    /// Spreadsheet `(x, y)` of the top-left marker's top-left corner.
    pub sheet_top_left: (f64, f64),
    /// Spreadsheet `(x, y)` of the bottom-right marker's bottom-right corner.
    pub sheet_bottom_right: (f64, f64),
}

impl CalibrationSetup {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Store a measurement request; the next document printed on `printer`
/// becomes the measurement pass.
pub fn request(services: &AppServices, printer: &PrinterId) -> Result<()> {
    measurement_request().save(&services.link_store()?, printer)?;
    info!(printer = %printer, "measurement requested");
    Ok(())
}

/// Calibration for the setup: the stored one if present, otherwise computed
/// from the measurement pass and stored.
#[instrument(skip_all, fields(printer = %printer))]
pub fn resolve(
    services: &AppServices,
    printer: &PrinterId,
    setup: &CalibrationSetup,
) -> Result<Calibration> {
    let settings = services.settings_store()?;
    if let Some(stored) = Calibration::load(&settings, &setup.horizontal, &setup.vertical)? {
        info!("stored calibration used");
        return Ok(stored);
    }

    let store = services.link_store()?;
    let measured = LinkData::load(&store, printer)?
        .ok_or_else(|| CcpdfError::CalibrationFailed("no measurement has been printed".into()))?;
    let markers = MeasuredMarkers::from_link_data(&measured)?;
    let calibration = Calibration::from_measurement(
        &setup.horizontal,
        &setup.vertical,
        &markers,
        setup.sheet_top_left,
        setup.sheet_bottom_right,
    )?;
    calibration.save(&settings, &setup.horizontal, &setup.vertical)?;
    LinkData::clean(&store, printer)?;
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::replay::{HostEvent, ReplayScript, replay};
    use ccpdf_bridge::stub::MemorySpool;
    use ccpdf_core::{DocumentSettings, Rect, Size};
    use ccpdf_render::{Advance, RunContent, TextRun};

    fn setup() -> CalibrationSetup {
        let axis = PageSetup {
            dpi: 600.0,
            start_margin: 0.75,
            end_margin: 0.75,
            center: false,
            font_size: 10,
            font_name: "Arial".into(),
        };
        CalibrationSetup {
            horizontal: axis.clone(),
            vertical: axis,
            sheet_top_left: (0.0, 0.0),
            sheet_bottom_right: (55.0, 55.0),
        }
    }

    fn marker(text: &str, rect: Rect) -> HostEvent {
        HostEvent::TextOut {
            run: TextRun {
                content: RunContent::Chars(text.into()),
                rect,
                advance: Advance::Fixed(rect.width()),
                font: None,
            },
        }
    }

    #[test]
    fn measured_markers_become_stored_calibration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::at(dir.path().to_path_buf()).expect("services");
        let printer = PrinterId::new("ccPDF");

        request(&services, &printer).expect("request");
        let script = ReplayScript {
            printer: printer.to_string(),
            settings: DocumentSettings::default(),
            page_size: Size::new(200, 200),
            fonts: Vec::new(),
            events: vec![
                HostEvent::StartDoc,
                HostEvent::StartPage,
                marker("a", Rect::new(10, 10, 20, 20)),
                marker("b", Rect::new(100, 100, 120, 120)),
                HostEvent::SendPage,
                HostEvent::EndDoc { aborted: false },
            ],
        };
        let mut spool = MemorySpool::new();
        replay(&services, &script, &mut spool).expect("measurement pass");
        assert!(spool.text().starts_with("%%File: :dropfile:\r\n"));

        let calibration = resolve(&services, &printer, &setup()).expect("resolve");
        assert_eq!(
            calibration.map_rect(0.0, 0.0, 55.0, 55.0, (200.0, 200.0)),
            Rect::new(10, 10, 120, 120)
        );
        assert_eq!(calibration.horizontal.fix_location(27.5, 200.0), 65);

        // Consumed; the stored record answers from now on.
        assert!(LinkData::load(&services.link_store().expect("store"), &printer)
            .expect("load")
            .is_none());
        assert_eq!(resolve(&services, &printer, &setup()).expect("again"), calibration);
    }

    #[test]
    fn resolve_without_measurement_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::at(dir.path().to_path_buf()).expect("services");
        let err = resolve(&services, &PrinterId::new("ccPDF"), &setup()).expect_err("missing");
        assert!(matches!(err, CcpdfError::CalibrationFailed(_)));
    }
}
