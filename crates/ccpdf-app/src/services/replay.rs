// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replays recorded host callbacks through a document renderer.
//
// A script is JSON: the printer, job settings, page size, the font faces
// the glyph source knows (printable ASCII tables), and the ordered events:
//
//   { "event": "start_doc" }
//   { "event": "start_page" }
//   { "event": "text_out", "run": { "content": { "Chars": "see http://a.b" },
//     "rect": {...}, "advance": { "Fixed": 40 } } }
//   { "event": "link", "rect": {...}, "url": "http://a.b", "title": "A" }
//   { "event": "escape", "code": 1719079339, "data_hex": "" }
//   { "event": "send_page" }
//   { "event": "end_doc", "aborted": false }

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use ccpdf_bridge::SpoolWriter;
use ccpdf_bridge::stub::TableGlyphSource;
use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{DocumentSettings, PrinterId, Rect, Size};
use ccpdf_render::escape::ESCAPE_LINK_DATA;
use ccpdf_render::{DocumentRenderer, EscapeLink, EscapeResponse, TextRun};

use super::app_services::AppServices;

pub const DEFAULT_PRINTER: &str = "ccPDF";

fn default_printer() -> String {
    DEFAULT_PRINTER.to_owned()
}

/// One host callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    StartDoc,
    StartPage,
    TextOut {
        run: TextRun,
    },
    /// Raw escape with a hex payload.
    Escape {
        code: u32,
        #[serde(default)]
        data_hex: String,
    },
    /// Link escape, encoded the way an application would send it.
    Link {
        rect: Rect,
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
    SendPage,
    EndDoc {
        #[serde(default)]
        aborted: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_printer")]
    pub printer: String,
    #[serde(default)]
    pub settings: DocumentSettings,
    pub page_size: Size,
    #[serde(default)]
    pub fonts: Vec<String>,
    pub events: Vec<HostEvent>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub pages: u32,
    pub rejected_escapes: usize,
}

#[instrument(skip_all, fields(printer = %script.printer, events = script.events.len()))]
pub fn replay(
    services: &AppServices,
    script: &ReplayScript,
    spool: &mut dyn SpoolWriter,
) -> Result<ReplaySummary> {
    let glyphs = script
        .fonts
        .iter()
        .fold(TableGlyphSource::new(), |source, face| source.with_ascii_face(face));
    let mut doc = DocumentRenderer::new(
        PrinterId::new(&script.printer),
        script.settings.clone(),
        services.config().clone(),
        Box::new(glyphs),
        Box::new(services.link_store()?),
    );
    if let Some(catalog) = services.license_catalog() {
        doc = doc.with_catalog(Box::new(catalog));
    }

    let mut rejected_escapes = 0;
    for event in &script.events {
        match event {
            HostEvent::StartDoc => doc.start_doc(spool)?,
            HostEvent::StartPage => doc.start_page()?,
            HostEvent::TextOut { run } => doc.text_out(run)?,
            HostEvent::Escape { code, data_hex } => {
                let data = hex::decode(data_hex)
                    .map_err(|e| CcpdfError::MalformedEscape(format!("escape payload: {e}")))?;
                if doc.escape(*code, &data) == EscapeResponse::Rejected {
                    rejected_escapes += 1;
                }
            }
            HostEvent::Link { rect, url, title } => {
                let link = EscapeLink {
                    rect: *rect,
                    url: url.clone(),
                    title: title.clone(),
                };
                if doc.escape(ESCAPE_LINK_DATA, &link.encode()) == EscapeResponse::Rejected {
                    rejected_escapes += 1;
                }
            }
            HostEvent::SendPage => doc.send_page(spool, script.page_size)?,
            HostEvent::EndDoc { aborted } => doc.end_doc(spool, script.page_size, *aborted)?,
        }
    }

    let summary = ReplaySummary {
        pages: doc.page(),
        rejected_escapes,
    };
    info!(pages = summary.pages, rejected = rejected_escapes, "replay finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpdf_bridge::stub::MemorySpool;

    const SCRIPT: &str = r#"{
        "page_size": { "cx": 4960, "cy": 7016 },
        "fonts": ["Arial"],
        "events": [
            { "event": "start_doc" },
            { "event": "start_page" },
            { "event": "text_out", "run": {
                "content": { "Chars": "Visit https://example.org today" },
                "rect": { "left": 400, "top": 400, "right": 1640, "bottom": 440 },
                "advance": { "Fixed": 40 } } },
            { "event": "link", "rect": { "left": 1, "top": 2, "right": 3, "bottom": 4 },
              "url": "http://escape.example" },
            { "event": "escape", "code": 1719079338, "data_hex": "00ff" },
            { "event": "send_page" },
            { "event": "end_doc" }
        ]
    }"#;

    #[test]
    fn script_replays_into_postscript() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::at(dir.path().to_path_buf()).expect("services");
        let script: ReplayScript = serde_json::from_str(SCRIPT).expect("script");
        assert_eq!(script.printer, DEFAULT_PRINTER);

        let mut spool = MemorySpool::new();
        let summary = replay(&services, &script, &mut spool).expect("replay");
        assert_eq!(
            summary,
            ReplaySummary {
                pages: 1,
                rejected_escapes: 1
            }
        );

        let out = spool.text();
        assert!(out.contains("/URI (http://escape.example)"));
        assert!(out.contains("/Rect [640 400 1400 440]"));
        assert!(out.contains("/URI (https://example.org)"));
    }

    #[test]
    fn out_of_order_script_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::at(dir.path().to_path_buf()).expect("services");
        let script = ReplayScript {
            printer: DEFAULT_PRINTER.into(),
            settings: DocumentSettings::default(),
            page_size: Size::new(100, 100),
            fonts: Vec::new(),
            events: vec![HostEvent::SendPage],
        };
        let err = replay(&services, &script, &mut MemorySpool::new()).expect_err("invalid");
        assert!(matches!(err, CcpdfError::InvalidTransition { .. }));
    }
}
