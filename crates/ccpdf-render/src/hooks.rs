// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document renderer: the driver hook callbacks as one state machine.
//
// The host calls, in order: start_doc, then per page start_page, any number
// of text_out / escape, send_page, and finally end_doc. Text is captured
// only when something on the page needs it (auto URLs, text links or a
// measurement pass). At page send, links are resolved against the captured
// text and written as pdfmark directives ahead of the page's showpage.
//
// Two passes share one printer: a measurement pass (link data marked as a
// test page) stores where the requested phrases were found; the real pass
// consumes stored link data and removes it when the document ends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use ccpdf_bridge::stub::DscPageHost;
use ccpdf_bridge::{GlyphSource, LicenseCatalog, PageHost, SpoolWriter};
use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{DocumentSettings, FontDescriptor, PrinterId, Rect, RenderConfig, Size};
use ccpdf_print::{LinkData, LinkRecord, LinkStore, LinkTarget, PageLinkSet};

use crate::escape::{
    ESCAPE_DISABLE_AUTO_URL, ESCAPE_LINK_DATA, EscapeLink, EscapeResponse, QUERYESCSUPPORT,
    is_supported,
};
use crate::glyph::GlyphTranslator;
use crate::license_page::LicensePage;
use crate::postscript::image::dpi_multiplier;
use crate::postscript::{
    LICENSE_DESTINATION, PsImage, PsWriter, internal_link, jump_box, rights_info, url_box,
};
use crate::text::{Advance, TextArea, split_phrase};

/// Output name that tells the converter to discard a measurement pass.
pub const DROP_FILE_NAME: &str = ":dropfile:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    NotStarted,
    DocStarted,
    PageStarted,
    PageSent,
    DocEnded,
}

/// Characters of a text draw call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunContent {
    Chars(String),
    /// Glyph indices of `TextRun::font`.
    Glyphs(Vec<u16>),
}

/// One text draw call as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: RunContent,
    /// Background rectangle of the run.
    pub rect: Rect,
    pub advance: Advance,
    #[serde(default)]
    pub font: Option<FontDescriptor>,
}

pub struct DocumentRenderer {
    printer: PrinterId,
    settings: DocumentSettings,
    config: RenderConfig,
    glyphs: Box<dyn GlyphSource>,
    translator: Arc<GlyphTranslator>,
    store: Box<dyn LinkStore>,
    catalog: Option<Box<dyn LicenseCatalog>>,
    /// Frames the license page, which the host never starts itself.
    pages: Box<dyn PageHost>,

    state: DocumentState,
    page: u32,
    links: Option<LinkData>,
    /// Stored link data was consumed and must be removed at document end.
    used_data: bool,
    need_text: bool,
    auto_urls: bool,
    text: TextArea,
    /// Links from escapes and resolved searches, emitted at page send.
    pending: Vec<EscapeLink>,
}

impl DocumentRenderer {
    pub fn new(
        printer: PrinterId,
        settings: DocumentSettings,
        config: RenderConfig,
        glyphs: Box<dyn GlyphSource>,
        store: Box<dyn LinkStore>,
    ) -> Self {
        let auto_urls = settings.auto_urls;
        Self {
            printer,
            settings,
            config,
            glyphs,
            translator: Arc::new(GlyphTranslator::new()),
            store,
            catalog: None,
            pages: Box::new(DscPageHost::new()),
            state: DocumentState::NotStarted,
            page: 0,
            links: None,
            used_data: false,
            need_text: false,
            auto_urls,
            text: TextArea::new(),
            pending: Vec::new(),
        }
    }

    /// Source of license page text. Without one no license page is written.
    pub fn with_catalog(mut self, catalog: Box<dyn LicenseCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Base driver page calls used for the license page.
    pub fn with_page_host(mut self, pages: Box<dyn PageHost>) -> Self {
        self.pages = pages;
        self
    }

    /// Share a glyph cache with other renderers of the process.
    pub fn with_translator(mut self, translator: Arc<GlyphTranslator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Current page, counted from 1.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn needs_text(&self) -> bool {
        self.need_text
    }

    pub fn text(&self) -> &TextArea {
        &self.text
    }

    fn expect_state(&self, event: &'static str, allowed: &[DocumentState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CcpdfError::InvalidTransition {
                event,
                state: format!("{:?}", self.state),
            })
        }
    }

    fn links_need_text(&self) -> bool {
        self.links.as_ref().is_some_and(|links| {
            links.is_test_page()
                || links
                    .page_data(self.page)
                    .is_some_and(PageLinkSet::has_text_links)
        })
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Load link data for the printer and write the document header.
    #[instrument(skip_all, fields(printer = %self.printer))]
    pub fn start_doc(&mut self, spool: &mut dyn SpoolWriter) -> Result<()> {
        self.expect_state("start_doc", &[DocumentState::NotStarted])?;

        self.need_text = self.auto_urls;
        let mut filename = self.settings.output_filename.clone();

        self.links = match LinkData::load(self.store.as_ref(), &self.printer) {
            Ok(links) => links,
            Err(e @ CcpdfError::StoreRoundTrip(_)) => {
                warn!(error = %e, "unreadable link data removed");
                LinkData::clean(self.store.as_ref(), &self.printer)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        if self.links.as_ref().is_some_and(|links| !links.has_data()) {
            debug!("empty link data removed");
            LinkData::clean(self.store.as_ref(), &self.printer)?;
            self.links = None;
        }
        if let Some(links) = &mut self.links {
            self.auto_urls = false;
            if links.is_test_page() {
                if links.page_count() != 1 {
                    warn!(pages = links.page_count(), "measurement request spans several pages; ignored");
                    links.set_test_page(false);
                } else {
                    self.need_text = true;
                    filename = Some(DROP_FILE_NAME.to_owned());
                }
            }
        }

        let mut out = PsWriter::new(spool);
        if let Some(name) = filename.filter(|name| !name.is_empty()) {
            out.write(&format!("%%File: {name}\r\n"))?;
            if self.settings.auto_open {
                out.write(if self.settings.create_as_temp {
                    "%%CreateAsTemp\r\n"
                } else {
                    "%%FileAutoOpen\r\n"
                })?;
            }
        }

        self.state = DocumentState::DocStarted;
        info!(
            link_data = self.links.is_some(),
            measurement = self.links.as_ref().is_some_and(LinkData::is_test_page),
            auto_urls = self.auto_urls,
            "document started"
        );
        Ok(())
    }

    pub fn start_page(&mut self) -> Result<()> {
        self.expect_state(
            "start_page",
            &[DocumentState::DocStarted, DocumentState::PageSent],
        )?;
        self.page += 1;
        self.text.clear();
        if self.links.is_some() {
            self.need_text = self.links_need_text();
        }
        self.state = DocumentState::PageStarted;
        debug!(page = self.page, need_text = self.need_text, "page started");
        Ok(())
    }

    /// Capture the text of one draw call.
    ///
    /// Runs that cannot be read (no font, untranslatable font, positions not
    /// matching the characters) are left out of the page text.
    pub fn text_out(&mut self, run: &TextRun) -> Result<()> {
        self.expect_state("text_out", &[DocumentState::PageStarted])?;
        if !self.need_text {
            return Ok(());
        }

        let text = match &run.content {
            RunContent::Chars(text) => text.clone(),
            RunContent::Glyphs(glyphs) => {
                let Some(font) = &run.font else {
                    debug!("glyph run without font skipped");
                    return Ok(());
                };
                let Some(map) = self.translator.font_translation(self.glyphs.as_ref(), font)
                else {
                    return Ok(());
                };
                map.translate(glyphs)
            }
        };
        if text.is_empty() {
            return Ok(());
        }
        if let Some(placed) = run.advance.capacity() {
            let count = text.chars().count();
            if placed != count {
                warn!(placed, count, "run positions do not match its characters; skipped");
                return Ok(());
            }
        }

        trace!(text = %text, "text captured");
        self.text.add_run(&text, run.rect, &run.advance);
        Ok(())
    }

    /// Handle an application escape. Never fails: bad payloads are rejected.
    pub fn escape(&mut self, code: u32, data: &[u8]) -> EscapeResponse {
        match code {
            QUERYESCSUPPORT => match <[u8; 4]>::try_from(data) {
                Ok(bytes) if is_supported(u32::from_le_bytes(bytes)) => EscapeResponse::Accepted,
                _ => EscapeResponse::Forward,
            },
            ESCAPE_LINK_DATA => match EscapeLink::decode(data) {
                Ok(link) => {
                    debug!(url = %link.url, "link queued by application");
                    self.pending.push(link);
                    EscapeResponse::Accepted
                }
                Err(e) => {
                    warn!(error = %e, "link escape rejected");
                    EscapeResponse::Rejected
                }
            },
            ESCAPE_DISABLE_AUTO_URL => {
                self.auto_urls = false;
                self.need_text = self.links_need_text();
                debug!("automatic URL detection disabled");
                EscapeResponse::Accepted
            }
            _ => EscapeResponse::Forward,
        }
    }

    /// Resolve and write the page's links, then its overlays.
    #[instrument(skip_all, fields(page = self.page))]
    pub fn send_page(&mut self, spool: &mut dyn SpoolWriter, page_size: Size) -> Result<()> {
        self.expect_state("send_page", &[DocumentState::PageStarted])?;
        let mut out = PsWriter::new(spool);
        let mut boxes = std::mem::take(&mut self.pending);

        if let Some(links) = self.links.as_ref().filter(|links| links.has_data()) {
            self.used_data = true;
            if links.is_test_page() {
                if self.text.is_empty() {
                    warn!("measurement page has no text");
                    self.used_data = false;
                } else if self.page == 1 {
                    let measured = measure(&mut self.text, links, page_size);
                    measured.save(self.store.as_ref(), &self.printer)?;
                    self.used_data = false;
                }
            } else if let Some(page_links) = links.page_data(self.page) {
                self.text.init_search();
                for link in &page_links.links {
                    match link {
                        LinkRecord::Location {
                            rect,
                            target: LinkTarget::Page { page, offset },
                        } => out.write(&internal_link(*rect, *page, offset.x, offset.y, None))?,
                        LinkRecord::Location {
                            rect,
                            target: LinkTarget::Url { url, title },
                        } => boxes.push(EscapeLink {
                            rect: *rect,
                            url: url.clone(),
                            title: title.clone(),
                        }),
                        LinkRecord::Text {
                            text,
                            repeat,
                            url,
                            title,
                        } => {
                            let words = split_phrase(text);
                            match self.text.search_for_repeat(&words, *repeat) {
                                Some(rect) => boxes.push(EscapeLink {
                                    rect,
                                    url: url.clone(),
                                    title: title.clone(),
                                }),
                                None => debug!(phrase = %text, "text link not found on page"),
                            }
                        }
                    }
                }
            }
        } else if self.auto_urls {
            self.text.init_url_search();
            while let Some(found) = self.text.search_for_url() {
                boxes.push(EscapeLink {
                    rect: found.rect,
                    url: found.url,
                    title: None,
                });
            }
        }
        self.text.clear();

        for link in &boxes {
            out.write(&url_box(link.rect, &link.url, link.title.as_deref()))?;
        }
        if self.page == 1 && self.settings.set_properties {
            if let Some(rights) = rights_info(&self.settings.license) {
                out.write(&rights)?;
            }
        }
        self.write_badge(&mut out, page_size)?;

        self.state = DocumentState::PageSent;
        debug!(links = boxes.len(), "page sent");
        Ok(())
    }

    fn write_badge(&self, out: &mut PsWriter<'_>, page_size: Size) -> Result<()> {
        let info = &self.settings.license;
        let first = self.page == 1;
        let Some(file) = info.license.badge_file() else {
            return Ok(());
        };
        if self.settings.location.placement_for(first).is_none() {
            return Ok(());
        }
        let badge = match PsImage::open(self.config.image_dir.join(file)) {
            Ok(badge) => badge,
            Err(e) => {
                warn!(error = %e, "license badge skipped");
                return Ok(());
            }
        };

        let size = badge.scaled_size(dpi_multiplier(self.settings.print_quality_dpi, None));
        let Some(at) = self.settings.location.location_for_page(first, page_size, size) else {
            return Ok(());
        };
        let rect = Rect::new(at.x, at.y, at.x + size.cx, at.y + size.cy);
        out.write(&badge.render(rect))?;
        if info.license.has_license_page() {
            out.write(&jump_box(rect, LICENSE_DESTINATION, None))?;
        } else if !info.uri.is_empty() {
            out.write(&url_box(rect, &info.uri, None))?;
        }
        Ok(())
    }

    /// Finish the document: remove consumed link data and, unless aborted,
    /// append the license page.
    #[instrument(skip_all, fields(printer = %self.printer, aborted = aborted))]
    pub fn end_doc(
        &mut self,
        spool: &mut dyn SpoolWriter,
        page_size: Size,
        aborted: bool,
    ) -> Result<()> {
        self.expect_state(
            "end_doc",
            &[
                DocumentState::DocStarted,
                DocumentState::PageStarted,
                DocumentState::PageSent,
            ],
        )?;
        self.state = DocumentState::DocEnded;
        self.text.clear();
        self.pending.clear();
        if let Some(translator) = Arc::get_mut(&mut self.translator) {
            translator.clear();
        }

        if self.used_data {
            LinkData::clean(self.store.as_ref(), &self.printer)?;
        }

        let info = &self.settings.license;
        if aborted || !info.license.has_license_page() {
            info!(pages = self.page, "document ended");
            return Ok(());
        }
        let Some(catalog) = &self.catalog else {
            warn!("no license catalog; license page skipped");
            return Ok(());
        };
        let text = catalog.license_text(info, self.config.language_id)?;
        self.page += 1;
        self.pages.start_page(spool, self.page)?;
        LicensePage {
            text: &text,
            page_size,
            dpi: self.settings.print_quality_dpi,
            config: &self.config,
        }
        .render(&mut PsWriter::new(spool))?;
        self.pages.send_page(spool)?;

        info!(pages = self.page, "document ended with license page");
        Ok(())
    }
}

/// Locate each requested phrase of a measurement request on the first page.
fn measure(text: &mut TextArea, request: &LinkData, page_size: Size) -> LinkData {
    let mut measured = LinkData::new();
    measured.set_test_page(true);
    if let Some(set) = request.page_data(1) {
        for link in &set.links {
            if let LinkRecord::Text {
                text: phrase,
                repeat,
                url,
                ..
            } = link
            {
                text.init_search();
                match text.search_for_repeat(&[phrase.as_str()], *repeat) {
                    Some(rect) => measured.add_url_link(1, rect, url, None),
                    None => warn!(phrase = %phrase, "measurement marker not found"),
                }
            }
        }
    }
    measured.set_page_size(1, page_size);
    measured
}
