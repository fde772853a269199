// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page link records for one document.
//
// Pages are numbered from 1, as the driver counts them. The whole structure is
// handed between processes through a `LinkStore`: the add-in saves it before
// printing, the renderer loads it at document start and, on a measurement
// pass, saves it back with the rectangles it found.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::{Point, PrinterId, Rect, Size};

use crate::store::LinkStore;

/// Version of the serialized link data layout.
const STORE_FORMAT_VERSION: u32 = 1;

/// Where a link leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    /// External URL with an optional title shown by viewers.
    Url { url: String, title: Option<String> },
    /// Jump inside the document to `offset` on `page`.
    Page { page: u32, offset: Point },
}

/// One link on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkRecord {
    /// Link over a known device rectangle.
    Location { rect: Rect, target: LinkTarget },
    /// Link over the `repeat`-th occurrence of `text` in the page text.
    Text {
        text: String,
        repeat: u32,
        url: String,
        title: Option<String>,
    },
}

impl LinkRecord {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Links of one page plus the page's pixel dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinkSet {
    pub links: Vec<LinkRecord>,
    pub size: Size,
}

impl PageLinkSet {
    /// Text links need the page text captured while rendering.
    pub fn has_text_links(&self) -> bool {
        self.links.iter().any(LinkRecord::is_text)
    }
}

/// Link data of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pages: BTreeMap<u32, PageLinkSet>,
    /// Set while the document is a measurement pass.
    test_page: bool,
}

#[derive(Serialize, Deserialize)]
struct StoredLinkData {
    version: u32,
    data: LinkData,
}

impl LinkData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, page: u32, record: LinkRecord) {
        self.pages.entry(page).or_default().links.push(record);
    }

    pub fn add_url_link(&mut self, page: u32, rect: Rect, url: &str, title: Option<&str>) {
        self.add_link(
            page,
            LinkRecord::Location {
                rect,
                target: LinkTarget::Url {
                    url: url.to_owned(),
                    title: title.map(str::to_owned),
                },
            },
        );
    }

    pub fn add_jump_link(&mut self, page: u32, rect: Rect, to_page: u32, offset: Point) {
        self.add_link(
            page,
            LinkRecord::Location {
                rect,
                target: LinkTarget::Page {
                    page: to_page,
                    offset,
                },
            },
        );
    }

    pub fn add_text_link(&mut self, page: u32, text: &str, repeat: u32, url: &str, title: Option<&str>) {
        self.add_link(
            page,
            LinkRecord::Text {
                text: text.to_owned(),
                repeat,
                url: url.to_owned(),
                title: title.map(str::to_owned),
            },
        );
    }

    pub fn page_data(&self, page: u32) -> Option<&PageLinkSet> {
        self.pages.get(&page)
    }

    /// Number of pages that carry links or a recorded size.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_data(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn set_page_size(&mut self, page: u32, size: Size) {
        self.pages.entry(page).or_default().size = size;
    }

    pub fn is_test_page(&self) -> bool {
        self.test_page
    }

    pub fn set_test_page(&mut self, test_page: bool) {
        self.test_page = test_page;
    }

    // -- Persistence ----------------------------------------------------------

    /// Load the data stored for `printer`, if any.
    #[instrument(skip_all, fields(printer = %printer))]
    pub fn load(store: &dyn LinkStore, printer: &PrinterId) -> Result<Option<Self>> {
        let Some(bytes) = store.read(printer)? else {
            debug!("no link data stored");
            return Ok(None);
        };
        let stored: StoredLinkData = serde_json::from_slice(&bytes)
            .map_err(|e| CcpdfError::StoreRoundTrip(format!("decode: {e}")))?;
        if stored.version != STORE_FORMAT_VERSION {
            return Err(CcpdfError::StoreRoundTrip(format!(
                "unsupported link data version {}",
                stored.version
            )));
        }
        info!(
            pages = stored.data.page_count(),
            test_page = stored.data.test_page,
            "link data loaded"
        );
        Ok(Some(stored.data))
    }

    /// Persist for the next process. Returns once the store reports the write durable.
    #[instrument(skip_all, fields(printer = %printer, pages = self.page_count()))]
    pub fn save(&self, store: &dyn LinkStore, printer: &PrinterId) -> Result<()> {
        let stored = StoredLinkData {
            version: STORE_FORMAT_VERSION,
            data: self.clone(),
        };
        let bytes = serde_json::to_vec(&stored)?;
        store.write(printer, &bytes)?;
        info!("link data saved");
        Ok(())
    }

    /// Remove whatever is stored for `printer`.
    pub fn clean(store: &dyn LinkStore, printer: &PrinterId) -> Result<()> {
        store.remove(printer)?;
        debug!(printer = %printer, "link data removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLinkStore;

    fn printer() -> PrinterId {
        PrinterId::new("ccPDF")
    }

    #[test]
    fn save_load_reproduces_records() {
        let mut data = LinkData::new();
        data.add_url_link(1, Rect::new(1, 2, 3, 4), "http://a.example", Some("A"));
        data.add_jump_link(1, Rect::new(5, 6, 7, 8), 3, Point::new(0, 120));
        data.add_url_link(2, Rect::new(0, 0, 10, 10), "http://b.example", None);
        data.add_text_link(1, "read more", 2, "http://c.example", None);
        data.add_text_link(2, "b", 1, "http://d.example", Some("D"));
        data.set_page_size(1, Size::new(4960, 7016));
        data.set_test_page(true);

        let store = MemoryLinkStore::new();
        data.save(&store, &printer()).expect("save");
        let loaded = LinkData::load(&store, &printer())
            .expect("load")
            .expect("stored data");

        assert_eq!(loaded, data);
        assert_eq!(loaded.page_data(1).expect("page 1").links.len(), 3);
        assert!(loaded.is_test_page());
    }

    #[test]
    fn load_without_data_is_none() {
        let store = MemoryLinkStore::new();
        assert!(LinkData::load(&store, &printer()).expect("load").is_none());
    }

    #[test]
    fn corrupt_data_is_round_trip_failure() {
        let store = MemoryLinkStore::new();
        store.write(&printer(), b"{not json").expect("write");
        let err = LinkData::load(&store, &printer()).expect_err("corrupt");
        assert!(matches!(err, CcpdfError::StoreRoundTrip(_)));
    }

    #[test]
    fn clean_removes_data() {
        let store = MemoryLinkStore::new();
        LinkData::new().save(&store, &printer()).expect("save");
        LinkData::clean(&store, &printer()).expect("clean");
        assert!(LinkData::load(&store, &printer()).expect("load").is_none());
    }

    #[test]
    fn page_size_alone_counts_as_data() {
        let mut data = LinkData::new();
        assert!(!data.has_data());
        data.set_page_size(1, Size::new(100, 200));
        assert!(data.has_data());
        assert!(!data.page_data(1).expect("page").has_text_links());
    }
}
