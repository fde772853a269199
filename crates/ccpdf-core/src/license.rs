// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// License selection attached to a print job, where its badge goes on each
// page, and the license text returned by a license catalog.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Size};

/// Base URL of the Creative Commons license deeds.
pub const DEED_BASE_URL: &str = "http://creativecommons.org/licenses/";

/// What derivative works a Creative Commons license allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modification {
    Allowed,
    ShareAlike,
    NoDerivatives,
}

impl Modification {
    /// Value of the `derivs` column in the license catalog.
    pub fn code(self) -> i64 {
        match self {
            Self::Allowed => 0,
            Self::ShareAlike => 1,
            Self::NoDerivatives => 2,
        }
    }
}

/// Sampling license flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingKind {
    Sampling,
    SamplingPlus,
    NonCommercialSamplingPlus,
}

impl SamplingKind {
    pub fn code(self) -> i64 {
        match self {
            Self::Sampling => 0,
            Self::SamplingPlus => 1,
            Self::NonCommercialSamplingPlus => 2,
        }
    }
}

/// The license a document is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum License {
    #[default]
    None,
    CreativeCommons {
        commercial_use: bool,
        modification: Modification,
    },
    Sampling(SamplingKind),
    DevelopingNations,
    PublicDomain,
}

impl License {
    /// Licenses that get a synthesized license page at the end of the document.
    pub fn has_license_page(&self) -> bool {
        match self {
            Self::CreativeCommons { .. } | Self::Sampling(_) | Self::DevelopingNations => true,
            Self::None | Self::PublicDomain => false,
        }
    }

    /// `mode` column used when looking the license up in the catalog.
    pub fn catalog_mode(&self) -> Option<i64> {
        match self {
            Self::CreativeCommons { .. } => Some(0),
            Self::Sampling(_) => Some(1),
            Self::DevelopingNations => Some(2),
            Self::None | Self::PublicDomain => None,
        }
    }

    /// File name of the badge image drawn on pages, if the license has one.
    pub fn badge_file(&self) -> Option<&'static str> {
        let name = match self {
            Self::CreativeCommons {
                commercial_use: true,
                modification,
            } => match modification {
                Modification::Allowed => "by.png",
                Modification::ShareAlike => "by-sa.png",
                Modification::NoDerivatives => "by-nd.png",
            },
            Self::CreativeCommons {
                commercial_use: false,
                modification,
            } => match modification {
                Modification::Allowed => "by-nc.png",
                Modification::ShareAlike => "by-nc-sa.png",
                Modification::NoDerivatives => "by-nc-nd.png",
            },
            Self::Sampling(kind) => match kind {
                SamplingKind::Sampling => "sampling.png",
                SamplingKind::SamplingPlus => "sampling-plus.png",
                SamplingKind::NonCommercialSamplingPlus => "nc-sampling-plus.png",
            },
            Self::DevelopingNations | Self::PublicDomain => "somerights.png",
            Self::None => return None,
        };
        Some(name)
    }
}

/// License chosen for a job together with its descriptive data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub license: License,
    /// URI of the license deed.
    pub uri: String,
    /// Display name of the license.
    pub name: String,
    /// Jurisdiction name as shown to the user, if one was picked.
    pub jurisdiction: Option<String>,
}

impl LicenseInfo {
    pub fn has_jurisdiction(&self) -> bool {
        self.jurisdiction.as_deref().is_some_and(|j| !j.is_empty())
    }
}

/// Where the license badge goes on a class of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    #[default]
    Hidden,
    /// Use the first page's placement.
    SameAsFirst,
    /// Position as a percentage of the free space left by the badge.
    At { x_percent: u8, y_percent: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LicenseLocation {
    pub first_page: Placement,
    pub other_pages: Placement,
}

impl LicenseLocation {
    /// Resolved percentages for a page, or `None` when no badge is drawn.
    pub fn placement_for(&self, first_page: bool) -> Option<(u8, u8)> {
        let placement = if first_page {
            self.first_page
        } else {
            match self.other_pages {
                Placement::SameAsFirst => self.first_page,
                other => other,
            }
        };
        match placement {
            Placement::At {
                x_percent,
                y_percent,
            } => Some((x_percent.min(100), y_percent.min(100))),
            Placement::Hidden | Placement::SameAsFirst => None,
        }
    }

    /// Top-left corner of a badge of `image` size on a page of `page` size.
    pub fn location_for_page(&self, first_page: bool, page: Size, image: Size) -> Option<Point> {
        let (x_percent, y_percent) = self.placement_for(first_page)?;
        let free_x = (page.cx - image.cx).max(0) as i64;
        let free_y = (page.cy - image.cy).max(0) as i64;
        Some(Point::new(
            (free_x * x_percent as i64 / 100) as i32,
            (free_y * y_percent as i64 / 100) as i32,
        ))
    }
}

/// One paragraph of license page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseParagraph {
    /// Header paragraphs are set larger and carry no bullet.
    pub header: bool,
    pub text: String,
    /// Image shown to the left of a body paragraph instead of a bullet.
    pub image_file: Option<String>,
}

/// License text as returned by a license catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LicenseText {
    /// Full display name, including version and jurisdiction when known.
    pub name: String,
    /// Short name used in the deed URL (e.g. `by-nc-sa`).
    pub short_name: String,
    pub version: Option<String>,
    pub jurisdiction_short: Option<String>,
    pub paragraphs: Vec<LicenseParagraph>,
}

impl LicenseText {
    /// URL of the license deed, e.g. `http://creativecommons.org/licenses/by/2.5/il/`.
    pub fn deed_url(&self) -> String {
        let mut url = format!("{DEED_BASE_URL}{}/", self.short_name);
        for part in [&self.version, &self.jurisdiction_short].into_iter().flatten() {
            if !part.is_empty() {
                url.push_str(part);
                url.push('/');
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_page_only_for_catalog_licenses() {
        assert!(License::DevelopingNations.has_license_page());
        assert!(License::Sampling(SamplingKind::SamplingPlus).has_license_page());
        assert!(!License::PublicDomain.has_license_page());
        assert!(!License::None.has_license_page());
        assert_eq!(License::PublicDomain.catalog_mode(), None);
    }

    #[test]
    fn badge_depends_on_commercial_use() {
        let cc = |commercial_use| License::CreativeCommons {
            commercial_use,
            modification: Modification::ShareAlike,
        };
        assert_eq!(cc(true).badge_file(), Some("by-sa.png"));
        assert_eq!(cc(false).badge_file(), Some("by-nc-sa.png"));
        assert_eq!(License::None.badge_file(), None);
    }

    #[test]
    fn other_pages_can_follow_first_page() {
        let location = LicenseLocation {
            first_page: Placement::At {
                x_percent: 100,
                y_percent: 0,
            },
            other_pages: Placement::SameAsFirst,
        };
        let page = Size::new(1000, 2000);
        let badge = Size::new(100, 50);
        assert_eq!(
            location.location_for_page(false, page, badge),
            Some(Point::new(900, 0))
        );
    }

    #[test]
    fn hidden_placement_has_no_location() {
        let location = LicenseLocation {
            first_page: Placement::At {
                x_percent: 50,
                y_percent: 50,
            },
            other_pages: Placement::Hidden,
        };
        assert!(location.placement_for(false).is_none());
        assert_eq!(location.placement_for(true), Some((50, 50)));
    }

    #[test]
    fn deed_url_skips_missing_parts() {
        let mut text = LicenseText {
            short_name: "by-nc".into(),
            version: Some("2.5".into()),
            ..Default::default()
        };
        assert_eq!(text.deed_url(), "http://creativecommons.org/licenses/by-nc/2.5/");
        text.jurisdiction_short = Some("il".into());
        assert_eq!(
            text.deed_url(),
            "http://creativecommons.org/licenses/by-nc/2.5/il/"
        );
    }
}
