// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PostScript fragments written into the spool.
//
// Coordinates are device units with y growing downwards, matching the
// driver's page setup. Text set by these fragments uses a flipped font
// matrix for the same reason. Link annotations use the `pdfmark` operator,
// which PostScript-to-PDF converters turn into PDF annotations; interpreters
// without it ignore them.

pub mod image;
pub mod writer;

pub use image::PsImage;
pub use writer::PsWriter;

use ccpdf_core::{License, LicenseInfo, Rect};

/// Named destination of the synthesized license page.
pub const LICENSE_DESTINATION: &str = "TheLicense";

/// Lead-in of the license page footer.
pub const CREATED_BY_TEXT: &str = "The document was created by ";

/// Procedure drawing an underlined string, used by [`hyperlink`].
pub const HYPERLINK_PROC: &str = "/cc_hyperlink { dup show stringwidth pop neg
   gsave 0 currentfont dup
      /FontInfo get /UnderlineThickness get exch
      /FontMatrix get dtransform setlinewidth 0 currentfont dup
      /FontInfo get /UnderlinePosition get exch
      /FontMatrix get dtransform rmoveto rlineto stroke
   grestore
} def
";

/// Body of a PostScript string literal for `text`.
///
/// Characters outside Latin-1 cannot be encoded and become `?`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => match u8::try_from(u32::from(ch)) {
                Ok(byte) => out.push_str(&format!("\\{byte:03o}")),
                Err(_) => out.push('?'),
            },
        }
    }
    out
}

/// Clickable box opening `url`.
pub fn url_box(rect: Rect, url: &str, title: Option<&str>) -> String {
    format!(
        "\n[ /Rect [{} {} {} {}]\n\t/Action << /Subtype /URI /URI ({}) >>\n\t/Border [0 0 2]\n\t/Color [.7 0 0]\n\t/Subtype /Link\n\t/Title ({})\n\t/ANN pdfmark\n",
        rect.left,
        rect.top,
        rect.right,
        rect.bottom,
        escape_text(url),
        escape_text(title.unwrap_or(url)),
    )
}

/// Clickable box jumping to the named destination `dest`.
pub fn jump_box(rect: Rect, dest: &str, title: Option<&str>) -> String {
    format!(
        "\n[ /Rect [{} {} {} {}]\n\t/Border [0 0 2]\n\t/Color [.7 0 0]\n\t/Dest /{}\n\t/Title ({})\n\t/Subtype /Link\n\t/ANN pdfmark\n",
        rect.left,
        rect.top,
        rect.right,
        rect.bottom,
        dest,
        escape_text(title.unwrap_or(dest)),
    )
}

/// Named destination showing the current page whole.
pub fn jump_destination(dest: &str) -> String {
    format!("\n[ /Dest /{dest}\n\t/View [/Fit]\n\t/DEST pdfmark\n")
}

/// Clickable box jumping to `(x, y)` on `page`.
pub fn internal_link(rect: Rect, page: u32, x: i32, y: i32, title: Option<&str>) -> String {
    let title = title
        .map(|t| format!("\t/Title ({})\n", escape_text(t)))
        .unwrap_or_default();
    format!(
        "\n[ /Rect [{} {} {} {}]\n\t/Border [0 0 2]\n\t/Color [.7 0 0]\n\t/Page {page}\n\t/View [/XYZ {x} {y} 0]\n{title}\t/Subtype /Link\n\t/ANN pdfmark\n",
        rect.left, rect.top, rect.right, rect.bottom,
    )
}

/// Underlined `text` at the current point, linked to `url`.
///
/// Needs [`HYPERLINK_PROC`] defined earlier on the page.
pub fn hyperlink(font_size: i32, text: &str, url: &str) -> String {
    format!(
        "\ncurrentpoint\n  {font_size} sub\n  currentcolor 0 0 128 setrgbcolor  ({}) cc_hyperlink\n  setcolor\n  currentpoint\n  [ /Rect 6 -4 roll 4 array astore\n    /Action << /Subtype /URI /URI ({}) >>\n    /Border [0 0 2]\n    /Color [.7 0 0]\n    /Subtype /Link\n    /ANN pdfmark\n",
        escape_text(text),
        escape_text(url),
    )
}

fn select_font(font_size: i32, x: i32, y: i32) -> String {
    format!("/Times-Roman findfont [{font_size} 0 0 -{font_size} 0 0 ] makefont setfont\n{x} {y} moveto\n")
}

/// `text` with its baseline starting at `(x, y)`.
pub fn text_at(font_size: i32, x: i32, y: i32, text: &str) -> String {
    format!("{}({}) show\n", select_font(font_size, x, y), escape_text(text))
}

/// `text` centred in the `width` wide span starting at `x`.
pub fn centered_text_at(font_size: i32, x: i32, y: i32, width: i32, text: &str) -> String {
    format!(
        "{}({})\ndup stringwidth pop\n{width} exch sub\n2 div\n0 rmoveto\nshow\n",
        select_font(font_size, x, y),
        escape_text(text),
    )
}

/// Move the current point so that `text` would be centred in `width`,
/// without drawing it. Following fragments draw from there.
pub fn center_for(font_size: i32, x: i32, y: i32, width: i32, text: &str) -> String {
    format!(
        "{}({}) stringwidth pop\n{width} exch sub\n2 div\n0 rmoveto\n",
        select_font(font_size, x, y),
        escape_text(text),
    )
}

/// `text` at the current point, in the current font.
pub fn show_text(text: &str) -> String {
    format!("({}) show \n", escape_text(text))
}

/// Filled disc.
pub fn circle(x: i32, y: i32, radius: i32) -> String {
    format!("newpath {x} {y} {radius} 0 360 arc fill closepath\n")
}

/// DOCINFO rights metadata for the document's license.
///
/// Public-domain works are marked as carrying no rights; documents without
/// a license get nothing.
pub fn rights_info(info: &LicenseInfo) -> Option<String> {
    match info.license {
        License::None => None,
        License::PublicDomain => Some(format!(
            "\n[ /Rights (False)\n\t/RightsURL ({})\n\t/DOCINFO pdfmark\n",
            escape_text(&info.uri)
        )),
        License::CreativeCommons { .. }
        | License::Sampling(_)
        | License::DevelopingNations => Some(format!(
            "\n[ /Rights (True)\n\t/RightsURL ({uri})\n\t/RightsStatement (This work is licensed under a {name} license {uri})\n\t/DOCINFO pdfmark\n",
            uri = escape_text(&info.uri),
            name = escape_text(&info.name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpdf_core::{Modification, SamplingKind};

    #[test]
    fn escapes_delimiters_and_controls() {
        assert_eq!(escape_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_text("x\ny\tz"), "x\\ny\\tz");
        assert_eq!(escape_text("caf\u{e9}"), "caf\\351");
        assert_eq!(escape_text("\u{20ac}5"), "?5");
    }

    #[test]
    fn url_box_defaults_title_to_url() {
        let out = url_box(Rect::new(1, 2, 3, 4), "http://a.example/x", None);
        assert!(out.contains("/Rect [1 2 3 4]"));
        assert!(out.contains("/URI (http://a.example/x)"));
        assert!(out.contains("/Title (http://a.example/x)"));
        assert!(out.ends_with("/ANN pdfmark\n"));

        let titled = url_box(Rect::default(), "http://a.example", Some("A (site)"));
        assert!(titled.contains("/Title (A \\(site\\))"));
    }

    #[test]
    fn internal_link_carries_page_and_view() {
        let out = internal_link(Rect::new(0, 0, 5, 5), 3, 10, 20, None);
        assert!(out.contains("/Page 3\n\t/View [/XYZ 10 20 0]\n\t/Subtype /Link"));
        assert!(!out.contains("/Title"));

        let titled = internal_link(Rect::new(0, 0, 5, 5), 3, 10, 20, Some("Next"));
        assert!(titled.contains("/View [/XYZ 10 20 0]\n\t/Title (Next)\n\t/Subtype /Link"));
    }

    #[test]
    fn jump_box_targets_named_destination() {
        let out = jump_box(Rect::new(0, 0, 1, 1), LICENSE_DESTINATION, None);
        assert!(out.contains("/Dest /TheLicense"));
        assert!(out.contains("/Title (TheLicense)"));
        assert!(jump_destination(LICENSE_DESTINATION).contains("/DEST pdfmark"));
    }

    #[test]
    fn rights_info_by_license() {
        let mut info = LicenseInfo {
            uri: "http://creativecommons.org/licenses/by/2.5/".into(),
            name: "Attribution 2.5".into(),
            ..Default::default()
        };
        assert!(rights_info(&info).is_none());

        info.license = License::PublicDomain;
        let pd = rights_info(&info).expect("pd");
        assert!(pd.contains("/Rights (False)"));
        assert!(!pd.contains("RightsStatement"));

        info.license = License::CreativeCommons {
            commercial_use: true,
            modification: Modification::Allowed,
        };
        let cc = rights_info(&info).expect("cc");
        assert!(cc.contains("/Rights (True)"));
        assert!(cc.contains(
            "/RightsStatement (This work is licensed under a Attribution 2.5 license http://creativecommons.org/licenses/by/2.5/)"
        ));

        for license in [
            License::Sampling(SamplingKind::SamplingPlus),
            License::DevelopingNations,
        ] {
            info.license = license;
            assert!(rights_info(&info).expect("rights").contains("/Rights (True)"));
        }
    }

    #[test]
    fn text_fragments_select_flipped_font() {
        let out = text_at(12, 5, 40, "hi");
        assert_eq!(
            out,
            "/Times-Roman findfont [12 0 0 -12 0 0 ] makefont setfont\n5 40 moveto\n(hi) show\n"
        );
        assert!(centered_text_at(12, 0, 40, 300, "t").contains("300 exch sub"));
        assert!(center_for(12, 0, 40, 300, "t").ends_with("0 rmoveto\n"));
    }
}
