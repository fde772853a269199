// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application escapes: the side channel applications use to hand links to
// the driver while printing.
//
// Link payload layout (little-endian):
//
//   offset  size  field
//   0       4     rect.left   (i32)
//   4       4     rect.top    (i32)
//   8       4     rect.right  (i32)
//   12      4     rect.bottom (i32)
//   16      8     title offset, relative to byte 24 (u64, 0 = no title)
//   24      ..    URL, NUL-terminated; the title follows at its offset

use ccpdf_core::error::{CcpdfError, Result};
use ccpdf_core::Rect;

/// Host escape asking whether another escape code is supported.
pub const QUERYESCSUPPORT: u32 = 8;
/// Add a link over a rectangle of the current page.
pub const ESCAPE_LINK_DATA: u32 = 0x6677_11aa;
/// Turn off URL detection for the rest of the document.
pub const ESCAPE_DISABLE_AUTO_URL: u32 = 0x6677_11ab;

/// Bytes before the URL in a link payload.
pub const LINK_HEADER_LEN: usize = 24;

/// How the driver answers an escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeResponse {
    /// Handled (or, for a support query, supported).
    Accepted,
    /// One of ours, but the payload was refused.
    Rejected,
    /// Not ours; the base driver answers.
    Forward,
}

/// Whether this driver implements escape `code`.
pub fn is_supported(code: u32) -> bool {
    matches!(code, ESCAPE_LINK_DATA | ESCAPE_DISABLE_AUTO_URL)
}

/// Link handed over by an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeLink {
    pub rect: Rect,
    pub url: String,
    pub title: Option<String>,
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[at..at + 4]);
    i32::from_le_bytes(bytes)
}

fn c_string(data: &[u8]) -> String {
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

impl EscapeLink {
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() <= LINK_HEADER_LEN {
            return Err(CcpdfError::InvalidEscape {
                size: data.len(),
                required: LINK_HEADER_LEN + 1,
            });
        }
        let rect = Rect::new(
            read_i32(data, 0),
            read_i32(data, 4),
            read_i32(data, 8),
            read_i32(data, 12),
        );
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&data[16..LINK_HEADER_LEN]);
        let title_offset = u64::from_le_bytes(offset);

        let strings = &data[LINK_HEADER_LEN..];
        let title = if title_offset == 0 {
            None
        } else {
            let start = usize::try_from(title_offset)
                .ok()
                .filter(|start| *start < strings.len())
                .ok_or_else(|| {
                    CcpdfError::MalformedEscape(format!(
                        "title offset {title_offset} outside {} byte payload",
                        strings.len()
                    ))
                })?;
            Some(c_string(&strings[start..]))
        };

        Ok(Self {
            rect,
            url: c_string(strings),
            title,
        })
    }

    /// Payload as an application would send it.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(LINK_HEADER_LEN + self.url.len() + 2);
        for value in [self.rect.left, self.rect.top, self.rect.right, self.rect.bottom] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        let title_offset = match self.title {
            Some(_) => self.url.len() as u64 + 1,
            None => 0,
        };
        data.extend_from_slice(&title_offset.to_le_bytes());
        data.extend_from_slice(self.url.as_bytes());
        data.push(0);
        if let Some(title) = &self.title {
            data.extend_from_slice(title.as_bytes());
            data.push(0);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_application_payload() {
        let mut data = Vec::new();
        for v in [10i32, 20, 110, 40] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&19u64.to_le_bytes());
        data.extend_from_slice(b"http://a.example/x\0Example\0");

        let link = EscapeLink::decode(&data).expect("decode");
        assert_eq!(link.rect, Rect::new(10, 20, 110, 40));
        assert_eq!(link.url, "http://a.example/x");
        assert_eq!(link.title.as_deref(), Some("Example"));
    }

    #[test]
    fn encoded_link_decodes_to_itself() {
        let link = EscapeLink {
            rect: Rect::new(-5, 0, 5, 9),
            url: "https://b.example".into(),
            title: None,
        };
        assert_eq!(EscapeLink::decode(&link.encode()).expect("decode"), link);
    }

    #[test]
    fn payload_without_url_byte_is_rejected() {
        let err = EscapeLink::decode(&[0u8; LINK_HEADER_LEN]).expect_err("short");
        assert!(matches!(
            err,
            CcpdfError::InvalidEscape {
                size: 24,
                required: 25
            }
        ));
    }

    #[test]
    fn title_offset_past_payload_is_malformed() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&100u64.to_le_bytes());
        data.extend_from_slice(b"http://c.example\0");
        assert!(matches!(
            EscapeLink::decode(&data),
            Err(CcpdfError::MalformedEscape(_))
        ));
    }

    #[test]
    fn unterminated_url_runs_to_end() {
        let mut data = vec![0u8; LINK_HEADER_LEN];
        data.extend_from_slice(b"http://d.example");
        assert_eq!(EscapeLink::decode(&data).expect("decode").url, "http://d.example");
    }

    #[test]
    fn supports_only_own_codes() {
        assert!(is_supported(ESCAPE_LINK_DATA));
        assert!(is_supported(ESCAPE_DISABLE_AUTO_URL));
        assert!(!is_supported(QUERYESCSUPPORT));
    }
}
