// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Forward-only phrase and URL searches over a page's text.
//
// A phrase must lie on one visual line. Its first word may be the tail of a
// longer word and its last word the head of one, so "read more" is found in
// "Please-read moreover". A one-word phrase matches anywhere inside a word.
// Phrase and URL searches keep separate cursors.

use tracing::trace;

use ccpdf_core::Rect;

use super::geometry::{Cursor, Line, TextArea, Word};

/// Shortest word that can hold a URL (`http://` plus one character).
pub const URL_MIN_LEN: usize = 8;

/// Punctuation allowed inside a URL besides ASCII letters and digits.
const URL_PUNCTUATION: &str = ".+$-_@&!*\"'(),%/?:=#~;[]";

/// Dropped from the end of a URL: sentence punctuation and closing quotes.
const URL_TRAILING: [char; 5] = [')', '.', '\'', '"', '?'];

/// A URL found in the page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub url: String,
    pub rect: Rect,
}

/// Words of a link phrase. Runs of spaces do not produce empty words.
pub fn split_phrase(text: &str) -> Vec<&str> {
    text.split(' ').filter(|w| !w.is_empty()).collect()
}

impl TextArea {
    /// Restart phrase searches at the top of the page.
    pub fn init_search(&mut self) {
        self.phrase = Cursor::default();
    }

    /// Restart URL searches at the top of the page.
    pub fn init_url_search(&mut self) {
        self.url = Cursor::default();
    }

    /// Next occurrence of `words` after the cursor, as the rectangle spanning
    /// the matched characters. The cursor moves past the match.
    pub fn search_for<S: AsRef<str>>(&mut self, words: &[S]) -> Option<Rect> {
        let count = words.len();
        if count == 0 || words.iter().any(|w| w.as_ref().is_empty()) {
            return None;
        }

        while self.phrase.line < self.lines.len() {
            let line = &self.lines[self.phrase.line];
            if line.words().len() >= count {
                let last_start = line.words().len() - count;
                for at in self.phrase.word..=last_start {
                    if let Some(rect) = match_at(line, at, words) {
                        self.phrase.word = at + count;
                        return Some(rect);
                    }
                }
            }
            self.phrase = Cursor {
                line: self.phrase.line + 1,
                word: 0,
            };
        }
        None
    }

    /// The `repeat`-th next occurrence of `words`. Zero counts as one.
    pub fn search_for_repeat<S: AsRef<str>>(&mut self, words: &[S], repeat: u32) -> Option<Rect> {
        let mut found = None;
        for _ in 0..repeat.max(1) {
            found = Some(self.search_for(words)?);
        }
        found
    }

    /// Next word after the URL cursor that starts with `http://` or
    /// `https://` (any case).
    pub fn search_for_url(&mut self) -> Option<UrlMatch> {
        while self.url.line < self.lines.len() {
            let line = &self.lines[self.url.line];
            for (index, word) in line.words().iter().enumerate().skip(self.url.word) {
                if let Some(found) = url_in_word(word, line.rect()) {
                    trace!(url = %found.url, "url found in page text");
                    self.url.word = index + 1;
                    return Some(found);
                }
            }
            self.url = Cursor {
                line: self.url.line + 1,
                word: 0,
            };
        }
        None
    }
}

fn match_at<S: AsRef<str>>(line: &Line, at: usize, words: &[S]) -> Option<Rect> {
    let count = words.len();
    let candidates = line.words().get(at..at + count)?;
    let first = &candidates[0];
    let last = &candidates[count - 1];

    let (start, end) = if count == 1 {
        let needle = words[0].as_ref();
        let text = first.text();
        let byte = text.find(needle)?;
        let start = text[..byte].chars().count();
        (start, start + needle.chars().count() - 1)
    } else {
        let head = words[0].as_ref();
        let tail = words[count - 1].as_ref();
        let first_text = first.text();
        if !first_text.ends_with(head) || !last.text().starts_with(tail) {
            return None;
        }
        let middle_matches = candidates[1..count - 1]
            .iter()
            .zip(&words[1..count - 1])
            .all(|(word, expected)| word.text() == expected.as_ref());
        if !middle_matches {
            return None;
        }
        (
            first_text.chars().count() - head.chars().count(),
            tail.chars().count() - 1,
        )
    };

    Some(Rect {
        left: first.start(start)?,
        right: last.end(end)?,
        ..line.rect()
    })
}

fn is_url_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || URL_PUNCTUATION.contains(ch)
}

/// Length in characters of the URL at the start of `chars`, if any.
fn url_len(chars: &[char]) -> Option<usize> {
    if chars.len() < URL_MIN_LEN {
        return None;
    }
    let scheme: String = chars[..4].iter().collect();
    if !scheme.eq_ignore_ascii_case("http") {
        return None;
    }
    let mut host = 4;
    if matches!(chars[host], 's' | 'S') {
        host += 1;
    }
    if *chars.get(host..host + 3)? != [':', '/', '/'] {
        return None;
    }
    host += 3;

    let mut end = chars[host..]
        .iter()
        .position(|c| !is_url_char(*c))
        .map_or(chars.len(), |p| host + p);
    while end > host && URL_TRAILING.contains(&chars[end - 1]) {
        end -= 1;
    }
    (end > host).then_some(end)
}

fn url_in_word(word: &Word, line_rect: Rect) -> Option<UrlMatch> {
    let chars: Vec<char> = word.letters().iter().map(|l| l.ch).collect();
    let len = url_len(&chars)?;
    Some(UrlMatch {
        url: chars[..len].iter().collect(),
        rect: Rect {
            left: word.start(0)?,
            right: word.end(len - 1)?,
            ..line_rect
        },
    })
}
