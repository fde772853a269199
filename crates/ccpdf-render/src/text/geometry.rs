// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Positioned letters, words and lines rebuilt from text draw calls.
//
// Applications draw a visual line in several calls (styled runs, kerned
// fragments, table cells). Each call becomes a `Line`; consecutive calls
// whose vertical midpoints overlap are merged back into one line so phrase
// and URL searches see the text as the reader does.

use serde::{Deserialize, Serialize};

use ccpdf_core::Rect;

/// Characters that separate words inside a run.
pub const WORD_BREAKS: [char; 4] = [' ', '\r', '\n', '\t'];

/// Horizontal gap (device units) under which two runs on one line are
/// treated as a single word.
pub const MERGE_TOLERANCE: i32 = 2;

/// Horizontal placement of the characters of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advance {
    /// Explicit per-character x positions and widths.
    Proportional { positions: Vec<i32>, widths: Vec<i32> },
    /// Every character is this wide, starting at the run's left edge.
    Fixed(i32),
}

impl Advance {
    /// Number of characters this advance can place, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Proportional { positions, widths } => Some(positions.len().min(widths.len())),
            Self::Fixed(_) => None,
        }
    }

    fn place(&self, index: usize, left: i32) -> Option<(i32, i32)> {
        match self {
            Self::Proportional { positions, widths } => {
                Some((*positions.get(index)?, *widths.get(index)?))
            }
            Self::Fixed(width) => {
                let offset = i32::try_from(index).ok()?.checked_mul(*width)?;
                Some((left.checked_add(offset)?, *width))
            }
        }
    }
}

/// A character with its horizontal extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letter {
    pub ch: char,
    pub x: i32,
    pub width: i32,
}

impl Letter {
    pub fn end(&self) -> i32 {
        self.x.saturating_add(self.width)
    }
}

/// Maximal run of non-break characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    letters: Vec<Letter>,
}

impl Word {
    pub fn new(letters: Vec<Letter>) -> Self {
        Self { letters }
    }

    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn text(&self) -> String {
        self.letters.iter().map(|l| l.ch).collect()
    }

    /// Left edge of the letter at `index`.
    pub fn start(&self, index: usize) -> Option<i32> {
        self.letters.get(index).map(|l| l.x)
    }

    /// Right edge of the letter at `index`.
    pub fn end(&self, index: usize) -> Option<i32> {
        self.letters.get(index).map(Letter::end)
    }

    /// Concatenate `other` onto this word.
    pub fn append(&mut self, other: &Word) {
        self.letters.extend_from_slice(&other.letters);
    }
}

/// One visual line: words left to right and the bounding rectangle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    words: Vec<Word>,
    rect: Rect,
}

impl Line {
    /// Split a drawn run into words.
    ///
    /// Characters the advance cannot place are dropped. `rect` supplies the
    /// vertical extent; the horizontal one is recomputed from the letters.
    pub fn from_run(text: &str, rect: Rect, advance: &Advance) -> Self {
        let mut words = Vec::new();
        let mut current = Vec::new();

        for (index, ch) in text.chars().enumerate() {
            let Some((x, width)) = advance.place(index, rect.left) else {
                break;
            };
            if WORD_BREAKS.contains(&ch) {
                if !current.is_empty() {
                    words.push(Word::new(std::mem::take(&mut current)));
                }
            } else {
                current.push(Letter { ch, x, width });
            }
        }
        if !current.is_empty() {
            words.push(Word::new(current));
        }

        let mut line = Self { words, rect };
        line.set_sides();
        line
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words.iter().map(Word::text).collect::<Vec<_>>().join(" ")
    }

    fn set_sides(&mut self) {
        let first = self.words.first().and_then(|w| w.start(0));
        let last = self.words.last().and_then(|w| w.end(w.len().saturating_sub(1)));
        match (first, last) {
            (Some(left), Some(right)) => {
                self.rect.left = left;
                self.rect.right = right;
            }
            _ => self.rect.right = self.rect.left,
        }
    }

    /// Either line's vertical midpoint lies within the other's span.
    pub fn on_same_line(&self, other: &Line) -> bool {
        self.rect.spans_y(other.rect.middle_y()) || other.rect.spans_y(self.rect.middle_y())
    }

    /// Fold `other` into this line if both sit on the same visual line.
    ///
    /// Runs closer than [`MERGE_TOLERANCE`] join at a single boundary word.
    pub fn merge(&mut self, other: &Line) -> bool {
        if !self.on_same_line(other) {
            return false;
        }

        if self.rect.left > other.rect.left {
            let mut words = other.words.clone();
            let separate = self.rect.left > other.rect.right.saturating_add(MERGE_TOLERANCE);
            let mut own = std::mem::take(&mut self.words).into_iter();
            if !separate {
                if let (Some(seam), Some(front)) = (words.last_mut(), own.next()) {
                    seam.append(&front);
                }
            }
            words.extend(own);
            self.words = words;
        } else {
            let separate = self.rect.right < other.rect.left.saturating_sub(MERGE_TOLERANCE);
            let mut rest = other.words.iter();
            if !separate && !self.words.is_empty() {
                if let (Some(seam), Some(front)) = (self.words.last_mut(), rest.next()) {
                    seam.append(front);
                }
            }
            self.words.extend(rest.cloned());
        }

        self.rect.top = self.rect.top.min(other.rect.top);
        self.rect.bottom = self.rect.bottom.max(other.rect.bottom);
        self.set_sides();
        true
    }
}

/// Cursor into a `TextArea`: the next word a search examines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub line: usize,
    pub word: usize,
}

/// All text of one page, in draw order after line merging.
#[derive(Debug, Clone, Default)]
pub struct TextArea {
    pub(crate) lines: Vec<Line>,
    pub(crate) phrase: Cursor,
    pub(crate) url: Cursor,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, merging it into the previous one when they share a
    /// visual line. Empty lines are ignored.
    pub fn add_line(&mut self, line: Line) {
        if line.is_empty() {
            return;
        }
        if let Some(last) = self.lines.last_mut() {
            if last.merge(&line) {
                return;
            }
        }
        self.lines.push(line);
    }

    pub fn add_run(&mut self, text: &str, rect: Rect, advance: &Advance) {
        self.add_line(Line::from_run(text, rect, advance));
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.phrase = Cursor::default();
        self.url = Cursor::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(text: &str, left: i32, top: i32) -> Line {
        let right = left + 10 * text.chars().count() as i32;
        Line::from_run(text, Rect::new(left, top, right, top + 20), &Advance::Fixed(10))
    }

    #[test]
    fn run_splits_on_whitespace() {
        let line = fixed("go  to\tthe\r\nend", 0, 0);
        let words: Vec<String> = line.words().iter().map(Word::text).collect();
        assert_eq!(words, ["go", "to", "the", "end"]);
        assert_eq!(line.rect().left, 0);
        assert_eq!(line.rect().right, 150);
    }

    #[test]
    fn fixed_pitch_starts_at_run_left() {
        let line = fixed("ab", 40, 0);
        let word = &line.words()[0];
        assert_eq!(word.start(0), Some(40));
        assert_eq!(word.start(1), Some(50));
        assert_eq!(word.end(1), Some(60));
    }

    #[test]
    fn proportional_positions_are_used() {
        let advance = Advance::Proportional {
            positions: vec![5, 12, 30],
            widths: vec![7, 8, 9],
        };
        let line = Line::from_run("a c", Rect::new(0, 0, 100, 10), &advance);
        assert_eq!(line.words().len(), 2);
        assert_eq!(line.rect().left, 5);
        assert_eq!(line.rect().right, 39);
    }

    #[test]
    fn unplaceable_characters_are_dropped() {
        let advance = Advance::Proportional {
            positions: vec![0, 10],
            widths: vec![10, 10],
        };
        let line = Line::from_run("abcd", Rect::new(0, 0, 40, 10), &advance);
        assert_eq!(line.text(), "ab");
    }

    #[test]
    fn same_line_uses_midpoints_both_ways() {
        let tall = Line::from_run("a", Rect::new(0, 0, 10, 100), &Advance::Fixed(10));
        let small = Line::from_run("b", Rect::new(20, 40, 30, 50), &Advance::Fixed(10));
        assert!(tall.on_same_line(&small));
        assert!(small.on_same_line(&tall));
        assert!(!fixed("a", 0, 0).on_same_line(&fixed("b", 0, 50)));
    }

    #[test]
    fn touching_runs_merge_into_one_word() {
        let mut area = TextArea::new();
        area.add_line(fixed("Hello", 10, 100));
        area.add_line(fixed("world", 60, 102));

        assert_eq!(area.lines().len(), 1);
        let line = &area.lines()[0];
        assert_eq!(line.text(), "Helloworld");
        assert_eq!(line.rect(), Rect::new(10, 100, 110, 122));
    }

    #[test]
    fn separated_runs_stay_separate_words() {
        let mut area = TextArea::new();
        area.add_line(fixed("Hello", 10, 100));
        area.add_line(fixed("world", 80, 100));
        assert_eq!(area.lines()[0].text(), "Hello world");
    }

    #[test]
    fn run_drawn_left_of_line_is_prepended() {
        let mut area = TextArea::new();
        area.add_line(fixed("world", 100, 0));
        area.add_line(fixed("big", 0, 0));
        let line = &area.lines()[0];
        assert_eq!(line.text(), "big world");
        assert_eq!(line.rect().left, 0);
        assert_eq!(line.rect().right, 150);

        let mut area = TextArea::new();
        area.add_line(fixed("world", 60, 0));
        area.add_line(fixed("Hello", 10, 0));
        assert_eq!(area.lines()[0].text(), "Helloworld");
    }

    #[test]
    fn merged_line_text_is_concatenation_of_parts() {
        let parts = ["alpha beta", "gamma", "delta epsilon"];
        let mut area = TextArea::new();
        let mut left = 0;
        for part in parts {
            let line = fixed(part, left, 0);
            left = line.rect().right + 30;
            area.add_line(line);
        }
        assert_eq!(area.lines().len(), 1);
        assert_eq!(area.lines()[0].text(), parts.join(" "));
    }

    #[test]
    fn different_lines_and_empty_runs() {
        let mut area = TextArea::new();
        area.add_line(fixed("one", 0, 0));
        area.add_line(fixed("   ", 0, 0));
        area.add_line(fixed("two", 0, 40));
        area.add_line(fixed("three", 0, 80));
        assert_eq!(area.lines().len(), 3);

        area.clear();
        assert!(area.is_empty());
    }

    #[test]
    fn extreme_coordinates_stay_in_range() {
        let rect = Rect::new(i32::MAX - 15, 0, i32::MAX, 20);
        let line = Line::from_run("abcd", rect, &Advance::Fixed(10));
        // Letters that would start past i32::MAX are not placed.
        assert_eq!(line.text(), "ab");
        assert_eq!(line.words()[0].end(1), Some(i32::MAX));
        assert_eq!(line.rect().right, i32::MAX);

        let mut area = TextArea::new();
        area.add_line(line);
        area.add_line(Line::from_run(
            "z",
            Rect::new(i32::MIN, 0, i32::MIN + 10, 20),
            &Advance::Fixed(10),
        ));
        assert_eq!(area.lines().len(), 1);
        assert_eq!(area.lines()[0].words().len(), 2);
    }

    #[test]
    fn only_last_line_is_a_merge_candidate() {
        let mut area = TextArea::new();
        area.add_line(fixed("top", 0, 0));
        area.add_line(fixed("bottom", 0, 40));
        area.add_line(fixed("again", 200, 0));
        assert_eq!(area.lines().len(), 3);
    }
}
