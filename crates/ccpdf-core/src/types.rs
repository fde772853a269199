// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry and identity types shared by the rendering hooks.
//
// All coordinates are device units of the printer surface (origin top-left,
// y growing downwards), matching what the driver reports for draw calls.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Vertical midpoint, rounded towards zero like the driver's integer math.
    pub fn middle_y(&self) -> i32 {
        // The mean of two i32 values always fits in i32.
        ((i64::from(self.top) + i64::from(self.bottom)) / 2) as i32
    }

    /// True when `y` lies inside the vertical span (inclusive on both ends).
    pub fn spans_y(&self, y: i32) -> bool {
        y >= self.top && y <= self.bottom
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Page or image dimensions in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub cx: i32,
    pub cy: i32,
}

impl Size {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Identity of the printer instance a job is rendered for.
///
/// The link store is keyed by this value so that the measurement pass and the
/// final pass (two separate processes) find the same data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrinterId(pub String);

impl PrinterId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrinterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum number of face-name characters that take part in a font signature.
pub const FACE_NAME_LIMIT: usize = 32;

/// Logical description of a font as realized by the driver for a draw call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub face_name: String,
    /// Point height derived from the font transform.
    pub height: i32,
    pub weight: i32,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub pitch_and_family: u8,
    pub char_set: u8,
}

impl FontDescriptor {
    /// Italic, underline and strike-out packed as bits 0, 1 and 2.
    pub fn style_bits(&self) -> u8 {
        (self.italic as u8) | ((self.underline as u8) << 1) | ((self.strike_out as u8) << 2)
    }

    /// Normalized cache key: visually identical requests produce equal keys.
    pub fn signature(&self) -> String {
        let face: String = self.face_name.chars().take(FACE_NAME_LIMIT).collect();
        format!(
            "{}|{}|{}|{}|{}",
            face,
            self.height,
            self.weight,
            self.style_bits(),
            self.pitch_and_family
        )
    }
}
