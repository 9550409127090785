//! Cell coordinates and sheet sizes.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! the validity domain every sheet operation checks against.
//!
//! # Examples
//!
//! ```ignore
//! let pos: Position = "B3".parse().unwrap();
//! assert_eq!(pos.row, 2);  // 0-indexed
//! assert_eq!(pos.col, 1);
//! assert_eq!(pos.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// A cell coordinate (0-indexed). Only positions inside
/// `[0, MAX_ROWS) x [0, MAX_COLS)` are valid.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const MAX_ROWS: i32 = 16384;
    pub const MAX_COLS: i32 = 16384;

    /// Sentinel for references that cannot be represented at all.
    pub const NONE: Position = Position { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Position {
        Position { row, col }
    }

    pub fn is_valid(&self) -> bool {
        (0..Self::MAX_ROWS).contains(&self.row) && (0..Self::MAX_COLS).contains(&self.col)
    }

    /// Parse A1 notation. Returns None if the text is not shaped like a
    /// reference; a well-shaped reference whose coordinates overflow comes
    /// back as [`Position::NONE`] so callers can treat it as a bad reference.
    pub fn parse_a1(name: &str) -> Option<Position> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0i32;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as i32 + 1;
            match col_acc.checked_mul(26).and_then(|v| v.checked_add(digit)) {
                Some(v) => col_acc = v,
                None => return Some(Position::NONE),
            }
        }

        let row = match numbers.parse::<i32>() {
            Ok(n) if n >= 1 => n - 1,
            _ => return Some(Position::NONE),
        };

        Some(Position::new(row, col_acc - 1))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: i32) -> String {
        let mut result = String::new();
        let mut n = col as i64 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

// Row-major, so sorted reference lists read left to right, top to bottom.
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_a1(s.trim()) {
            Some(pos) if pos.is_valid() => Ok(pos),
            _ => Err(format!("Invalid cell reference: {}", s)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("#REF!");
        }
        write!(f, "{}{}", Position::col_to_letters(self.col), self.row + 1)
    }
}

/// Row and column counts of a rectangle anchored at A1.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const fn new(rows: i32, cols: i32) -> Size {
        Size { rows, cols }
    }

    /// Grow to the smallest size that still contains `pos`.
    pub fn include(&mut self, pos: Position) {
        self.rows = self.rows.max(pos.row + 1);
        self.cols = self.cols.max(pos.col + 1);
    }

    /// True if `pos` lies on the last row or the last column.
    pub fn on_edge(&self, pos: Position) -> bool {
        pos.row + 1 == self.rows || pos.col + 1 == self.cols
    }
}
