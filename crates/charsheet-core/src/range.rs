//! Single-column A1 ranges.
//!
//! Every range the workflow touches is one column wide: a key column, a value
//! column, or a slice of either. Rows are 1-indexed and inclusive.

use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Zero-based column index, rendered and parsed as spreadsheet letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(u32);

impl Column {
    pub const A: Column = Column(0);
    pub const C: Column = Column(2);
    pub const D: Column = Column(3);
    pub const G: Column = Column(6);

    pub fn new(index: u32) -> Self {
        Column(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn letters(self) -> String {
        let mut n = self.0 + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8(out).unwrap_or_default()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl std::str::FromStr for Column {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(SheetError::InvalidRange(format!("bad column '{s}'")));
        }
        let mut n: u32 = 0;
        for b in s.bytes() {
            let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
            n = n
                .checked_mul(26)
                .and_then(|n| n.checked_add(digit))
                .ok_or_else(|| SheetError::InvalidRange(format!("column '{s}' too wide")))?;
        }
        Ok(Column(n - 1))
    }
}

impl Serialize for Column {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.letters())
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RowSpan
// ---------------------------------------------------------------------------

/// Inclusive, 1-indexed row interval. Always `1 <= start <= end`, including
/// when read from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRowSpan")]
pub struct RowSpan {
    start: u32,
    end: u32,
}

#[derive(Deserialize)]
struct RawRowSpan {
    start: u32,
    end: u32,
}

impl TryFrom<RawRowSpan> for RowSpan {
    type Error = SheetError;

    fn try_from(raw: RawRowSpan) -> Result<Self> {
        RowSpan::new(raw.start, raw.end)
    }
}

impl RowSpan {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start == 0 || end < start {
            return Err(SheetError::InvalidRange(format!("rows {start}..{end}")));
        }
        Ok(Self { start, end })
    }

    /// For bounds the caller already knows are valid.
    pub(crate) fn new_unchecked(start: u32, end: u32) -> Self {
        debug_assert!(start >= 1 && start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn row_count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn overlaps(&self, other: &RowSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

// ---------------------------------------------------------------------------
// ColumnRange
// ---------------------------------------------------------------------------

/// A one-column range on a named sheet. `rows: None` is the whole column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRange {
    pub sheet: String,
    pub column: Column,
    pub rows: Option<RowSpan>,
}

impl ColumnRange {
    pub fn whole(sheet: impl Into<String>, column: Column) -> Self {
        Self {
            sheet: sheet.into(),
            column,
            rows: None,
        }
    }

    pub fn rows(sheet: impl Into<String>, column: Column, rows: RowSpan) -> Self {
        Self {
            sheet: sheet.into(),
            column,
            rows: Some(rows),
        }
    }

    /// Render as A1 notation, e.g. `Hero!C8:C26` or `'Old Hero'!A:A`.
    pub fn to_a1(&self) -> String {
        let col = self.column.letters();
        let cells = match self.rows {
            Some(span) => format!("{col}{}:{col}{}", span.start, span.end),
            None => format!("{col}:{col}"),
        };
        format!("{}!{cells}", quote_sheet_title(&self.sheet))
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Quote a sheet title for A1 notation when it holds anything besides
/// ASCII alphanumerics and underscores. Embedded quotes are doubled.
pub fn quote_sheet_title(title: &str) -> String {
    let plain = !title.is_empty()
        && title
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}
