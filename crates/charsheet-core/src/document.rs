//! The boundary to the remote tabular document.
//!
//! Everything the workflow needs from the backing store goes through
//! [`DocumentClient`]. Each call is one blocking request/response; batched
//! calls are applied by the store as one logical request but nothing here
//! relies on atomicity across unrelated batch items.

use crate::error::Result;
use crate::range::ColumnRange;
use serde::{Deserialize, Serialize};

pub type SheetId = i64;

/// Title, stable id and position of one sheet in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: SheetId,
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

/// Values returned for one requested range, row-major. Rows past the last
/// non-empty cell are omitted by the store, and an empty cell inside the
/// range comes back as an empty row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueRange {
    pub rows: Vec<Vec<String>>,
}

impl ValueRange {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// First cell of every returned row; `None` for rows with no cells.
    pub fn first_column(&self) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row.first().map(String::as_str))
            .collect()
    }
}

/// One sub-request of a structural batch update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRequest {
    Delete {
        sheet_id: SheetId,
    },
    Duplicate {
        source_sheet_id: SheetId,
        insert_index: u32,
        new_title: String,
    },
    Rename {
        sheet_id: SheetId,
        title: String,
    },
}

/// Reply to one [`SheetRequest`], in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetReply {
    Empty,
    Duplicated(SheetProperties),
}

/// A block of values destined for one contiguous one-column range.
/// `None` clears the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueWrite {
    pub range: ColumnRange,
    pub values: Vec<Option<i64>>,
}

pub trait DocumentClient {
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetProperties>>;

    /// Read several ranges in one request; results come back in request order.
    fn batch_get_values(&self, doc_id: &str, ranges: &[ColumnRange]) -> Result<Vec<ValueRange>>;

    /// Apply delete/duplicate/rename requests as one logical request.
    fn batch_update(&self, doc_id: &str, requests: &[SheetRequest]) -> Result<Vec<SheetReply>>;

    fn batch_write_values(&self, doc_id: &str, writes: &[ValueWrite]) -> Result<()>;
}

impl<T: DocumentClient + ?Sized> DocumentClient for &T {
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetProperties>> {
        (**self).list_sheets(doc_id)
    }

    fn batch_get_values(&self, doc_id: &str, ranges: &[ColumnRange]) -> Result<Vec<ValueRange>> {
        (**self).batch_get_values(doc_id, ranges)
    }

    fn batch_update(&self, doc_id: &str, requests: &[SheetRequest]) -> Result<Vec<SheetReply>> {
        (**self).batch_update(doc_id, requests)
    }

    fn batch_write_values(&self, doc_id: &str, writes: &[ValueWrite]) -> Result<()> {
        (**self).batch_write_values(doc_id, writes)
    }
}

pub fn find_sheet<'a>(sheets: &'a [SheetProperties], title: &str) -> Option<&'a SheetProperties> {
    sheets.iter().find(|s| s.title == title)
}
