//! Turning a key column plus an ability map into as few range writes as possible.

use super::extract::AbilityXpMap;
use crate::document::ValueWrite;
use crate::range::{Column, ColumnRange, RowSpan};
use serde::Serialize;

/// A contiguous run of rows in one column, written with a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeWrite {
    pub column: Column,
    pub row_start: u32,
    pub row_end: u32,
    pub values: Vec<Option<i64>>,
}

impl RangeWrite {
    pub fn span(&self) -> RowSpan {
        RowSpan::new_unchecked(self.row_start, self.row_end)
    }

    pub fn to_value_write(&self, sheet: &str) -> ValueWrite {
        ValueWrite {
            range: ColumnRange::rows(sheet, self.column, self.span()),
            values: self.values.clone(),
        }
    }
}

struct OpenRun {
    start: u32,
    values: Vec<Option<i64>>,
}

impl OpenRun {
    fn close(self, column: Column) -> RangeWrite {
        RangeWrite {
            column,
            row_start: self.start,
            row_end: self.start + self.values.len() as u32 - 1,
            values: self.values,
        }
    }
}

/// Walk `keys` (row 1 first) and group every row whose key is in `abilities`
/// into maximal runs. A row whose key is blank or unknown ends the current
/// run and is never written. Runs come out in row order.
pub fn write_plan<S: AsRef<str>>(
    keys: &[S],
    abilities: &AbilityXpMap,
    value_column: Column,
) -> Vec<RangeWrite> {
    let mut plan = Vec::new();
    let mut open: Option<OpenRun> = None;

    for (i, key) in keys.iter().enumerate() {
        let row = i as u32 + 1;
        let key = key.as_ref().trim();
        let found = if key.is_empty() {
            None
        } else {
            abilities.get(key).copied()
        };
        if let Some(xp) = found {
            open.get_or_insert_with(|| OpenRun {
                start: row,
                values: Vec::new(),
            })
            .values
            .push(Some(xp));
        } else if let Some(run) = open.take() {
            plan.push(run.close(value_column));
        }
    }
    if let Some(run) = open.take() {
        plan.push(run.close(value_column));
    }
    plan
}
