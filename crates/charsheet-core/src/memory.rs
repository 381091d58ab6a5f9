//! An in-process [`DocumentClient`] holding sheets as sparse cell maps.
//!
//! Mirrors the behaviours of the remote store the workflow depends on:
//! trailing empty rows are cut from reads, a structural batch applies
//! all-or-nothing, and reads against an unknown sheet fail like an
//! unparseable range. Failures can be injected per operation.

use crate::document::{
    DocumentClient, SheetId, SheetProperties, SheetReply, SheetRequest, ValueRange, ValueWrite,
};
use crate::error::{Result, SheetError};
use crate::range::{Column, ColumnRange};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Cells of one sheet keyed by `(row, column)`, rows 1-indexed.
pub type Cells = BTreeMap<(u32, u32), String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListSheets,
    BatchGet,
    BatchUpdate,
    BatchWrite,
}

#[derive(Debug, Clone)]
struct Sheet {
    props: SheetProperties,
    cells: Cells,
}

/// Calls to let through before failing, then how many to fail.
#[derive(Debug, Clone, Copy, Default)]
struct Injected {
    skip: usize,
    fail: usize,
}

#[derive(Debug, Clone, Default)]
struct State {
    sheets: Vec<Sheet>,
    next_id: SheetId,
    failures: HashMap<Operation, Injected>,
    calls: HashMap<Operation, usize>,
}

impl State {
    fn sheet(&self, title: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.props.title == title)
    }

    fn sheet_mut(&mut self, title: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.props.title == title)
    }

    fn position_of(&self, id: SheetId) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.props.sheet_id == id)
            .ok_or_else(|| bad_request(format!("No sheet with id: {id}")))
    }

    fn reindex(&mut self) {
        self.sheets.sort_by_key(|s| s.props.index);
        for (i, sheet) in self.sheets.iter_mut().enumerate() {
            sheet.props.index = i as u32;
        }
    }

    fn apply(&mut self, request: &SheetRequest) -> Result<SheetReply> {
        match request {
            SheetRequest::Delete { sheet_id } => {
                let pos = self.position_of(*sheet_id)?;
                self.sheets.remove(pos);
                self.reindex();
                Ok(SheetReply::Empty)
            }
            SheetRequest::Duplicate {
                source_sheet_id,
                insert_index,
                new_title,
            } => {
                let pos = self.position_of(*source_sheet_id)?;
                if self.sheet(new_title).is_some() {
                    return Err(bad_request(format!(
                        "A sheet with the name \"{new_title}\" already exists."
                    )));
                }
                let index = (*insert_index).min(self.sheets.len() as u32);
                for sheet in &mut self.sheets {
                    if sheet.props.index >= index {
                        sheet.props.index += 1;
                    }
                }
                let props = SheetProperties {
                    sheet_id: self.next_id,
                    title: new_title.clone(),
                    index,
                };
                self.next_id += 1;
                let cells = self.sheets[pos].cells.clone();
                self.sheets.push(Sheet {
                    props: props.clone(),
                    cells,
                });
                self.reindex();
                Ok(SheetReply::Duplicated(props))
            }
            SheetRequest::Rename { sheet_id, title } => {
                let pos = self.position_of(*sheet_id)?;
                if self
                    .sheets
                    .iter()
                    .any(|s| s.props.title == *title && s.props.sheet_id != *sheet_id)
                {
                    return Err(bad_request(format!(
                        "A sheet with the name \"{title}\" already exists."
                    )));
                }
                self.sheets[pos].props.title = title.clone();
                Ok(SheetReply::Empty)
            }
        }
    }

    fn read(&self, range: &ColumnRange) -> Result<ValueRange> {
        let sheet = self
            .sheet(&range.sheet)
            .ok_or_else(|| bad_request(format!("Unable to parse range: {range}")))?;
        let col = range.column.index();
        let (start, end) = match range.rows {
            Some(span) => (span.start(), span.end()),
            None => {
                let last = sheet
                    .cells
                    .keys()
                    .filter(|(_, c)| *c == col)
                    .map(|(r, _)| *r)
                    .max()
                    .unwrap_or(0);
                (1, last)
            }
        };
        let mut rows: Vec<Vec<String>> = (start..=end)
            .map(|row| match sheet.cells.get(&(row, col)) {
                Some(v) if !v.is_empty() => vec![v.clone()],
                _ => Vec::new(),
            })
            .collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Ok(ValueRange::new(rows))
    }

    fn write(&mut self, write: &ValueWrite) -> Result<()> {
        let span = write
            .range
            .rows
            .ok_or_else(|| bad_request(format!("unbounded write range {}", write.range)))?;
        if span.row_count() < write.values.len() {
            return Err(bad_request(format!(
                "Requested writing within range [{}], but tried writing {} rows",
                write.range,
                write.values.len()
            )));
        }
        let col = write.range.column.index();
        let sheet = self
            .sheet_mut(&write.range.sheet)
            .ok_or_else(|| bad_request(format!("Unable to parse range: {}", write.range)))?;
        for (offset, value) in write.values.iter().enumerate() {
            let key = (span.start() + offset as u32, col);
            match value {
                Some(v) => {
                    sheet.cells.insert(key, v.to_string());
                }
                None => {
                    sheet.cells.remove(&key);
                }
            }
        }
        Ok(())
    }
}

fn bad_request(message: String) -> SheetError {
    SheetError::Api {
        status: 400,
        message,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDocument {
    doc_id: String,
    state: Mutex<State>,
}

impl InMemoryDocument {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_doc(&self, doc_id: &str) -> Result<()> {
        if doc_id != self.doc_id {
            return Err(SheetError::Api {
                status: 404,
                message: format!("Requested entity was not found: {doc_id}"),
            });
        }
        Ok(())
    }

    /// Count the call and consume an injected failure if one is pending.
    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(injected) = state.failures.get_mut(&op) {
            if injected.skip > 0 {
                injected.skip -= 1;
            } else if injected.fail > 0 {
                injected.fail -= 1;
                return Err(SheetError::Api {
                    status: 503,
                    message: format!("injected failure for {op:?}"),
                });
            }
        }
        Ok(state)
    }

    /// Append an empty sheet at the end and return its id.
    pub fn add_sheet(&self, title: &str) -> SheetId {
        let mut state = self.lock();
        let props = SheetProperties {
            sheet_id: state.next_id,
            title: title.to_string(),
            index: state.sheets.len() as u32,
        };
        state.next_id += 1;
        state.sheets.push(Sheet {
            props: props.clone(),
            cells: Cells::new(),
        });
        props.sheet_id
    }

    pub fn set_cell(&self, title: &str, column: Column, row: u32, value: &str) {
        let mut state = self.lock();
        if let Some(sheet) = state.sheet_mut(title) {
            sheet
                .cells
                .insert((row, column.index()), value.to_string());
        }
    }

    /// Write `values` downwards from `start_row`; empty strings leave the cell blank.
    pub fn set_column(&self, title: &str, column: Column, start_row: u32, values: &[&str]) {
        for (offset, value) in values.iter().enumerate() {
            if !value.is_empty() {
                self.set_cell(title, column, start_row + offset as u32, value);
            }
        }
    }

    pub fn cell(&self, title: &str, column: Column, row: u32) -> Option<String> {
        self.lock()
            .sheet(title)
            .and_then(|s| s.cells.get(&(row, column.index())).cloned())
    }

    pub fn cells(&self, title: &str) -> Option<Cells> {
        self.lock().sheet(title).map(|s| s.cells.clone())
    }

    /// Titles in index order.
    pub fn titles(&self) -> Vec<String> {
        let mut state = self.lock();
        state.reindex();
        state.sheets.iter().map(|s| s.props.title.clone()).collect()
    }

    pub fn properties(&self, title: &str) -> Option<SheetProperties> {
        self.lock().sheet(title).map(|s| s.props.clone())
    }

    /// Make the next `times` calls of `op` fail with a 503.
    pub fn fail_next(&self, op: Operation, times: usize) {
        self.fail_after(op, 0, times);
    }

    /// Let `skip` calls of `op` succeed, then fail the following `times`.
    pub fn fail_after(&self, op: Operation, skip: usize, times: usize) {
        self.lock()
            .failures
            .insert(op, Injected { skip, fail: times });
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }
}

impl DocumentClient for InMemoryDocument {
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetProperties>> {
        self.check_doc(doc_id)?;
        let state = self.enter(Operation::ListSheets)?;
        let mut props: Vec<SheetProperties> =
            state.sheets.iter().map(|s| s.props.clone()).collect();
        props.sort_by_key(|p| p.index);
        Ok(props)
    }

    fn batch_get_values(&self, doc_id: &str, ranges: &[ColumnRange]) -> Result<Vec<ValueRange>> {
        self.check_doc(doc_id)?;
        let state = self.enter(Operation::BatchGet)?;
        ranges.iter().map(|r| state.read(r)).collect()
    }

    fn batch_update(&self, doc_id: &str, requests: &[SheetRequest]) -> Result<Vec<SheetReply>> {
        self.check_doc(doc_id)?;
        let mut state = self.enter(Operation::BatchUpdate)?;
        let mut scratch = state.clone();
        let replies = requests
            .iter()
            .map(|r| scratch.apply(r))
            .collect::<Result<Vec<_>>>()?;
        scratch.failures = std::mem::take(&mut state.failures);
        scratch.calls = std::mem::take(&mut state.calls);
        *state = scratch;
        Ok(replies)
    }

    fn batch_write_values(&self, doc_id: &str, writes: &[ValueWrite]) -> Result<()> {
        self.check_doc(doc_id)?;
        let mut state = self.enter(Operation::BatchWrite)?;
        let mut scratch = state.clone();
        for write in writes {
            scratch.write(write)?;
        }
        scratch.failures = std::mem::take(&mut state.failures);
        scratch.calls = std::mem::take(&mut state.calls);
        *state = scratch;
        Ok(())
    }
}
