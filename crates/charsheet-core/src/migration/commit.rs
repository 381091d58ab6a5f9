//! Submitting the planned writes and promoting the staging sheet.

use super::coalesce::RangeWrite;
use super::topology::{MigrationTitles, SheetTopology, TopologyState};
use crate::document::{DocumentClient, SheetRequest};
use crate::error::{MigrationError, SheetError};
use tracing::info;

/// Send every planned range in one batched write. An empty plan sends nothing.
pub fn submit_writes<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    staging_title: &str,
    plan: &[RangeWrite],
) -> Result<(), MigrationError> {
    if plan.is_empty() {
        info!(sheet = %staging_title, "no values to write");
        return Ok(());
    }
    let writes: Vec<_> = plan.iter().map(|w| w.to_value_write(staging_title)).collect();
    client
        .batch_write_values(doc_id, &writes)
        .map_err(|source| MigrationError::WriteFailed {
            sheet: staging_title.to_string(),
            source,
        })?;
    let cells: usize = plan.iter().map(|w| w.values.len()).sum();
    info!(sheet = %staging_title, ranges = plan.len(), cells, "wrote staging values");
    Ok(())
}

/// The rename/delete batch that promotes staging to current, computed from a
/// fresh snapshot taken after the writes.
pub fn commit_requests(
    state: TopologyState,
    snapshot: &SheetTopology,
) -> Result<Vec<SheetRequest>, SheetError> {
    let titles = &snapshot.titles;
    let staging = snapshot
        .properties(&titles.staging)
        .ok_or_else(|| SheetError::SheetNotFound(titles.staging.clone()))?;

    let mut requests = Vec::with_capacity(2);
    match state {
        TopologyState::Fresh => {
            let current = snapshot
                .properties(&titles.current)
                .ok_or_else(|| SheetError::SheetNotFound(titles.current.clone()))?;
            requests.push(SheetRequest::Rename {
                sheet_id: current.sheet_id,
                title: titles.old.clone(),
            });
        }
        TopologyState::Resume => {
            // Not expected after a RESUME classification, but the document
            // may have changed underneath us.
            if let Some(current) = snapshot.properties(&titles.current) {
                requests.push(SheetRequest::Delete {
                    sheet_id: current.sheet_id,
                });
            }
        }
    }
    requests.push(SheetRequest::Rename {
        sheet_id: staging.sheet_id,
        title: titles.current.clone(),
    });
    Ok(requests)
}

pub fn commit<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    state: TopologyState,
    titles: &MigrationTitles,
) -> Result<(), MigrationError> {
    let failed = |source| MigrationError::CommitFailed {
        sheet: titles.staging.clone(),
        source,
    };
    let sheets = client.list_sheets(doc_id).map_err(failed)?;
    let snapshot = SheetTopology::snapshot(&titles.current, &sheets);
    let requests = commit_requests(state, &snapshot).map_err(failed)?;
    client.batch_update(doc_id, &requests).map_err(failed)?;
    info!(
        character = %titles.current,
        state = %state,
        requests = requests.len(),
        "promoted staging sheet"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SheetProperties;
    use crate::memory::{InMemoryDocument, Operation};
    use crate::range::Column;

    fn snapshot(titles: &[(&str, i64)]) -> SheetTopology {
        let sheets: Vec<SheetProperties> = titles
            .iter()
            .enumerate()
            .map(|(i, (t, id))| SheetProperties {
                sheet_id: *id,
                title: t.to_string(),
                index: i as u32,
            })
            .collect();
        SheetTopology::snapshot("Hero", &sheets)
    }

    #[test]
    fn fresh_archives_current_then_promotes() {
        let snap = snapshot(&[("Hero", 1), ("Hero_new", 2)]);
        let reqs = commit_requests(TopologyState::Fresh, &snap).unwrap();
        assert_eq!(
            reqs,
            vec![
                SheetRequest::Rename {
                    sheet_id: 1,
                    title: "Hero_old".into()
                },
                SheetRequest::Rename {
                    sheet_id: 2,
                    title: "Hero".into()
                },
            ]
        );
    }

    #[test]
    fn resume_only_promotes() {
        let snap = snapshot(&[("Hero_old", 1), ("Hero_new", 2)]);
        let reqs = commit_requests(TopologyState::Resume, &snap).unwrap();
        assert_eq!(
            reqs,
            vec![SheetRequest::Rename {
                sheet_id: 2,
                title: "Hero".into()
            }]
        );
    }

    #[test]
    fn resume_deletes_a_reappeared_current() {
        let snap = snapshot(&[("Hero_old", 1), ("Hero", 3), ("Hero_new", 2)]);
        let reqs = commit_requests(TopologyState::Resume, &snap).unwrap();
        assert_eq!(reqs[0], SheetRequest::Delete { sheet_id: 3 });
        assert_eq!(reqs.len(), 2);
    }

    #[test]
    fn missing_staging_sheet_is_an_error() {
        let snap = snapshot(&[("Hero", 1)]);
        let err = commit_requests(TopologyState::Fresh, &snap).unwrap_err();
        assert!(matches!(err, SheetError::SheetNotFound(ref t) if t == "Hero_new"));
    }

    #[test]
    fn empty_plan_skips_remote_write() {
        let doc = InMemoryDocument::new("doc");
        doc.add_sheet("Hero_new");
        submit_writes(&doc, "doc", "Hero_new", &[]).unwrap();
        assert_eq!(doc.calls(Operation::BatchWrite), 0);
    }

    #[test]
    fn plan_is_one_batched_write() {
        let doc = InMemoryDocument::new("doc");
        doc.add_sheet("Hero_new");
        let plan = vec![
            RangeWrite {
                column: Column::D,
                row_start: 1,
                row_end: 2,
                values: vec![Some(1), Some(2)],
            },
            RangeWrite {
                column: Column::D,
                row_start: 5,
                row_end: 5,
                values: vec![Some(4)],
            },
        ];
        submit_writes(&doc, "doc", "Hero_new", &plan).unwrap();
        assert_eq!(doc.calls(Operation::BatchWrite), 1);
        assert_eq!(doc.cell("Hero_new", Column::D, 2).as_deref(), Some("2"));
        assert_eq!(doc.cell("Hero_new", Column::D, 3), None);
        assert_eq!(doc.cell("Hero_new", Column::D, 5).as_deref(), Some("4"));
    }

    #[test]
    fn commit_failure_leaves_staging_in_place() {
        let doc = InMemoryDocument::new("doc");
        doc.add_sheet("Hero");
        doc.add_sheet("Hero_new");
        doc.fail_next(Operation::BatchUpdate, 1);
        let titles = MigrationTitles::for_character("Hero");
        let err = commit(&doc, "doc", TopologyState::Fresh, &titles).unwrap_err();
        assert!(matches!(err, MigrationError::CommitFailed { ref sheet, .. } if sheet == "Hero_new"));
        assert_eq!(doc.titles(), vec!["Hero", "Hero_new"]);
    }
}
