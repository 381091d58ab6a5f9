//! Creating a clean staging sheet from the template.

use crate::document::{DocumentClient, SheetId, SheetProperties, SheetReply, SheetRequest};
use crate::error::{MigrationError, SheetError};
use tracing::info;

/// Inputs for one staging sheet preparation.
#[derive(Debug, Clone)]
pub struct StagingRequest<'a> {
    pub template: &'a SheetProperties,
    /// Index of the source sheet; the staging copy lands right after it.
    pub insert_after_index: u32,
    pub new_title: &'a str,
    /// A staging sheet left over from an earlier run.
    pub existing: Option<&'a SheetProperties>,
}

/// The delete-if-present and duplicate requests, as one batch.
///
/// Requests in a batch apply in order, so when the stale sheet sits before
/// the insertion point the target index moves down by one.
pub fn staging_requests(req: &StagingRequest<'_>) -> Vec<SheetRequest> {
    let mut insert_index = req.insert_after_index + 1;
    let mut requests = Vec::with_capacity(2);
    if let Some(stale) = req.existing {
        requests.push(SheetRequest::Delete {
            sheet_id: stale.sheet_id,
        });
        if stale.index < insert_index {
            insert_index -= 1;
        }
    }
    requests.push(SheetRequest::Duplicate {
        source_sheet_id: req.template.sheet_id,
        insert_index,
        new_title: req.new_title.to_string(),
    });
    requests
}

pub fn prepare_staging_sheet<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    req: &StagingRequest<'_>,
) -> Result<SheetId, MigrationError> {
    let failed = |source| MigrationError::StagingFailed {
        sheet: req.new_title.to_string(),
        source,
    };
    if req.existing.is_some() {
        info!(sheet = %req.new_title, "discarding stale staging sheet");
    }
    let requests = staging_requests(req);
    let replies = client.batch_update(doc_id, &requests).map_err(failed)?;
    let created = replies.into_iter().find_map(|r| match r {
        SheetReply::Duplicated(props) => Some(props),
        SheetReply::Empty => None,
    });
    let props = created.ok_or_else(|| {
        failed(SheetError::UnexpectedResponse(format!(
            "duplicate of '{}' returned no sheet",
            req.template.title
        )))
    })?;
    info!(
        sheet = %props.title,
        sheet_id = props.sheet_id,
        index = props.index,
        template = %req.template.title,
        "created staging sheet"
    );
    Ok(props.sheet_id)
}
