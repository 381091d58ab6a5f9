//! Reading ability experience values out of a legacy-layout sheet.

use crate::config::LegacyBlock;
use crate::document::{DocumentClient, ValueRange};
use crate::error::{MigrationError, Result, SheetError};
use crate::range::ColumnRange;
use std::collections::BTreeMap;
use tracing::info;

/// Ability name to experience value.
pub type AbilityXpMap = BTreeMap<String, i64>;

/// The key range and value range of every block, interleaved in that order.
pub fn block_ranges(sheet: &str, blocks: &[LegacyBlock]) -> Vec<ColumnRange> {
    blocks
        .iter()
        .flat_map(|b| {
            [
                ColumnRange::rows(sheet, b.key_column, b.rows),
                ColumnRange::rows(sheet, b.value_column, b.rows),
            ]
        })
        .collect()
}

/// Zip one block's key and value columns into `out`.
///
/// The store drops trailing empty cells, so `values` may be shorter than
/// `keys`; missing entries count as absent. Blank keys are skipped and a
/// present key without a value maps to 0.
fn merge_block(keys: &ValueRange, values: &ValueRange, out: &mut AbilityXpMap) -> Result<()> {
    let values = values.first_column();
    for (i, key) in keys.first_column().into_iter().enumerate() {
        let key = match key.map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => continue,
        };
        let raw = values.get(i).copied().flatten().map(str::trim).unwrap_or("");
        let xp = if raw.is_empty() {
            0
        } else {
            raw.parse::<i64>().map_err(|_| SheetError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            })?
        };
        out.insert(key.to_string(), xp);
    }
    Ok(())
}

/// Merge the interleaved key/value results of [`block_ranges`].
pub fn merge_value_ranges(results: &[ValueRange]) -> Result<AbilityXpMap> {
    if results.len() % 2 != 0 {
        return Err(SheetError::UnexpectedResponse(format!(
            "expected key/value range pairs, got {} ranges",
            results.len()
        )));
    }
    let mut map = AbilityXpMap::new();
    for pair in results.chunks(2) {
        merge_block(&pair[0], &pair[1], &mut map)?;
    }
    Ok(map)
}

/// Read all legacy blocks of `source` in one batched request.
pub fn extract<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    source: &str,
    blocks: &[LegacyBlock],
) -> std::result::Result<AbilityXpMap, MigrationError> {
    let failed = |source_err| MigrationError::ExtractionFailed {
        sheet: source.to_string(),
        source: source_err,
    };
    let ranges = block_ranges(source, blocks);
    let results = client
        .batch_get_values(doc_id, &ranges)
        .map_err(failed)?;
    let map = merge_value_ranges(&results).map_err(failed)?;
    info!(sheet = %source, abilities = map.len(), "extracted legacy values");
    Ok(map)
}
