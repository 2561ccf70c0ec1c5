use surrealdb::RecordId;

use crate::errors::{Error, Result};

/// Parses `table:key` (the form `RecordId` displays as) back into a record id.
pub fn get_record_id_from_string(val: &str) -> Result<RecordId> {
    let mut id_part = val.trim().splitn(2, ':');
    let table = id_part
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::InvalidRecordId(val.to_string()))?;
    let key = id_part
        .next()
        .map(|k| k.trim_start_matches('⟨').trim_end_matches('⟩'))
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::InvalidRecordId(val.to_string()))?;
    Ok(RecordId::from_table_key(table, key))
}
