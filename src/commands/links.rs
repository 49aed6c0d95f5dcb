use crate::commands::db;
use crate::models::modifications::ReleaseContext;
use serde_json::{json, Value};
use std::path::Path;

/// Record a manual issue/commit link for the context.
pub fn record_match(
    data_dir: &Path,
    context: &ReleaseContext,
    issue_id: &str,
    commit_id: &str,
) -> Result<Value, String> {
    let conn = db::get_db_connection(data_dir).map_err(|e| format!("DB error: {e}"))?;
    db::record_manual_match(&conn, &context.context_key(), issue_id, commit_id)
        .map_err(|e| format!("Insert error: {e}"))?;
    Ok(json!({"status": "matched", "issueId": issue_id, "commitId": commit_id}))
}

/// Record a sticky unmatch for the context; the pair will not be
/// auto-matched again until the user re-links it manually.
pub fn record_unmatch(
    data_dir: &Path,
    context: &ReleaseContext,
    item1_id: &str,
    item2_id: &str,
) -> Result<Value, String> {
    let conn = db::get_db_connection(data_dir).map_err(|e| format!("DB error: {e}"))?;
    db::record_unmatch(&conn, &context.context_key(), item1_id, item2_id)
        .map_err(|e| format!("Insert error: {e}"))?;
    Ok(json!({"status": "unmatched", "item1Id": item1_id, "item2Id": item2_id}))
}

/// Set or clear the needs-action flag on one item.
pub fn set_flag(
    data_dir: &Path,
    context: &ReleaseContext,
    item_id: &str,
    flagged: bool,
) -> Result<Value, String> {
    let conn = db::get_db_connection(data_dir).map_err(|e| format!("DB error: {e}"))?;
    db::set_flag(&conn, &context.context_key(), item_id, flagged)
        .map_err(|e| format!("Update error: {e}"))?;
    Ok(json!({"status": if flagged { "flagged" } else { "unflagged" }, "itemId": item_id}))
}

/// Drop every stored modification for the context.
pub fn reset_context(data_dir: &Path, context: &ReleaseContext) -> Result<Value, String> {
    let conn = db::get_db_connection(data_dir).map_err(|e| format!("DB error: {e}"))?;
    db::clear_context(&conn, &context.context_key()).map_err(|e| format!("Delete error: {e}"))?;
    Ok(json!({"status": "reset", "contextKey": context.context_key()}))
}
