use crate::models::modifications::{ManualMatch, UnmatchedPair, UserModifications};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        // Future schema; do not fail reads/writes for forward-compatible changes.
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS manual_matches (
            context_key TEXT NOT NULL,
            issue_id TEXT NOT NULL,
            commit_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (context_key, issue_id, commit_id)
        );

        CREATE TABLE IF NOT EXISTS user_unmatches (
            context_key TEXT NOT NULL,
            item1_id TEXT NOT NULL,
            item2_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (context_key, item1_id, item2_id)
        );

        CREATE TABLE IF NOT EXISTS flagged_items (
            context_key TEXT NOT NULL,
            item_id TEXT NOT NULL,
            flagged INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (context_key, item_id)
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_manual_matches_context ON manual_matches(context_key);
        CREATE INDEX IF NOT EXISTS idx_user_unmatches_context ON user_unmatches(context_key);
        CREATE INDEX IF NOT EXISTS idx_flagged_items_context ON flagged_items(context_key);
        ",
    )
}

/// Default location: `<platform data dir>/releaselens/state.db`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("releaselens")
}

pub fn get_db_connection(data_dir: &Path) -> Result<Connection> {
    std::fs::create_dir_all(data_dir).ok();
    let conn = Connection::open(data_dir.join("state.db"))?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// Load everything the user changed by hand for one context. A context
/// with no rows yields empty modifications, not an error.
pub fn load_user_modifications(conn: &Connection, context_key: &str) -> Result<UserModifications> {
    let mut mods = UserModifications::default();

    let mut stmt = conn.prepare(
        "SELECT issue_id, commit_id FROM manual_matches WHERE context_key = ?1 ORDER BY created_at ASC, issue_id ASC, commit_id ASC",
    )?;
    mods.manual_matches = stmt
        .query_map(params![context_key], |row| {
            Ok(ManualMatch {
                issue_id: row.get(0)?,
                commit_id: row.get(1)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut stmt = conn.prepare(
        "SELECT item1_id, item2_id FROM user_unmatches WHERE context_key = ?1 ORDER BY created_at ASC, item1_id ASC, item2_id ASC",
    )?;
    mods.user_unmatches = stmt
        .query_map(params![context_key], |row| {
            Ok(UnmatchedPair {
                item1_id: row.get(0)?,
                item2_id: row.get(1)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut stmt =
        conn.prepare("SELECT item_id, flagged FROM flagged_items WHERE context_key = ?1")?;
    mods.flagged_items = stmt
        .query_map(params![context_key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)? != 0))
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(mods)
}

/// Record a manual issue/commit link. A manual match supersedes an
/// earlier unmatch of the same pair, so that row is removed too.
pub fn record_manual_match(
    conn: &Connection,
    context_key: &str,
    issue_id: &str,
    commit_id: &str,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let (a, b) = ordered_pair(issue_id, commit_id);

    conn.execute(
        "DELETE FROM user_unmatches WHERE context_key = ?1 AND item1_id = ?2 AND item2_id = ?3",
        params![context_key, a, b],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO manual_matches (context_key, issue_id, commit_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![context_key, issue_id, commit_id, now],
    )?;

    Ok(())
}

/// Record that a pair must never be auto-matched again. Drops any
/// manual match of the same pair in either direction.
pub fn record_unmatch(conn: &Connection, context_key: &str, a: &str, b: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let (first, second) = ordered_pair(a, b);

    conn.execute(
        "DELETE FROM manual_matches WHERE context_key = ?1 AND ((issue_id = ?2 AND commit_id = ?3) OR (issue_id = ?3 AND commit_id = ?2))",
        params![context_key, a, b],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO user_unmatches (context_key, item1_id, item2_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![context_key, first, second, now],
    )?;

    Ok(())
}

pub fn set_flag(conn: &Connection, context_key: &str, item_id: &str, flagged: bool) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT OR REPLACE INTO flagged_items (context_key, item_id, flagged, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![context_key, item_id, flagged as i32, now],
    )?;
    Ok(())
}

/// Drop every stored modification for one context.
pub fn clear_context(conn: &Connection, context_key: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM manual_matches WHERE context_key = ?1",
        params![context_key],
    )?;
    tx.execute(
        "DELETE FROM user_unmatches WHERE context_key = ?1",
        params![context_key],
    )?;
    tx.execute(
        "DELETE FROM flagged_items WHERE context_key = ?1",
        params![context_key],
    )?;
    tx.commit()
}

/// Unordered pairs are stored smaller-id-first so {A,B} and {B,A} hit
/// the same row.
fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
