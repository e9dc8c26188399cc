//! SQLite-backed match ledger

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::ledger::{MatchLedger, MatchRecord, NewMatch, UserId};
use crate::tournament::Outcome;

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened match ledger");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS matches (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             user_id INTEGER NOT NULL,
             player_hand INTEGER NOT NULL,
             opponent_hand INTEGER NOT NULL,
             outcome TEXT NOT NULL,
             played_at TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS matches_by_user
             ON matches (user_id, played_at DESC, id DESC);",
    )?;
    Ok(())
}

fn to_sql_int<T: TryInto<i64>>(field: &str, value: T) -> Result<i64, LedgerError> {
    value
        .try_into()
        .map_err(|_| LedgerError::Storage(format!("{field} does not fit in an SQLite integer")))
}

fn from_sql_int<T: TryFrom<i64>>(field: &str, value: i64) -> Result<T, LedgerError> {
    T::try_from(value).map_err(|_| LedgerError::Corrupt(format!("{field} out of range: {value}")))
}

struct RawRow {
    id: i64,
    user_id: i64,
    player_hand: i64,
    opponent_hand: i64,
    outcome: String,
    played_at: DateTime<Utc>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            player_hand: row.get(2)?,
            opponent_hand: row.get(3)?,
            outcome: row.get(4)?,
            played_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<MatchRecord, LedgerError> {
        let outcome = Outcome::parse(&self.outcome)
            .ok_or_else(|| LedgerError::Corrupt(format!("unknown outcome {:?}", self.outcome)))?;
        Ok(MatchRecord {
            id: from_sql_int("id", self.id)?,
            user_id: from_sql_int("user_id", self.user_id)?,
            player_hand: from_sql_int("player_hand", self.player_hand)?,
            opponent_hand: from_sql_int("opponent_hand", self.opponent_hand)?,
            outcome,
            played_at: self.played_at,
        })
    }
}

impl MatchLedger for SqliteLedger {
    fn append(&self, entry: NewMatch) -> Result<MatchRecord, LedgerError> {
        let conn = self.conn.lock().map_err(|_| LedgerError::Poisoned)?;
        conn.execute(
            "INSERT INTO matches (user_id, player_hand, opponent_hand, outcome, played_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                to_sql_int("user_id", entry.user_id)?,
                to_sql_int("player_hand", entry.player_hand)?,
                to_sql_int("opponent_hand", entry.opponent_hand)?,
                entry.outcome.label(),
                entry.played_at,
            ],
        )?;
        let id: u64 = from_sql_int("id", conn.last_insert_rowid())?;
        debug!(id, user = entry.user_id, "stored match record");
        Ok(MatchRecord::from_new(id, entry))
    }

    fn records_for(&self, user: UserId) -> Result<Vec<MatchRecord>, LedgerError> {
        let conn = self.conn.lock().map_err(|_| LedgerError::Poisoned)?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, player_hand, opponent_hand, outcome, played_at
             FROM matches WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map(params![to_sql_int("user_id", user)?], RawRow::read)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(user_id: UserId, secs: i64, outcome: Outcome) -> NewMatch {
        NewMatch {
            user_id,
            player_hand: 3,
            opponent_hand: 6,
            outcome,
            played_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let first = ledger.append(entry(1, 100, Outcome::Win)).unwrap();
        let second = ledger.append(entry(1, 200, Outcome::Draw)).unwrap();
        ledger.append(entry(2, 300, Outcome::Lose)).unwrap();

        assert!(second.id > first.id);

        let mut records = ledger.records_for(1).unwrap();
        records.sort_by_key(|r| r.id);
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        assert!(ledger.records_for(42).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unrepresentable_user() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        let err = ledger.append(entry(u64::MAX, 1, Outcome::Win)).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_corrupt_outcome_is_reported() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.append(entry(5, 1, Outcome::Win)).unwrap();
        ledger
            .conn
            .lock()
            .unwrap()
            .execute("UPDATE matches SET outcome = 'forfeit'", [])
            .unwrap();
        let err = ledger.records_for(5).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt(_)));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("hand-logic-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ledger.db");
        let _ = std::fs::remove_file(&path);

        let id = {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.append(entry(9, 10, Outcome::Lose)).unwrap().id
        };
        let ledger = SqliteLedger::open(&path).unwrap();
        let records = ledger.records_for(9).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].outcome, Outcome::Lose);

        let next = ledger.append(entry(9, 11, Outcome::Win)).unwrap();
        assert!(next.id > id);

        drop(ledger);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
