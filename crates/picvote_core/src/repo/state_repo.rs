//! Key-value state store and SQLite implementation.
//!
//! # Responsibility
//! - Read/write the `candidates`, `voteState` and `currentUser` records.
//! - Keep JSON shapes compatible with previously stored records.
//!
//! # Invariants
//! - A missing record loads as `None`, never as an error.
//! - A stored record that fails to decode or validate is `InvalidData`.
//! - Saves replace the whole record value.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::candidate::Candidate;
use crate::model::user::User;
use crate::model::vote_ledger::VoteLedger;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Record key for the candidate list.
pub const CANDIDATES_KEY: &str = "candidates";
/// Record key for the vote ledger.
pub const VOTE_STATE_KEY: &str = "voteState";
/// Record key for the current user (or `null`).
pub const CURRENT_USER_KEY: &str = "currentUser";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for state persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    InvalidData {
        key: &'static str,
        message: String,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid stored record `{key}`: {message}")
            }
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode { source, .. } => Some(source),
            Self::InvalidData { .. } | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for the three gallery state records.
pub trait StateStore {
    fn load_candidates(&self) -> RepoResult<Option<Vec<Candidate>>>;
    fn save_candidates(&self, candidates: &[Candidate]) -> RepoResult<()>;
    fn load_vote_ledger(&self) -> RepoResult<Option<VoteLedger>>;
    fn save_vote_ledger(&self, ledger: &VoteLedger) -> RepoResult<()>;
    /// `None` covers both a missing record and a stored `null`.
    fn load_current_user(&self) -> RepoResult<Option<User>>;
    fn save_current_user(&self, user: Option<&User>) -> RepoResult<()>;
}

/// SQLite-backed state store over the `kv_records` table.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        if !table_exists(&conn, "kv_records")? {
            return Err(RepoError::MissingRequiredTable("kv_records"));
        }
        Ok(Self { conn })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Reads the raw stored text of one record.
    pub fn get_raw(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_records WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Replaces the raw stored text of one record.
    pub fn put_raw(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_records (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_json<T: DeserializeOwned>(&self, key: &'static str) -> RepoResult<Option<T>> {
        let Some(text) = self.get_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| RepoError::InvalidData {
                key,
                message: err.to_string(),
            })
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> RepoResult<()> {
        let text =
            serde_json::to_string(value).map_err(|source| RepoError::Encode { key, source })?;
        self.put_raw(key, &text)
    }
}

impl StateStore for SqliteStateStore {
    fn load_candidates(&self) -> RepoResult<Option<Vec<Candidate>>> {
        let Some(candidates) = self.load_json::<Vec<Candidate>>(CANDIDATES_KEY)? else {
            return Ok(None);
        };
        validate_candidates(&candidates)?;
        Ok(Some(candidates))
    }

    fn save_candidates(&self, candidates: &[Candidate]) -> RepoResult<()> {
        self.save_json(CANDIDATES_KEY, candidates)
    }

    fn load_vote_ledger(&self) -> RepoResult<Option<VoteLedger>> {
        self.load_json(VOTE_STATE_KEY)
    }

    fn save_vote_ledger(&self, ledger: &VoteLedger) -> RepoResult<()> {
        self.save_json(VOTE_STATE_KEY, ledger)
    }

    fn load_current_user(&self) -> RepoResult<Option<User>> {
        Ok(self.load_json::<Option<User>>(CURRENT_USER_KEY)?.flatten())
    }

    fn save_current_user(&self, user: Option<&User>) -> RepoResult<()> {
        self.save_json(CURRENT_USER_KEY, &user)
    }
}

fn validate_candidates(candidates: &[Candidate]) -> RepoResult<()> {
    let mut seen = HashSet::new();
    for candidate in candidates {
        candidate
            .validate()
            .map_err(|err| RepoError::InvalidData {
                key: CANDIDATES_KEY,
                message: format!("candidate `{}`: {err}", candidate.id),
            })?;
        if !seen.insert(candidate.id.as_str()) {
            return Err(RepoError::InvalidData {
                key: CANDIDATES_KEY,
                message: format!("duplicate candidate id `{}`", candidate.id),
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
