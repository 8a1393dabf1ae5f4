use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::StoreError;

/// An admin login. Valid while `now < expires_at`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: NaiveDateTime,
}

impl Session {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Session {
            token: row.get("token")?,
            user_id: row.get("user_id")?,
            expires_at: row.get("expires_at")?,
        })
    }

    /// Plain insert: a duplicate token surfaces as a constraint error.
    pub fn insert(pool: &DbPool, session: &Session) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![session.token, session.user_id, session.expires_at],
        )?;
        Ok(())
    }

    /// Only returns rows that have not expired as of `now`.
    pub fn find_valid(
        pool: &DbPool,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<Self>, StoreError> {
        let conn = pool.get()?;
        let session = conn
            .query_row(
                "SELECT token, user_id, expires_at FROM sessions
                 WHERE token = ?1 AND expires_at > ?2",
                params![token, now],
                Self::from_row,
            )
            .optional()?;
        Ok(session)
    }

    pub fn delete(pool: &DbPool, token: &str) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    pub fn purge_expired(pool: &DbPool, now: NaiveDateTime) -> Result<usize, StoreError> {
        let conn = pool.get()?;
        let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }
}
