//! SQLite-backed user directory implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{NewUser, Role, User, UserDirectory};
use crate::error::BookingError;

const USER_COLUMNS: &str = "id, username, role, created_at";

/// SQLite-backed user directory.
pub struct SqliteUserDirectory {
    conn: Mutex<Connection>,
}

impl SqliteUserDirectory {
    /// Open (or create) the directory at `path`.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, BookingError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory directory (useful for testing).
    pub fn in_memory() -> Result<Self, BookingError> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(crate::ticket::DEFAULT_BUSY_TIMEOUT)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), BookingError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let role_str: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;

        let role = Role::parse(&role_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            role,
            created_at,
        })
    }
}

impl UserDirectory for SqliteUserDirectory {
    fn create(&self, user: NewUser) -> Result<User, BookingError> {
        let username = user.username.trim();
        if username.is_empty() {
            return Err(BookingError::Validation(
                "username must not be blank".to_string(),
            ));
        }

        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        // The UNIQUE constraint turns a duplicate username into Conflict.
        conn.execute(
            "INSERT INTO users (username, role, created_at) VALUES (?, ?, ?)",
            params![username, user.role.as_str(), now.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!(user_id = id, username, role = %user.role, "user registered");

        Ok(User {
            id,
            username: username.to_string(),
            role: user.role,
            created_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<User>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_by_username(&self, username: &str) -> Result<Option<User>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        match conn.query_row(&sql, params![username], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<User>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM users ORDER BY username ASC", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}
