//! SQLite-backed showing store implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewShowing, SessionStore, Showing};
use crate::error::BookingError;

const SHOWING_COLUMNS: &str = "id, movie_title, date, start_time, end_time, capacity, price";

/// SQLite-backed showing store.
///
/// Dates and times are stored as ISO-8601 TEXT, which makes the overlap
/// comparison a plain lexicographic one in SQL.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the store at `path`. Storage calls wait at most
    /// `busy_timeout` on a locked database before failing with `Timeout`.
    pub fn new(path: &Path, busy_timeout: Duration) -> Result<Self, BookingError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
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
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_title TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                capacity INTEGER NOT NULL,
                price REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_title_date ON sessions(movie_title, date);
            "#,
        )?;
        Ok(())
    }

    fn row_to_showing(row: &rusqlite::Row) -> rusqlite::Result<Showing> {
        let date_str: String = row.get(2)?;
        let start_str: String = row.get(3)?;
        let end_str: String = row.get(4)?;

        let date = parse_date(2, &date_str)?;
        let starts_at = parse_time(3, &start_str)?;
        let ends_at = parse_time(4, &end_str)?;

        Ok(Showing {
            id: row.get(0)?,
            movie_title: row.get(1)?,
            date,
            starts_at,
            ends_at,
            capacity: row.get(5)?,
            price: row.get(6)?,
        })
    }

    fn get_locked(conn: &Connection, id: i64) -> Result<Showing, BookingError> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?", SHOWING_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_showing) {
            Ok(showing) => Ok(showing),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(BookingError::NotFound(format!("showing {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Does any showing of the same film on the same date overlap the
    /// [start, end) interval, other than `exclude`? Two intervals overlap
    /// iff each one starts before the other ends.
    fn overlap_exists(
        conn: &Connection,
        showing: &NewShowing,
        exclude: Option<i64>,
    ) -> Result<bool, BookingError> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sessions
                 WHERE movie_title = ? AND date = ?
                   AND start_time < ? AND ? < end_time
                   AND id != ?",
                params![
                    showing.movie_title,
                    showing.date.to_string(),
                    showing.ends_at.to_string(),
                    showing.starts_at.to_string(),
                    exclude.unwrap_or(-1),
                ],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid date: {}", s).into(),
        )
    })
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    s.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid time: {}", s).into(),
        )
    })
}

impl SessionStore for SqliteSessionStore {
    fn insert_if_no_overlap(&self, showing: NewShowing) -> Result<Showing, BookingError> {
        let conn = self.conn.lock().unwrap();

        // Check and insert under the same connection lock so the pair is
        // atomic with respect to every other store call.
        if Self::overlap_exists(&conn, &showing, None)? {
            return Err(BookingError::Conflict(format!(
                "'{}' already has a showing on {} overlapping {}-{}",
                showing.movie_title, showing.date, showing.starts_at, showing.ends_at
            )));
        }

        conn.execute(
            "INSERT INTO sessions (movie_title, date, start_time, end_time, capacity, price)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                showing.movie_title,
                showing.date.to_string(),
                showing.starts_at.to_string(),
                showing.ends_at.to_string(),
                showing.capacity,
                showing.price,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(showing_id = id, title = %showing.movie_title, date = %showing.date, "showing scheduled");

        Ok(Showing {
            id,
            movie_title: showing.movie_title,
            date: showing.date,
            starts_at: showing.starts_at,
            ends_at: showing.ends_at,
            capacity: showing.capacity,
            price: showing.price,
        })
    }

    fn update_if_no_overlap(
        &self,
        id: i64,
        showing: NewShowing,
    ) -> Result<Showing, BookingError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)?;

        if Self::overlap_exists(&conn, &showing, Some(id))? {
            return Err(BookingError::Conflict(format!(
                "'{}' already has a showing on {} overlapping {}-{}",
                showing.movie_title, showing.date, showing.starts_at, showing.ends_at
            )));
        }

        conn.execute(
            "UPDATE sessions
             SET movie_title = ?, date = ?, start_time = ?, end_time = ?, capacity = ?, price = ?
             WHERE id = ?",
            params![
                showing.movie_title,
                showing.date.to_string(),
                showing.starts_at.to_string(),
                showing.ends_at.to_string(),
                showing.capacity,
                showing.price,
                id,
            ],
        )?;

        Ok(Showing {
            id,
            movie_title: showing.movie_title,
            date: showing.date,
            starts_at: showing.starts_at,
            ends_at: showing.ends_at,
            capacity: showing.capacity,
            price: showing.price,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Showing>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM sessions WHERE id = ?", SHOWING_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_showing) {
            Ok(showing) => Ok(Some(showing)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<Showing>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM sessions ORDER BY date ASC, start_time ASC",
            SHOWING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_showing)?;

        let mut showings = Vec::new();
        for row in rows {
            showings.push(row?);
        }
        Ok(showings)
    }

    fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Showing>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM sessions WHERE date = ? ORDER BY start_time ASC",
            SHOWING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![date.to_string()], Self::row_to_showing)?;

        let mut showings = Vec::new();
        for row in rows {
            showings.push(row?);
        }
        Ok(showings)
    }

    fn delete(&self, id: i64) -> Result<(), BookingError> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM sessions WHERE id = ?", params![id])?;
        if rows_affected == 0 {
            return Err(BookingError::NotFound(format!("showing {}", id)));
        }
        tracing::info!(showing_id = id, "showing deleted");
        Ok(())
    }
}
