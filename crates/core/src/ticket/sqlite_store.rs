//! SQLite-backed ticket store implementation.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewTicket, RequestType, Ticket, TicketStatus, TicketStore};
use crate::error::BookingError;

const TICKET_COLUMNS: &str =
    "id, user_id, session_id, seat_number, status, request_type, purchased_at";

/// Default bound on how long a storage call may wait on a locked database.
pub(crate) const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed ticket store.
///
/// The partial unique index on (session_id, seat_number) restricted to
/// holding states is the storage backstop: even without the coordinator's
/// per-showing lock, a concurrent double-insert is rejected by SQLite and
/// surfaces as `Conflict`.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
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
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), BookingError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                session_id INTEGER NOT NULL,
                seat_number INTEGER NOT NULL,
                status TEXT NOT NULL,
                request_type TEXT NOT NULL,
                purchased_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_session ON tickets(session_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_user ON tickets(user_id);

            -- At most one PENDING/CONFIRMED ticket may hold a seat.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tickets_seat_hold
                ON tickets(session_id, seat_number)
                WHERE status IN ('PENDING', 'CONFIRMED');
            "#,
        )?;
        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let status_str: String = row.get(4)?;
        let request_type_str: String = row.get(5)?;
        let purchased_at_str: String = row.get(6)?;

        let status = TicketStatus::parse(&status_str)
            .map_err(|e| text_conversion_err(4, e))?;
        let request_type = RequestType::parse(&request_type_str)
            .map_err(|e| text_conversion_err(5, e))?;

        let purchased_at = DateTime::parse_from_rfc3339(&purchased_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Ticket {
            id: row.get(0)?,
            user_id: row.get(1)?,
            session_id: row.get(2)?,
            seat_number: row.get(3)?,
            status,
            request_type,
            purchased_at,
        })
    }

    fn get_locked(conn: &Connection, id: i64) -> Result<Ticket, BookingError> {
        let sql = format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_ticket) {
            Ok(ticket) => Ok(ticket),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(BookingError::NotFound(format!("ticket {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Is the seat held by a PENDING/CONFIRMED ticket other than `exclude`?
    fn seat_held(
        conn: &Connection,
        session_id: i64,
        seat_number: u32,
        exclude: Option<i64>,
    ) -> Result<bool, BookingError> {
        let held = conn
            .query_row(
                "SELECT 1 FROM tickets
                 WHERE session_id = ? AND seat_number = ?
                   AND status IN ('PENDING', 'CONFIRMED')
                   AND id != ?",
                params![session_id, seat_number, exclude.unwrap_or(-1)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(held.is_some())
    }
}

fn text_conversion_err(idx: usize, e: BookingError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, BookingError> {
        let conn = self.conn.lock().unwrap();

        // Check and insert under the same connection lock so the pair is
        // atomic with respect to every other store call; the partial unique
        // index catches anything that slips past.
        if ticket.status.holds_seat()
            && Self::seat_held(&conn, ticket.session_id, ticket.seat_number, None)?
        {
            return Err(BookingError::Conflict(format!(
                "seat {} of showing {} is already taken",
                ticket.seat_number, ticket.session_id
            )));
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO tickets (user_id, session_id, seat_number, status, request_type, purchased_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                ticket.user_id,
                ticket.session_id,
                ticket.seat_number,
                ticket.status.as_str(),
                ticket.request_type.as_str(),
                now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(ticket_id = id, session_id = ticket.session_id, seat = ticket.seat_number, "ticket inserted");

        Ok(Ticket {
            id,
            user_id: ticket.user_id,
            session_id: ticket.session_id,
            seat_number: ticket.seat_number,
            status: ticket.status,
            request_type: ticket.request_type,
            purchased_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Ticket>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_ticket) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<Ticket>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tickets ORDER BY session_id ASC, seat_number ASC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_ticket)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    fn list_by_session(&self, session_id: i64) -> Result<Vec<Ticket>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tickets WHERE session_id = ? ORDER BY seat_number ASC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![session_id], Self::row_to_ticket)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    fn list_by_user(&self, user_id: i64) -> Result<Vec<Ticket>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tickets WHERE user_id = ? ORDER BY session_id ASC, seat_number ASC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], Self::row_to_ticket)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    fn occupied_seats(&self, session_id: i64) -> Result<BTreeSet<u32>, BookingError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT seat_number FROM tickets
             WHERE session_id = ? AND status IN ('PENDING', 'CONFIRMED')",
        )?;
        let rows = stmt.query_map(params![session_id], |row| row.get::<_, u32>(0))?;

        let mut seats = BTreeSet::new();
        for row in rows {
            seats.insert(row?);
        }
        Ok(seats)
    }

    fn holding_count(&self, session_id: i64) -> Result<u32, BookingError> {
        let conn = self.conn.lock().unwrap();
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM tickets
             WHERE session_id = ? AND status IN ('PENDING', 'CONFIRMED')",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn update_state(
        &self,
        id: i64,
        status: TicketStatus,
        request_type: RequestType,
    ) -> Result<Ticket, BookingError> {
        let conn = self.conn.lock().unwrap();
        let mut ticket = Self::get_locked(&conn, id)?;

        conn.execute(
            "UPDATE tickets SET status = ?, request_type = ? WHERE id = ?",
            params![status.as_str(), request_type.as_str(), id],
        )?;
        tracing::info!(ticket_id = id, status = %status, request_type = %request_type, "ticket state updated");

        ticket.status = status;
        ticket.request_type = request_type;
        Ok(ticket)
    }

    fn reseat(&self, id: i64, ticket: NewTicket) -> Result<Ticket, BookingError> {
        let conn = self.conn.lock().unwrap();
        let existing = Self::get_locked(&conn, id)?;

        if ticket.status.holds_seat()
            && Self::seat_held(&conn, ticket.session_id, ticket.seat_number, Some(id))?
        {
            return Err(BookingError::Conflict(format!(
                "seat {} of showing {} is already taken",
                ticket.seat_number, ticket.session_id
            )));
        }

        conn.execute(
            "UPDATE tickets
             SET user_id = ?, session_id = ?, seat_number = ?, status = ?, request_type = ?
             WHERE id = ?",
            params![
                ticket.user_id,
                ticket.session_id,
                ticket.seat_number,
                ticket.status.as_str(),
                ticket.request_type.as_str(),
                id,
            ],
        )?;

        Ok(Ticket {
            id,
            user_id: ticket.user_id,
            session_id: ticket.session_id,
            seat_number: ticket.seat_number,
            status: ticket.status,
            request_type: ticket.request_type,
            // Set once at creation, survives every rewrite.
            purchased_at: existing.purchased_at,
        })
    }

    fn delete(&self, id: i64) -> Result<(), BookingError> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM tickets WHERE id = ?", params![id])?;
        if rows_affected == 0 {
            return Err(BookingError::NotFound(format!("ticket {}", id)));
        }
        Ok(())
    }
}
