//! The booking coordinator: every ticket mutation funnels through here.

use std::sync::Arc;

use tracing::info;

use super::KeyedLocks;
use crate::error::BookingError;
use crate::seats::validate_seat;
use crate::session::{SessionStore, Showing};
use crate::ticket::{
    lifecycle, NewTicket, RequestType, Ticket, TicketAction, TicketStatus, TicketStore,
};
use crate::user::UserDirectory;

/// Serializes ticket operations per showing.
///
/// Two writes that touch the same showing run one at a time, so a purchase
/// cannot interleave with a competing purchase or a staff rewrite between
/// its occupancy check and its insert. The store's unique-index backstop
/// stays as the second line of defense.
pub struct BookingCoordinator {
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    tickets: Arc<dyn TicketStore>,
    seat_locks: KeyedLocks<i64>,
}

impl BookingCoordinator {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        tickets: Arc<dyn TicketStore>,
    ) -> Self {
        Self {
            users,
            sessions,
            tickets,
            seat_locks: KeyedLocks::new(),
        }
    }

    /// A customer buys a seat. The new ticket starts as PENDING/PURCHASE
    /// and holds the seat immediately.
    pub fn purchase(
        &self,
        user_id: i64,
        session_id: i64,
        seat_number: u32,
    ) -> Result<Ticket, BookingError> {
        self.require_user(user_id)?;
        let showing = self.require_showing(session_id)?;
        validate_seat(seat_number, showing.capacity)?;

        let ticket = self.seat_locks.with_key_lock(&session_id, || {
            self.tickets.insert(NewTicket {
                user_id,
                session_id,
                seat_number,
                status: TicketStatus::Pending,
                request_type: RequestType::Purchase,
            })
        })?;
        info!(ticket_id = ticket.id, user_id, session_id, seat = seat_number, "seat purchased");
        Ok(ticket)
    }

    /// Staff create a ticket in an arbitrary state.
    pub fn staff_add(&self, ticket: NewTicket) -> Result<Ticket, BookingError> {
        self.require_user(ticket.user_id)?;
        let showing = self.require_showing(ticket.session_id)?;
        validate_seat(ticket.seat_number, showing.capacity)?;

        let session_id = ticket.session_id;
        self.seat_locks
            .with_key_lock(&session_id, || self.tickets.insert(ticket))
    }

    /// Staff rewrite a ticket (owner, showing, seat, state). The purchase
    /// timestamp is preserved.
    pub fn staff_update(&self, id: i64, ticket: NewTicket) -> Result<Ticket, BookingError> {
        self.require_user(ticket.user_id)?;
        let showing = self.require_showing(ticket.session_id)?;
        validate_seat(ticket.seat_number, showing.capacity)?;

        let session_id = ticket.session_id;
        self.seat_locks
            .with_key_lock(&session_id, || self.tickets.reseat(id, ticket))
    }

    /// Staff delete a ticket outright.
    pub fn staff_delete(&self, id: i64) -> Result<(), BookingError> {
        self.tickets.delete(id)?;
        info!(ticket_id = id, "ticket deleted");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Ticket, BookingError> {
        self.tickets
            .get(id)?
            .ok_or_else(|| BookingError::NotFound(format!("ticket {}", id)))
    }

    pub fn list(&self) -> Result<Vec<Ticket>, BookingError> {
        self.tickets.list()
    }

    pub fn list_by_session(&self, session_id: i64) -> Result<Vec<Ticket>, BookingError> {
        self.tickets.list_by_session(session_id)
    }

    pub fn list_by_user(&self, user_id: i64) -> Result<Vec<Ticket>, BookingError> {
        self.tickets.list_by_user(user_id)
    }

    /// A customer asks to return their own ticket. Only the owner may ask;
    /// asking again while the request is open is a no-op.
    pub fn request_return(
        &self,
        ticket_id: i64,
        requesting_user_id: i64,
    ) -> Result<Ticket, BookingError> {
        let updated = self.with_ticket_lock(ticket_id, |ticket| {
            if ticket.user_id != requesting_user_id {
                return Err(BookingError::Authorization(format!(
                    "ticket {} belongs to another user",
                    ticket_id
                )));
            }
            match lifecycle::request_return(ticket)? {
                Some((status, request_type)) => {
                    self.tickets.update_state(ticket_id, status, request_type)
                }
                None => Ok(ticket.clone()),
            }
        })?;
        info!(ticket_id, user_id = requesting_user_id, "return requested");
        Ok(updated)
    }

    /// Staff drive a ticket through the state machine.
    pub fn staff_action(
        &self,
        ticket_id: i64,
        action: TicketAction,
    ) -> Result<Ticket, BookingError> {
        let updated = self.with_ticket_lock(ticket_id, |ticket| {
            let (status, request_type) = lifecycle::apply_staff_action(ticket, action)?;
            self.tickets.update_state(ticket_id, status, request_type)
        })?;
        info!(ticket_id, action = %action, status = %updated.status, "staff action applied");
        Ok(updated)
    }

    /// Run `f` on the current ticket row while holding its showing's lock.
    ///
    /// The re-read happens under the lock, so the state `f` validates is the
    /// state the write lands on; two racing transitions serialize into a
    /// legal order instead of both validating against the same snapshot.
    /// Retries when a concurrent staff rewrite moved the ticket to another
    /// showing between the first read and the lock.
    fn with_ticket_lock<T>(
        &self,
        ticket_id: i64,
        f: impl Fn(&Ticket) -> Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        loop {
            let session_id = self.get(ticket_id)?.session_id;
            let outcome = self.seat_locks.with_key_lock(&session_id, || {
                let current = self.get(ticket_id)?;
                if current.session_id != session_id {
                    return Ok(None);
                }
                f(&current).map(Some)
            })?;
            if let Some(value) = outcome {
                return Ok(value);
            }
        }
    }

    fn require_user(&self, user_id: i64) -> Result<(), BookingError> {
        self.users
            .get(user_id)?
            .map(|_| ())
            .ok_or_else(|| BookingError::NotFound(format!("user {}", user_id)))
    }

    fn require_showing(&self, session_id: i64) -> Result<Showing, BookingError> {
        self.sessions
            .get(session_id)?
            .ok_or_else(|| BookingError::NotFound(format!("showing {}", session_id)))
    }
}
