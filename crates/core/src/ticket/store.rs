//! Ticket storage trait.

use std::collections::BTreeSet;

use crate::error::BookingError;
use crate::ticket::{RequestType, Ticket, TicketStatus};

/// A ticket to be inserted.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: i64,
    pub session_id: i64,
    pub seat_number: u32,
    pub status: TicketStatus,
    pub request_type: RequestType,
}

/// Trait for ticket storage backends.
///
/// Implementations must make the seat-occupancy check and the write a single
/// atomic operation, and must enforce at-most-one holding ticket per
/// (session, seat) at the storage boundary so a conflicting write is
/// rejected as `Conflict` even if application-level serialization is
/// bypassed.
pub trait TicketStore: Send + Sync {
    /// Insert a ticket, failing with `Conflict` if the ticket would hold a
    /// seat that another PENDING or CONFIRMED ticket already holds.
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, BookingError>;

    /// Get a ticket by id.
    fn get(&self, id: i64) -> Result<Option<Ticket>, BookingError>;

    /// All tickets, ordered by session then seat.
    fn list(&self) -> Result<Vec<Ticket>, BookingError>;

    /// Tickets for one showing, ordered by seat.
    fn list_by_session(&self, session_id: i64) -> Result<Vec<Ticket>, BookingError>;

    /// Tickets owned by one user, ordered by session then seat.
    fn list_by_user(&self, user_id: i64) -> Result<Vec<Ticket>, BookingError>;

    /// Seat numbers held by PENDING or CONFIRMED tickets of a showing.
    /// Always computed fresh from ticket state.
    fn occupied_seats(&self, session_id: i64) -> Result<BTreeSet<u32>, BookingError>;

    /// Number of holding-state tickets attached to a showing.
    fn holding_count(&self, session_id: i64) -> Result<u32, BookingError>;

    /// Update a ticket's lifecycle state. The purchase timestamp is never
    /// touched. `NotFound` if the ticket is absent.
    fn update_state(
        &self,
        id: i64,
        status: TicketStatus,
        request_type: RequestType,
    ) -> Result<Ticket, BookingError>;

    /// Rewrite a ticket's owner, showing, seat and state, keeping the
    /// purchase timestamp. Same seat-conflict discipline as `insert`,
    /// excluding the ticket itself. `NotFound` if absent.
    fn reseat(&self, id: i64, ticket: NewTicket) -> Result<Ticket, BookingError>;

    /// Delete a ticket. `NotFound` if absent.
    fn delete(&self, id: i64) -> Result<(), BookingError>;
}
