//! The seat ledger: a computed view, never a stored one.
//!
//! Seat occupancy is always derived from ticket state at read time, so a
//! released seat reappears as free without any bookkeeping write.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BookingError;
use crate::session::SessionStore;
use crate::ticket::TicketStore;

/// Occupancy snapshot for one showing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeatView {
    pub session_id: i64,
    pub capacity: u32,
    /// Seats held by PENDING or CONFIRMED tickets.
    pub occupied: BTreeSet<u32>,
    pub available: u32,
}

/// Read-side seat occupancy, derived from showings and tickets.
pub struct SeatLedger {
    sessions: Arc<dyn SessionStore>,
    tickets: Arc<dyn TicketStore>,
}

impl SeatLedger {
    pub fn new(sessions: Arc<dyn SessionStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { sessions, tickets }
    }

    /// Full occupancy snapshot for a showing. `NotFound` if the showing
    /// does not exist.
    pub fn view(&self, session_id: i64) -> Result<SeatView, BookingError> {
        let showing = self
            .sessions
            .get(session_id)?
            .ok_or_else(|| BookingError::NotFound(format!("showing {}", session_id)))?;
        let occupied = self.tickets.occupied_seats(session_id)?;
        // A schedule rewrite may briefly leave more holds than capacity.
        let available = showing.capacity.saturating_sub(occupied.len() as u32);
        Ok(SeatView {
            session_id,
            capacity: showing.capacity,
            occupied,
            available,
        })
    }

    /// Seats held by active tickets of a showing.
    pub fn occupied_seats(&self, session_id: i64) -> Result<BTreeSet<u32>, BookingError> {
        self.view(session_id).map(|v| v.occupied)
    }

    /// Is the seat both in range and not held?
    pub fn is_free(&self, session_id: i64, seat_number: u32) -> Result<bool, BookingError> {
        let view = self.view(session_id)?;
        validate_seat(seat_number, view.capacity)?;
        Ok(!view.occupied.contains(&seat_number))
    }
}

/// Seats are numbered 1..=capacity.
pub fn validate_seat(seat_number: u32, capacity: u32) -> Result<(), BookingError> {
    if seat_number < 1 || seat_number > capacity {
        return Err(BookingError::Validation(format!(
            "seat {} is out of range 1..={}",
            seat_number, capacity
        )));
    }
    Ok(())
}
