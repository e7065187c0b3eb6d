//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// Lifecycle state of a ticket.
///
/// Only `Pending` and `Confirmed` hold the seat; `Returned` and `Cancelled`
/// release it implicitly because the seat ledger counts holding states only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Confirmed,
    Returned,
    Cancelled,
}

impl TicketStatus {
    /// Returns true while the ticket occupies its seat.
    pub fn holds_seat(&self) -> bool {
        matches!(self, TicketStatus::Pending | TicketStatus::Confirmed)
    }

    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "PENDING",
            TicketStatus::Confirmed => "CONFIRMED",
            TicketStatus::Returned => "RETURNED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "PENDING" => Ok(TicketStatus::Pending),
            "CONFIRMED" => Ok(TicketStatus::Confirmed),
            "RETURNED" => Ok(TicketStatus::Returned),
            "CANCELLED" => Ok(TicketStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "unknown ticket status: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer intent recorded independently of status; gates which staff
/// action is legal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Purchase,
    Return,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Purchase => "PURCHASE",
            RequestType::Return => "RETURN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "PURCHASE" => Ok(RequestType::Purchase),
            "RETURN" => Ok(RequestType::Return),
            other => Err(BookingError::Validation(format!(
                "unknown request type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff-side lifecycle actions.
///
/// A closed set: an unknown action name fails at the parse boundary with
/// `InvalidAction` instead of falling through a default branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    Confirm,
    ApproveReturn,
    Cancel,
}

impl TicketAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketAction::Confirm => "confirm",
            TicketAction::ApproveReturn => "approve_return",
            TicketAction::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "confirm" => Ok(TicketAction::Confirm),
            "approve_return" => Ok(TicketAction::ApproveReturn),
            "cancel" => Ok(TicketAction::Cancel),
            other => Err(BookingError::InvalidAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for TicketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket: one user holding (or having held) one seat in one showing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    /// Owning user. The only reference between users and tickets.
    pub user_id: i64,
    /// The showing this seat belongs to.
    pub session_id: i64,
    /// 1-based seat number, validated against the showing's capacity.
    pub seat_number: u32,
    pub status: TicketStatus,
    pub request_type: RequestType,
    /// Set once at creation, immutable thereafter.
    pub purchased_at: DateTime<Utc>,
}
