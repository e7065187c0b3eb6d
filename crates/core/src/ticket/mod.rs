//! Tickets: the seat-holding records and their lifecycle.

pub mod lifecycle;
mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub(crate) use sqlite_store::DEFAULT_BUSY_TIMEOUT;
pub use store::{NewTicket, TicketStore};
pub use types::{RequestType, Ticket, TicketAction, TicketStatus};
