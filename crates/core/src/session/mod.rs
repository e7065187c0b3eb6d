//! Scheduled showings and the catalog that guards the schedule.

mod catalog;
mod sqlite_store;
mod store;
mod types;

pub use catalog::SessionCatalog;
pub use sqlite_store::SqliteSessionStore;
pub use store::SessionStore;
pub use types::{NewShowing, Showing};
