//! Showing storage trait.

use chrono::NaiveDate;

use crate::error::BookingError;
use crate::session::{NewShowing, Showing};

/// Trait for showing storage backends.
///
/// The overlap check and the write must be a single atomic operation so two
/// concurrent schedule writes cannot both pass the check.
pub trait SessionStore: Send + Sync {
    /// Insert a showing, failing with `Conflict` if another showing of the
    /// same film on the same date overlaps it in time.
    fn insert_if_no_overlap(&self, showing: NewShowing) -> Result<Showing, BookingError>;

    /// Rewrite a showing, with the same overlap discipline as insert but
    /// excluding the showing itself. `NotFound` if absent.
    fn update_if_no_overlap(&self, id: i64, showing: NewShowing)
        -> Result<Showing, BookingError>;

    /// Get a showing by id.
    fn get(&self, id: i64) -> Result<Option<Showing>, BookingError>;

    /// All showings, ordered by date then start time.
    fn list(&self) -> Result<Vec<Showing>, BookingError>;

    /// Showings on one date, ordered by start time.
    fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Showing>, BookingError>;

    /// Delete a showing. `NotFound` if absent.
    fn delete(&self, id: i64) -> Result<(), BookingError>;
}
