//! The schedule service: title normalization, overlap guarding, deletion
//! protection.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::{NewShowing, SessionStore, Showing};
use crate::booking::KeyedLocks;
use crate::error::BookingError;
use crate::movie_lookup::{MovieLookup, MovieLookupError};
use crate::ticket::TicketStore;

/// Manages the showing schedule.
///
/// Schedule writes for the same film are serialized on the canonical title,
/// so two staff members scheduling the same film concurrently cannot both
/// pass the overlap check. The title is resolved against the movie catalog
/// before the lock is taken; lookup never happens inside a critical section.
pub struct SessionCatalog {
    store: Arc<dyn SessionStore>,
    tickets: Arc<dyn TicketStore>,
    movies: Option<Arc<dyn MovieLookup>>,
    schedule_locks: KeyedLocks<String>,
}

impl SessionCatalog {
    /// `movies` is optional: without a catalog client, titles are taken
    /// verbatim.
    pub fn new(
        store: Arc<dyn SessionStore>,
        tickets: Arc<dyn TicketStore>,
        movies: Option<Arc<dyn MovieLookup>>,
    ) -> Self {
        Self {
            store,
            tickets,
            movies,
            schedule_locks: KeyedLocks::new(),
        }
    }

    /// Schedule a new showing.
    pub async fn create(&self, mut showing: NewShowing) -> Result<Showing, BookingError> {
        showing.validate(Utc::now().date_naive())?;
        showing.movie_title = self.canonical_title(&showing.movie_title).await?;

        let title = showing.movie_title.clone();
        self.schedule_locks
            .with_key_lock(&title, || self.store.insert_if_no_overlap(showing))
    }

    /// Reschedule an existing showing, with the same checks as `create`.
    /// Capacity may not shrink below the highest seat a PENDING or
    /// CONFIRMED ticket holds; that would strand the ticket outside the
    /// valid seat range.
    pub async fn update(&self, id: i64, mut showing: NewShowing) -> Result<Showing, BookingError> {
        showing.validate(Utc::now().date_naive())?;
        showing.movie_title = self.canonical_title(&showing.movie_title).await?;

        if let Some(&highest) = self.tickets.occupied_seats(id)?.iter().next_back() {
            if showing.capacity < highest {
                return Err(BookingError::Conflict(format!(
                    "capacity {} would strand held seat {} of showing {}",
                    showing.capacity, highest, id
                )));
            }
        }

        let title = showing.movie_title.clone();
        self.schedule_locks
            .with_key_lock(&title, || self.store.update_if_no_overlap(id, showing))
    }

    pub fn get(&self, id: i64) -> Result<Showing, BookingError> {
        self.store
            .get(id)?
            .ok_or_else(|| BookingError::NotFound(format!("showing {}", id)))
    }

    pub fn list(&self) -> Result<Vec<Showing>, BookingError> {
        self.store.list()
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Showing>, BookingError> {
        self.store.find_by_date(date)
    }

    /// Remove a showing. Refused while any PENDING or CONFIRMED ticket is
    /// attached to it; released tickets do not block deletion.
    pub fn delete(&self, id: i64) -> Result<(), BookingError> {
        self.get(id)?;
        let holding = self.tickets.holding_count(id)?;
        if holding > 0 {
            return Err(BookingError::Conflict(format!(
                "showing {} still has {} active ticket(s)",
                id, holding
            )));
        }
        self.store.delete(id)?;
        info!(showing_id = id, "showing removed from schedule");
        Ok(())
    }

    /// Resolve a title to its canonical catalog form. With no catalog client
    /// configured the title passes through unchanged.
    async fn canonical_title(&self, title: &str) -> Result<String, BookingError> {
        let Some(movies) = &self.movies else {
            return Ok(title.to_string());
        };
        match movies.resolve_title(title).await {
            Ok(info) => Ok(info.title),
            Err(MovieLookupError::NotFound(_)) => Err(BookingError::NotFound(format!(
                "movie '{}'",
                title
            ))),
            Err(e) => {
                warn!(title, error = %e, "movie catalog lookup failed");
                Err(BookingError::Upstream(e.to_string()))
            }
        }
    }
}
