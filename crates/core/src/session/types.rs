//! Showing data types and field validation.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// A scheduled screening of a film.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Showing {
    pub id: i64,
    pub movie_title: String,
    pub date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    /// Seats are numbered 1..=capacity.
    pub capacity: u32,
    /// Flat per-session price.
    pub price: f64,
}

/// A showing to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewShowing {
    pub movie_title: String,
    pub date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub capacity: u32,
    pub price: f64,
}

impl NewShowing {
    /// Field validation; `today` is injected so callers and tests agree on
    /// what "in the past" means.
    pub fn validate(&self, today: NaiveDate) -> Result<(), BookingError> {
        if self.movie_title.trim().is_empty() {
            return Err(BookingError::Validation(
                "movie title must not be blank".to_string(),
            ));
        }
        if self.starts_at >= self.ends_at {
            return Err(BookingError::Validation(format!(
                "start time {} must be before end time {}",
                self.starts_at, self.ends_at
            )));
        }
        if self.capacity == 0 {
            return Err(BookingError::Validation(
                "capacity must be positive".to_string(),
            ));
        }
        if self.price <= 0.0 {
            return Err(BookingError::Validation(
                "price must be positive".to_string(),
            ));
        }
        if self.date < today {
            return Err(BookingError::Validation(format!(
                "date {} is in the past",
                self.date
            )));
        }
        Ok(())
    }
}
