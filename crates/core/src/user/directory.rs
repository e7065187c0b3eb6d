//! User storage trait.

use crate::error::BookingError;
use crate::user::{Role, User};

/// A user to be registered.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub role: Role,
}

/// Trait for user storage backends.
pub trait UserDirectory: Send + Sync {
    /// Register a user. `Conflict` if the username is taken.
    fn create(&self, user: NewUser) -> Result<User, BookingError>;

    /// Get a user by id.
    fn get(&self, id: i64) -> Result<Option<User>, BookingError>;

    /// Get a user by username.
    fn get_by_username(&self, username: &str) -> Result<Option<User>, BookingError>;

    /// All users, ordered by username.
    fn list(&self) -> Result<Vec<User>, BookingError>;
}
