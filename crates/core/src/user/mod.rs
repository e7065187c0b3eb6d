//! Users: the account records that own tickets.

mod directory;
mod sqlite_directory;
mod types;

pub use directory::{NewUser, UserDirectory};
pub use sqlite_directory::SqliteUserDirectory;
pub use types::{Role, User};
