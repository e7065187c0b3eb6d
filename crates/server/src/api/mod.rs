pub mod error;
pub mod handlers;
pub mod routes;
pub mod sessions;
pub mod tickets;
pub mod users;

pub use routes::create_router;
