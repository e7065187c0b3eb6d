pub mod booking;
pub mod config;
pub mod error;
pub mod movie_lookup;
pub mod seats;
pub mod session;
pub mod ticket;
pub mod user;

pub use booking::BookingCoordinator;
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use error::BookingError;
pub use movie_lookup::{MovieInfo, MovieLookup, MovieLookupError, OmdbClient, OmdbConfig};
pub use seats::{SeatLedger, SeatView};
pub use session::{
    NewShowing, SessionCatalog, SessionStore, Showing, SqliteSessionStore,
};
pub use ticket::{
    NewTicket, RequestType, SqliteTicketStore, Ticket, TicketAction, TicketStatus, TicketStore,
};
pub use user::{NewUser, Role, SqliteUserDirectory, User, UserDirectory};
