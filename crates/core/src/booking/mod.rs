//! The booking coordinator and its serialization primitive.

mod coordinator;
mod locks;

pub use coordinator::BookingCoordinator;
pub use locks::KeyedLocks;
