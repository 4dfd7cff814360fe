//! PostgreSQL store implementations.

mod checkin_store;
mod venue_directory;

pub use checkin_store::PgCheckinStore;
pub use venue_directory::{PgSecretStore, PgVenueDirectory};
