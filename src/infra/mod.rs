//! Infrastructure: errors, storage traits, and their implementations.

mod error;
mod events;
mod memory;
pub mod postgres;
mod traits;

pub use error::{PresenceError, Result};
pub use events::{publish_best_effort, EventBus};
pub use memory::{
    InMemoryCheckinStore, InMemorySecretStore, InMemoryVenueDirectory, NoopEventSink,
    RecordingEventSink,
};
pub use postgres::{PgCheckinStore, PgSecretStore, PgVenueDirectory};
pub use traits::{CheckinStore, EventSink, SecretStore, VenueDirectory};

#[cfg(test)]
pub use traits::{MockCheckinStore, MockEventSink, MockSecretStore, MockVenueDirectory};
