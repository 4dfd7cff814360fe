//! Core domain types for the presence engine.

mod checkin;
mod types;

pub use checkin::*;
pub use types::*;
