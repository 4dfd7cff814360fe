//! Verification pipeline: replay guard, geolocation scoring, spoofing
//! heuristics, and the orchestrator that combines them into a verdict.

mod geo;
mod orchestrator;
pub mod policy;
mod replay;
mod risk;

pub use geo::*;
pub use orchestrator::*;
pub use replay::*;
pub use risk::*;
