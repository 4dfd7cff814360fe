//! Request handlers.

mod checkin;
mod venues;

pub use checkin::{get_checkin_status, post_checkin};
pub use venues::{get_code_preview, get_metrics, get_venue};
