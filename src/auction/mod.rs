pub mod events;
pub mod status;

pub use status::{resolve_status, time_remaining, AuctionStatus, TimeRemaining};
