pub mod commands;
pub mod model;
pub mod ranking;

pub use model::{Bid, BidPlacement, PlaceBidCommand, RankedBid};
