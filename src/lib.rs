pub mod auction;
pub mod auth;
pub mod bidding;
pub mod config;
pub mod database;
pub mod draft;
pub mod error;
pub mod handlers;
pub mod message_broker;
pub mod notification;
pub mod query;
pub mod realtime;
pub mod requirement;
pub mod scheduler;
pub mod state;
pub mod store;
