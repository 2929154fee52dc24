pub mod auction;
pub mod bidding;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod message_broker;
pub mod notification;
pub mod query;
pub mod scheduler;
pub mod winning;
