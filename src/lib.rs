pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod ledger;
pub mod market;
pub mod message_broker;
pub mod notify;
pub mod policy;
pub mod query;
pub mod store;
