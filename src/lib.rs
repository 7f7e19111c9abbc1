//! Admin controller for photo records. Saving a photo stamps its creator, reconciles the
//! object permissions, notifies the configured recipients, and appends to the audit trail.

pub mod admin;
pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod errors;
pub mod event_log;
pub mod models;
pub mod notification;
pub mod object_id;
pub mod requests;
pub mod server;
pub mod storage;
pub mod tracing_config;

#[cfg(test)]
mod tests;

pub use error::Error;
