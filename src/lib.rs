//! # Collecty API Library
//!
//! This library provides the core functionality for the Collecty email
//! collection service: widget artifact generation and delivery, the public
//! subscribe endpoint, and the operator management API.

pub mod artifact;
pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod models;
pub mod rate_limit;
pub mod repositories;
pub mod resolver;
pub mod richtext;
pub mod sanitize;
pub mod server;
pub mod telemetry;
pub mod user_agent;
pub use migration;
