//! # Data Models
//!
//! This module contains all the data models used throughout the Collecty API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod api_key;
pub mod lead_magnet;
pub mod project;
pub mod subscriber;
pub mod widget;

pub use api_key::Entity as ApiKey;
pub use lead_magnet::Entity as LeadMagnet;
pub use project::Entity as Project;
pub use subscriber::Entity as Subscriber;
pub use widget::Entity as Widget;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "collecty".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
