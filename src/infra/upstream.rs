//! Shared HTTP client for the GeoJSON source and the rendering service.

use reqwest::Client;

use super::error::InfraError;

pub fn user_agent() -> &'static str {
    concat!("cyclemap/", env!("CARGO_PKG_VERSION"))
}

/// Build the client used for every outbound call. Timeouts are applied per request.
pub fn build_client() -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(InfraError::from)
}
