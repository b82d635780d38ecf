//! Credential placement.
//!
//! A fleet key always travels in the `fleetkey` header. A node API key
//! travels either in the `apikey` header or in the `api_key` query
//! parameter, depending on `AuthMethod`. Every request also carries an
//! `Accept` header naming the negotiated wire format.

use crate::config::{AuthMethod, ClientConfig, RequestFormat};

pub const FLEET_KEY_HEADER: &str = "fleetkey";
pub const API_KEY_HEADER: &str = "apikey";
pub const API_KEY_PARAM: &str = "api_key";

/// Headers and query pairs to attach to every request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthStrategy {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl AuthStrategy {
    pub fn new(auth_method: AuthMethod, fleet: bool, api_key: &str, format: RequestFormat) -> Self {
        let mut headers = vec![("Accept".to_string(), format.mime_type().to_string())];
        let mut query = Vec::new();

        if fleet {
            headers.push((FLEET_KEY_HEADER.to_string(), api_key.to_string()));
        } else {
            match auth_method {
                AuthMethod::Headers => headers.push((API_KEY_HEADER.to_string(), api_key.to_string())),
                AuthMethod::Query => query.push((API_KEY_PARAM.to_string(), api_key.to_string())),
            }
        }

        Self { headers, query }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.auth_method,
            config.fleet,
            &config.api_key,
            config.request_format,
        )
    }
}
