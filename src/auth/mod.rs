//! Access token guard for the `/auth/` routes
//!
//! Token validation itself belongs to a [`TokenVerifier`](crate::service::TokenVerifier);
//! this module only extracts the token and turns a rejection into the
//! unauthorized envelope.

use serde::Deserialize;

pub mod service;

pub use service::require_token;

/// Query parameter carrying the access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Message code for a missing or rejected token
pub const INVALID_TOKEN: &str = "invalid_token";

/// Query string of a guarded request
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl TokenQuery {
    /// The token, if present and non-blank
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
