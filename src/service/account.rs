//! Account resource types

use serde::{Deserialize, Serialize};

/// A user account as returned by the API
///
/// The password never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub login_name: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Body of the register and create routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub login_name: String,
    pub name: String,
    pub password: String,
}

/// Body of the login route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login_name: String,
    pub password: String,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPatch {
    #[serde(default)]
    pub login_name: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.login_name.is_none() && self.name.is_none() && self.password.is_none()
    }
}

/// Returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub account: Account,
}
