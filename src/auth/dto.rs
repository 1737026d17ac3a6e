use serde::{Deserialize, Serialize};

use crate::auth::repo_types::PublicUser;
use crate::envelope::present;

/// Body of `POST /auth`. Every field is optional so that a missing field is a
/// validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    pub action: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
}

/// Validated registration input.
#[derive(Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Validated login input.
#[derive(Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Empty strings count as missing.
pub(crate) fn supplied(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

impl AuthRequest {
    pub fn into_register(self) -> Option<RegisterRequest> {
        Some(RegisterRequest {
            email: supplied(self.email)?,
            password: supplied(self.password)?,
            full_name: supplied(self.full_name)?,
            // absent means empty; an explicit null is stored as NULL
            phone: self.phone.unwrap_or_else(|| Some(String::new())),
        })
    }

    pub fn into_login(self) -> Option<LoginRequest> {
        Some(LoginRequest {
            email: supplied(self.email)?,
            password: supplied(self.password)?,
        })
    }
}
