use serde::Serialize;
use sqlx::FromRow;

/// User as returned to clients. The password digest is never selected into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_admin: bool,
}

/// Row to insert on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String, // hex SHA-256
    pub full_name: String,
    pub phone: Option<String>,
}
