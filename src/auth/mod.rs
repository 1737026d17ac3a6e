mod dto;
pub mod handlers;
mod password;
pub mod repo;
pub mod repo_types;
mod token;

pub use handlers::{auth_endpoint, AuthHandler};
pub use repo::PgUserRepository;
