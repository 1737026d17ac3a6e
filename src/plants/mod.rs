mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use handlers::{plants_endpoint, CatalogHandler};
pub use repo::PgPlantRepository;
