use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::plants::repo_types::{NewPlant, Plant, PlantChanges};

const PLANT_COLUMNS: &str =
    "id, name, category, price, image_url, description, in_stock, updated_at";

#[async_trait]
pub trait PlantRepository: Send + Sync {
    /// All plants, ascending by id.
    async fn list(&self) -> Result<Vec<Plant>, AppError>;
    async fn find(&self, id: i64) -> Result<Option<Plant>, AppError>;
    async fn create(&self, plant: NewPlant) -> Result<Plant, AppError>;
    /// `None` when no plant has this id. Always refreshes `updated_at`.
    async fn update(&self, id: i64, changes: PlantChanges) -> Result<Option<Plant>, AppError>;
}

#[derive(Clone)]
pub struct PgPlantRepository {
    db: PgPool,
}

impl PgPlantRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlantRepository for PgPlantRepository {
    async fn list(&self) -> Result<Vec<Plant>, AppError> {
        let sql = format!("SELECT {PLANT_COLUMNS} FROM plants ORDER BY id");
        let rows = sqlx::query_as::<_, Plant>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Plant>, AppError> {
        let sql = format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1");
        let row = sqlx::query_as::<_, Plant>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn create(&self, plant: NewPlant) -> Result<Plant, AppError> {
        let sql = format!(
            r#"
            INSERT INTO plants (name, category, price, image_url, description, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PLANT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Plant>(&sql)
            .bind(plant.name)
            .bind(plant.category)
            .bind(plant.price)
            .bind(plant.image_url)
            .bind(plant.description)
            .bind(plant.in_stock)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, changes: PlantChanges) -> Result<Option<Plant>, AppError> {
        let mut query = update_query(id, changes);
        let row = query
            .build_query_as::<Plant>()
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }
}

/// `UPDATE plants SET <supplied columns>, updated_at = NOW() WHERE id = $n`,
/// one bind per supplied column. The id binds as int8 so that any `i64`
/// compares against the int4 column instead of failing to encode.
pub(crate) fn update_query(id: i64, changes: PlantChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE plants SET ");
    let mut set = qb.separated(", ");

    if let Some(name) = changes.name {
        set.push("name = ").push_bind_unseparated(name);
    }
    if let Some(category) = changes.category {
        set.push("category = ").push_bind_unseparated(category);
    }
    if let Some(price) = changes.price {
        set.push("price = ").push_bind_unseparated(price);
    }
    if let Some(image_url) = changes.image_url {
        set.push("image_url = ").push_bind_unseparated(image_url);
    }
    if let Some(description) = changes.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(in_stock) = changes.in_stock {
        set.push("in_stock = ").push_bind_unseparated(in_stock);
    }
    set.push("updated_at = NOW()");

    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(PLANT_COLUMNS);
    qb
}
