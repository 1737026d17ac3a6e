use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Plant {
    pub id: i32,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub in_stock: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlant {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub image_url: String,
    pub description: String,
    pub in_stock: bool,
}

/// Fields to overwrite on update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub in_stock: Option<bool>,
}
