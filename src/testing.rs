//! In-memory repositories standing in for Postgres in unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::{
    auth::{
        repo::UserRepository,
        repo_types::{NewUser, PublicUser},
    },
    error::AppError,
    plants::{
        repo::PlantRepository,
        repo_types::{NewPlant, Plant, PlantChanges},
    },
};

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<(PublicUser, String)>>,
    // simulates a concurrent insert slipping past the pre-check
    blind_precheck: AtomicBool,
}

impl MemoryUsers {
    pub fn hide_from_precheck(&self) {
        self.blind_precheck.store(true, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn stored_hash(&self, email: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(_, h)| h.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        if self.blind_precheck.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.rows.lock().unwrap().iter().any(|(u, _)| u.email == email))
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|(u, _)| u.email == user.email) {
            return Err(AppError::Conflict("User already exists"));
        }
        let public = PublicUser {
            id: rows.len() as i32 + 1,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            is_admin: false,
        };
        rows.push((public.clone(), user.password_hash));
        Ok(public)
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<PublicUser>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(u, h)| u.email == email && h == password_hash)
            .map(|(u, _)| u.clone()))
    }
}

#[derive(Default)]
pub struct MemoryPlants {
    rows: Mutex<Vec<Plant>>,
    last_stamp: Mutex<Option<OffsetDateTime>>,
}

impl MemoryPlants {
    /// Strictly increasing, like successive `NOW()` calls in separate statements.
    fn now(&self) -> OffsetDateTime {
        let mut last = self.last_stamp.lock().unwrap();
        let mut now = OffsetDateTime::now_utc();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

#[async_trait]
impl PlantRepository for MemoryPlants {
    async fn list(&self) -> Result<Vec<Plant>, AppError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|p| p.id);
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Plant>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|p| i64::from(p.id) == id).cloned())
    }

    async fn create(&self, plant: NewPlant) -> Result<Plant, AppError> {
        let updated_at = self.now();
        let mut rows = self.rows.lock().unwrap();
        let row = Plant {
            id: rows.len() as i32 + 1,
            name: plant.name,
            category: plant.category,
            price: plant.price,
            image_url: Some(plant.image_url),
            description: Some(plant.description),
            in_stock: plant.in_stock,
            updated_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: PlantChanges) -> Result<Option<Plant>, AppError> {
        let now = self.now();
        let mut rows = self.rows.lock().unwrap();
        let Some(plant) = rows.iter_mut().find(|p| i64::from(p.id) == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            plant.name = name;
        }
        if let Some(category) = changes.category {
            plant.category = category;
        }
        if let Some(price) = changes.price {
            plant.price = price;
        }
        if let Some(image_url) = changes.image_url {
            plant.image_url = image_url;
        }
        if let Some(description) = changes.description {
            plant.description = description;
        }
        if let Some(in_stock) = changes.in_stock {
            plant.in_stock = in_stock;
        }
        plant.updated_at = now;
        Ok(Some(plant.clone()))
    }
}
