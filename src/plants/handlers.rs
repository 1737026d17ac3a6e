use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    envelope::{RequestEnvelope, ResponseEnvelope},
    error::AppError,
    plants::{
        dto::{CreatePlantRequest, PlantId, UpdatePlantRequest},
        repo::PlantRepository,
    },
    state::AppState,
};

// DELETE is advertised to browsers but answered with 405.
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Lists, creates and updates catalog entries. Performs no authorization.
pub struct CatalogHandler {
    plants: Arc<dyn PlantRepository>,
}

impl CatalogHandler {
    pub fn new(plants: Arc<dyn PlantRepository>) -> Self {
        Self { plants }
    }

    /// Business errors come back as envelopes; `Err` means an unhandled fault.
    #[instrument(skip(self, event), fields(method = %event.http_method))]
    pub async fn handle(&self, event: &RequestEnvelope) -> Result<ResponseEnvelope, AppError> {
        let result = match event.method() {
            "OPTIONS" => return Ok(ResponseEnvelope::preflight(ALLOW_METHODS)),
            "GET" => self.list().await,
            "POST" => self.create(event).await,
            "PUT" => self.update(event).await,
            other => {
                warn!(method = other, "method not allowed");
                Err(AppError::MethodNotAllowed)
            }
        };
        ResponseEnvelope::from_result(result)
    }

    async fn list(&self) -> Result<ResponseEnvelope, AppError> {
        let plants = self.plants.list().await?;
        ResponseEnvelope::json(StatusCode::OK, &plants)
    }

    async fn create(&self, event: &RequestEnvelope) -> Result<ResponseEnvelope, AppError> {
        let payload: CreatePlantRequest = event.json_body()?;
        let new_plant = payload
            .into_new_plant()
            .ok_or(AppError::Validation("Missing required fields"))?;

        let plant = self.plants.create(new_plant).await?;
        info!(plant_id = plant.id, name = %plant.name, "plant created");
        ResponseEnvelope::json(StatusCode::CREATED, &plant)
    }

    async fn update(&self, event: &RequestEnvelope) -> Result<ResponseEnvelope, AppError> {
        let payload: UpdatePlantRequest = event.json_body()?;
        let parts = payload.into_parts();
        let id = match parts.id {
            PlantId::Missing => return Err(AppError::Validation("Missing plant ID")),
            PlantId::Unmatchable => return Err(AppError::NotFound("Plant not found")),
            PlantId::Known(id) => id,
        };

        if !parts.invalid.is_empty() {
            // an unknown id wins over a badly typed field
            if self.plants.find(id).await?.is_none() {
                return Err(AppError::NotFound("Plant not found"));
            }
            warn!(plant_id = id, fields = ?parts.invalid, "rejected plant update");
            return Err(AppError::Validation("Invalid plant fields"));
        }

        let plant = self
            .plants
            .update(id, parts.changes)
            .await?
            .ok_or(AppError::NotFound("Plant not found"))?;
        info!(plant_id = plant.id, "plant updated");
        ResponseEnvelope::json(StatusCode::OK, &plant)
    }
}

/// `/plants`, any method.
pub async fn plants_endpoint(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let event = RequestEnvelope::new(method.as_str(), None)
        .with_raw_body(body)
        .with_query(query);
    match state.catalog.handle(&event).await {
        Ok(envelope) => envelope.into_response(),
        Err(fault) => fault.into_response(),
    }
}
