use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthRequest, AuthResponse},
        password::hash_password,
        repo::UserRepository,
        repo_types::NewUser,
        token::SessionSigner,
    },
    config::TokenConfig,
    envelope::{RequestEnvelope, ResponseEnvelope},
    error::AppError,
    state::AppState,
};

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Registers and authenticates users.
pub struct AuthHandler {
    users: Arc<dyn UserRepository>,
    signer: SessionSigner,
}

impl AuthHandler {
    pub fn new(users: Arc<dyn UserRepository>, token: &TokenConfig) -> Self {
        Self {
            users,
            signer: SessionSigner::from(token),
        }
    }

    /// Business errors come back as envelopes; `Err` means an unhandled fault.
    #[instrument(skip(self, event), fields(method = %event.http_method))]
    pub async fn handle(&self, event: &RequestEnvelope) -> Result<ResponseEnvelope, AppError> {
        match event.method() {
            "OPTIONS" => Ok(ResponseEnvelope::preflight(ALLOW_METHODS)),
            "POST" => ResponseEnvelope::from_result(self.dispatch(event).await),
            other => {
                warn!(method = other, "method not allowed");
                ResponseEnvelope::from_result(Err(AppError::MethodNotAllowed))
            }
        }
    }

    async fn dispatch(&self, event: &RequestEnvelope) -> Result<ResponseEnvelope, AppError> {
        let mut payload: AuthRequest = event.json_body()?;
        match payload.action.take().as_deref() {
            Some("register") => self.register(payload).await,
            Some("login") => self.login(payload).await,
            other => {
                warn!(action = ?other, "unknown auth action");
                Err(AppError::Validation("Invalid action"))
            }
        }
    }

    async fn register(&self, payload: AuthRequest) -> Result<ResponseEnvelope, AppError> {
        let req = payload
            .into_register()
            .ok_or(AppError::Validation("Missing required fields"))?;

        // fast path; the unique index still decides under concurrent inserts
        if self.users.email_exists(&req.email).await? {
            warn!(email = %req.email, "email already registered");
            return Err(AppError::Conflict("User already exists"));
        }

        let user = self
            .users
            .create(NewUser {
                password_hash: hash_password(&req.password),
                email: req.email,
                full_name: req.full_name,
                phone: req.phone,
            })
            .await?;

        let token = self.signer.issue(user.id, &user.email)?;
        info!(user_id = user.id, email = %user.email, "user registered");
        ResponseEnvelope::json(StatusCode::CREATED, &AuthResponse { user, token })
    }

    async fn login(&self, payload: AuthRequest) -> Result<ResponseEnvelope, AppError> {
        let req = payload
            .into_login()
            .ok_or(AppError::Validation("Missing email or password"))?;

        let user = self
            .users
            .find_by_credentials(&req.email, &hash_password(&req.password))
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "login rejected");
                AppError::Authentication("Invalid credentials")
            })?;

        let token = self.signer.issue(user.id, &user.email)?;
        info!(user_id = user.id, email = %user.email, "user logged in");
        ResponseEnvelope::json(StatusCode::OK, &AuthResponse { user, token })
    }
}

/// `/auth`, any method.
pub async fn auth_endpoint(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let event = RequestEnvelope::new(method.as_str(), None)
        .with_raw_body(body)
        .with_query(query);
    match state.auth.handle(&event).await {
        Ok(envelope) => envelope.into_response(),
        Err(fault) => fault.into_response(),
    }
}
