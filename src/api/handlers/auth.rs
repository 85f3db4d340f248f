use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::{hash_password, issue_token, verify_password};
use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

fn required(email: Option<String>, password: Option<String>) -> Result<(String, String), AppError> {
    let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    let password = password.filter(|p| !p.is_empty());
    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::BadRequest("Missing required fields".into())),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup: register and return a token
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (email, password) = required(req.email, req.password)?;
    let name = req.name.unwrap_or_default().trim().to_string();

    let hash = hash_password(password, state.config.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(&name, &email, hash)
        .await?
        .ok_or_else(|| AppError::Conflict("Email already registered".into()))?;

    let token = issue_token(&user, &state.config)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// POST /api/auth/login: exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (email, password) = required(req.email, req.password)?;

    let user = state.store.find_user_by_email(&email).await?;
    let verified = match &user {
        Some(user) => verify_password(password, user.password_hash.clone()).await?,
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        counter!("auth_failures_total").increment(1);
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    };

    let token = issue_token(&user, &state.config)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
