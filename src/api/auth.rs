use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{AuthUser, User};
use crate::AppState;

/// JWT claims carried by journal access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Sign an HS256 access token for `user`.
pub fn issue_token(user: &User, config: &AppConfig) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp() as usize,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
}

/// Verify signature and expiry, returning the identity the token names.
pub fn verify_token(token: &str, secret: &str) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256)).ok()?;
    let id = Uuid::parse_str(&data.claims.sub).ok()?;

    Some(AuthUser {
        id,
        email: data.claims.email,
    })
}

/// bcrypt is CPU-bound, so hashing runs on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}

/// Bearer-token authentication middleware.
///
/// Every request must carry `Authorization: Bearer <jwt>` signed with
/// `JWT_SECRET`. On success the verified [`AuthUser`] is attached as a
/// request extension for handlers to extract.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    let Some(value) = auth_header else {
        return reject("Missing Authorization header");
    };

    let token = match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => token,
        _ => return reject("Invalid Authorization format"),
    };

    match verify_token(token, &state.config.jwt_secret) {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => reject("Invalid or expired token"),
    }
}

fn reject(message: &str) -> Response {
    counter!("auth_failures_total").increment(1);
    AppError::Unauthorized(message.into()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ttl_hours: i64) -> AppConfig {
        AppConfig {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "test-secret".into(),
            token_ttl_hours: ttl_hours,
            bcrypt_cost: 4,
            rolling_window: 5,
            reconnect_interval_secs: 15,
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let user = user();
        let token = issue_token(&user, &config(24)).unwrap();

        let auth = verify_token(&token, "test-secret").expect("valid token");
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.email, user.email);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&user(), &config(24)).unwrap();
        assert!(verify_token(&token, "other-secret").is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default validation leeway.
        let token = issue_token(&user(), &config(-2)).unwrap();
        assert!(verify_token(&token, "test-secret").is_none());
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("hunter2".into(), 4).await.unwrap();
        assert!(verify_password("hunter2".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".into(), hash).await.unwrap());
    }
}
