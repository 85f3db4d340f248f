//! HTTP client for the journal API plus the page-level state a front end
//! drives: form validation, a generation-guarded trade cache and the
//! journal view.

pub mod cache;
pub mod form;
pub mod view;

pub use cache::{FetchTicket, TradeCache};
pub use form::TradeForm;
pub use view::{ClearOutcome, JournalView};

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::api::handlers::auth::AuthResponse;
use crate::api::handlers::trades::DeleteResponse;
use crate::models::{NativeTradeInput, Trade};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; carries the server's `message` or `HTTP <status>`.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Rejected locally, before any request was sent.
    #[error("{0}")]
    Validation(String),
}

/// The list endpoint has answered with both shapes over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum TradeListResponse {
    List(Vec<Trade>),
    Wrapped { trades: Vec<Trade> },
}

impl TradeListResponse {
    fn into_trades(self) -> Vec<Trade> {
        match self {
            TradeListResponse::List(trades) => trades,
            TradeListResponse::Wrapped { trades } => trades,
        }
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JournalClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl JournalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn trades_url(&self) -> String {
        format!("{}/api/trades", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Register an account and keep the returned token for later calls.
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let url = format!("{}/api/auth/signup", self.base_url);
        let body = json!({ "name": name, "email": email, "password": password });
        let resp = check(self.http.post(&url).json(&body).send().await?).await?;

        let auth: AuthResponse = resp.json().await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Log in and keep the returned token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let body = json!({ "email": email, "password": password });
        let resp = check(self.http.post(&url).json(&body).send().await?).await?;

        let auth: AuthResponse = resp.json().await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Fetch the caller's trades, newest first.
    pub async fn list_trades(&self) -> Result<Vec<Trade>, ClientError> {
        let resp = check(self.authed(self.http.get(self.trades_url())).send().await?).await?;

        Ok(resp.json::<TradeListResponse>().await?.into_trades())
    }

    pub async fn create_trade(&self, input: &NativeTradeInput) -> Result<Trade, ClientError> {
        let resp = check(
            self.authed(self.http.post(self.trades_url()))
                .json(input)
                .send()
                .await?,
        )
        .await?;

        Ok(resp.json().await?)
    }

    pub async fn delete_trade(&self, id: Uuid) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.trades_url(), id);
        check(self.authed(self.http.delete(&url)).send().await?).await?;
        Ok(())
    }

    /// Delete every trade of the caller; returns how many the server removed.
    pub async fn delete_all_trades(&self) -> Result<u64, ClientError> {
        let resp = check(self.authed(self.http.delete(self.trades_url())).send().await?).await?;

        let body: DeleteResponse = resp.json().await?;
        Ok(body.deleted)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp
        .json::<ErrorPayload>()
        .await
        .ok()
        .and_then(|p| p.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}
