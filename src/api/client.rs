//! Prediction-Market REST API Client
//!
//! HTTP client for the backend endpoints the session/view layer consumes.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::dto::{
    Envelope, LoginData, LoginRequest, MarketList, MarketSummary, PlatformStats, ProfileData,
    RegisterRequest, User,
};
use crate::api::error::{ApiError, ApiResult};
use crate::config::ApiConfig;
use crate::view::MarketSort;

/// Backend operations used by the coordinator
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// `GET /api/stats`
    async fn stats(&self) -> ApiResult<PlatformStats>;

    /// `GET /api/user/profile` with a bearer token
    async fn profile(&self, token: &str) -> ApiResult<User>;

    /// `POST /api/auth/login`
    async fn login(&self, phone: &str, password: &str) -> ApiResult<LoginData>;

    /// `POST /api/auth/register`
    async fn register(&self, phone: &str, mpesa_name: &str, password: &str) -> ApiResult<()>;

    /// `GET /api/markets?sort=&limit=`
    async fn markets(&self, sort: &MarketSort, limit: u32) -> ApiResult<Vec<MarketSummary>>;

    /// Liveness probe URL, surfaced as a link
    fn health_url(&self) -> String;
}

/// reqwest-backed [`MarketApi`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the configured deployment origin
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if the backend is alive
    pub async fn health_check(&self) -> ApiResult<()> {
        let response = self
            .client
            .get(self.health_url())
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Unavailable)
        }
    }

    /// Send a request and unwrap the `{ success, data, error }` envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<Envelope<T>> {
        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::from_transport)?;

        match serde_json::from_str::<Envelope<T>>(&text) {
            // Auth failures still come back as an envelope with a useful `error`
            Ok(envelope) if status.is_success() || !envelope.success => Ok(envelope),
            Ok(_) => Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&text),
            }),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&text),
            }),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }
}

#[async_trait]
impl MarketApi for ApiClient {
    async fn stats(&self) -> ApiResult<PlatformStats> {
        let request = self.client.get(self.url("/api/stats"));
        self.send(request).await?.into_result()
    }

    async fn profile(&self, token: &str) -> ApiResult<User> {
        let request = self
            .client
            .get(self.url("/api/user/profile"))
            .bearer_auth(token);

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();

        // Any non-2xx is a verdict on the token, whatever the body says
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&message),
            });
        }

        let envelope: Envelope<ProfileData> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(envelope.into_result()?.user)
    }

    async fn login(&self, phone: &str, password: &str) -> ApiResult<LoginData> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { phone, password });

        self.send(request).await?.into_result()
    }

    async fn register(&self, phone: &str, mpesa_name: &str, password: &str) -> ApiResult<()> {
        let request = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&RegisterRequest {
                phone,
                mpesa_name,
                password,
            });

        self.send::<serde_json::Value>(request).await?.into_ack()
    }

    async fn markets(&self, sort: &MarketSort, limit: u32) -> ApiResult<Vec<MarketSummary>> {
        let url = format!(
            "{}?sort={}&limit={}",
            self.url("/api/markets"),
            urlencoding::encode(sort.as_str()),
            limit
        );

        let list: MarketList = self.send(self.client.get(url)).await?.into_result()?;
        Ok(list.into_markets())
    }

    fn health_url(&self) -> String {
        self.url("/health")
    }
}

const BODY_EXCERPT_CHARS: usize = 200;

/// First part of a non-envelope response body, for logs
fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
