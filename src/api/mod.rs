//! Backend API
//!
//! Client side of the prediction-market REST API.
//!
//! ## Endpoints
//!
//! - `GET  /api/stats` - platform aggregates and recent markets
//! - `GET  /api/user/profile` - current user (Bearer token)
//! - `POST /api/auth/login` - `{phone, password}` -> `{token, user}`
//! - `POST /api/auth/register` - `{phone, mpesaName, password}`
//! - `GET  /api/markets?sort=&limit=` - market listing
//! - `GET  /health` - liveness probe

mod client;
mod dto;
mod error;

pub use client::{ApiClient, MarketApi};
pub use dto::{
    Envelope, LoginData, MarketList, MarketSummary, PlatformStats, PlatformSummary, Probability,
    Role, User, PROBABILITY_EPSILON,
};
pub use error::{ApiError, ApiResult};
