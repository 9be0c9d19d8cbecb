//! Data Transfer Objects
//!
//! Request and response types for the prediction-market REST API.
//! Every response body is wrapped in an [`Envelope`].

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

/// Tolerance for the YES/NO probability sum
pub const PROBABILITY_EPSILON: f64 = 1e-6;

// ============================================
// Envelope
// ============================================

/// `{ success, data?, error? }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into [`ApiError::Rejected`]
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("response is missing `data`".to_string()))
    }

    /// Like [`Envelope::into_result`] for endpoints whose payload is ignored
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "Request failed".to_string()),
            ))
        }
    }
}

// ============================================
// Users
// ============================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Authenticated user record
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub phone: String,
    /// Wallet balance in KSh
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpesa_name: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileData {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub phone: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub phone: &'a str,
    pub mpesa_name: &'a str,
    pub password: &'a str,
}

// ============================================
// Platform & markets
// ============================================

/// Response of `GET /api/stats`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub platform: PlatformSummary,
    #[serde(default)]
    pub recent_markets: Vec<MarketSummary>,
}

/// Aggregate platform counters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    #[serde(default)]
    pub active_markets: u64,
    #[serde(default)]
    pub total_trades: u64,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub total_markets: u64,
}

/// Read-only projection of a market
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub resolution_date: Option<String>,
    pub probability: Probability,
    #[serde(default)]
    pub volume_yes: f64,
    #[serde(default)]
    pub volume_no: f64,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub trade_count: u64,
}

/// Implied YES/NO probabilities, expected to sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probability {
    pub yes_probability: f64,
    pub no_probability: f64,
}

impl Probability {
    pub fn is_consistent(&self) -> bool {
        (self.yes_probability + self.no_probability - 1.0).abs() <= PROBABILITY_EPSILON
    }

    /// Scale both sides so they sum to 1.0. An all-zero pair becomes 50/50.
    pub fn normalized(&self) -> Self {
        if self.is_consistent() {
            return *self;
        }

        let yes = self.yes_probability.max(0.0);
        let no = self.no_probability.max(0.0);
        let total = yes + no;
        if total <= 0.0 {
            return Self {
                yes_probability: 0.5,
                no_probability: 0.5,
            };
        }

        Self {
            yes_probability: yes / total,
            no_probability: no / total,
        }
    }
}

/// `data` of `GET /api/markets`: either a bare list or `{ markets: [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MarketList {
    Bare(Vec<MarketSummary>),
    Wrapped { markets: Vec<MarketSummary> },
}

impl MarketList {
    pub fn into_markets(self) -> Vec<MarketSummary> {
        match self {
            MarketList::Bare(markets) | MarketList::Wrapped { markets } => markets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS_JSON: &str = r#"{
        "success": true,
        "data": {
            "platform": {"activeMarkets": 3, "totalTrades": 10, "totalVolume": 50000, "totalMarkets": 5},
            "recentMarkets": [{
                "_id": "m1",
                "question": "Q?",
                "category": "Politics",
                "resolutionDate": "2024-12-01",
                "probability": {"yesProbability": 0.6, "noProbability": 0.4},
                "volumeYes": 6000,
                "volumeNo": 4000,
                "totalVolume": 10000,
                "tradeCount": 12
            }]
        }
    }"#;

    #[test]
    fn test_stats_envelope() {
        let envelope: Envelope<PlatformStats> = serde_json::from_str(STATS_JSON).unwrap();
        let stats = envelope.into_result().unwrap();

        assert_eq!(stats.platform.active_markets, 3);
        assert_eq!(stats.platform.total_volume, 50000.0);
        assert_eq!(stats.recent_markets.len(), 1);

        let market = &stats.recent_markets[0];
        assert_eq!(market.id, "m1");
        assert_eq!(market.trade_count, 12);
        assert!(market.probability.is_consistent());
    }

    #[test]
    fn test_rejected_envelope() {
        let envelope: Envelope<PlatformStats> =
            serde_json::from_str(r#"{"success": false, "error": "Invalid credentials"}"#).unwrap();

        match envelope.into_result() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Invalid credentials"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_success_without_data() {
        let envelope: Envelope<ProfileData> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(envelope.into_result(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_user_roles() {
        let admin: User = serde_json::from_str(
            r#"{"_id": "u1", "phone": "0712345678", "balance": 1500.5, "role": "admin"}"#,
        )
        .unwrap();
        assert!(admin.is_admin());

        let user: User = serde_json::from_str(r#"{"id": "u2", "phone": "0700000000"}"#).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.balance, 0.0);
    }

    #[test]
    fn test_missing_volumes_default_to_zero() {
        let market: MarketSummary = serde_json::from_str(
            r#"{"_id": "m2", "question": "Will it rain?", "probability": {"yesProbability": 0.5, "noProbability": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(market.volume_yes, 0.0);
        assert_eq!(market.total_volume, 0.0);
        assert_eq!(market.trade_count, 0);
        assert_eq!(market.resolution_date, None);
    }

    #[test]
    fn test_probability_normalization() {
        let skewed = Probability {
            yes_probability: 0.3,
            no_probability: 0.3,
        };
        assert!(!skewed.is_consistent());

        let fixed = skewed.normalized();
        assert!(fixed.is_consistent());
        assert!((fixed.yes_probability - 0.5).abs() < PROBABILITY_EPSILON);

        let empty = Probability {
            yes_probability: 0.0,
            no_probability: 0.0,
        };
        assert_eq!(empty.normalized().yes_probability, 0.5);
    }

    #[test]
    fn test_market_list_shapes() {
        let bare: MarketList = serde_json::from_str(
            r#"[{"_id": "m1", "question": "Q?", "probability": {"yesProbability": 1.0, "noProbability": 0.0}}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_markets().len(), 1);

        let wrapped: MarketList = serde_json::from_str(r#"{"markets": []}"#).unwrap();
        assert!(wrapped.into_markets().is_empty());
    }

    #[test]
    fn test_register_request_field_names() {
        let body = serde_json::to_value(RegisterRequest {
            phone: "0712345678",
            mpesa_name: "Jane Doe",
            password: "secret",
        })
        .unwrap();
        assert_eq!(body["mpesaName"], "Jane Doe");
    }
}
