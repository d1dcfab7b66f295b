use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::ContentKind;

/// A news article shown in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub category: String,        // "Analysis", "Forecast", ... (open set)
    pub timestamp: String,       // display label, e.g. "2 hours ago"
    pub image: String,
    pub summary: String,
}

impl NewsArticle {
    /// Case-insensitive substring match against title or summary.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q) || self.summary.to_lowercase().contains(&q)
    }
}

/// A broker listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broker {
    pub id: String,
    pub name: String,
    pub rating: f64,             // 0.0 - 5.0
    pub logo: String,
    pub min_deposit: String,     // "$100"
    pub leverage: String,        // "1:30"
    pub regulation: String,      // "FCA, ASIC, CySEC"
    pub link: String,
}

/// Length of the star scale brokers are rated on
pub const STAR_SCALE: u8 = 5;

impl Broker {
    /// Number of filled stars on the 5-unit scale
    pub fn stars(&self) -> u8 {
        self.rating.clamp(0.0, STAR_SCALE as f64).floor() as u8
    }
}

/// Direction of the last applied price change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Up,
    Down,
}

impl PairStatus {
    /// Status implied by the sign of a price delta. A zero delta counts as down.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            PairStatus::Up
        } else {
            PairStatus::Down
        }
    }
}

/// A tradable instrument with a simulated live price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPair {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub status: PairStatus,
    /// Price the change figures are measured against
    #[serde(skip)]
    pub reference_price: f64,
}

impl MarketPair {
    /// Seed a pair from its opening quote. The reference price is backed out
    /// of the seeded change so later ticks keep the same baseline.
    pub fn seed(symbol: &str, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent,
            status: PairStatus::from_delta(change),
            reference_price: price - change,
        }
    }

    /// Case-insensitive substring match against the symbol
    pub fn matches(&self, query: &str) -> bool {
        self.symbol.to_lowercase().contains(&query.to_lowercase())
    }

    /// Decimal places used when the pair is shown in the ticker
    pub fn display_decimals(&self) -> usize {
        match self.symbol.as_str() {
            "USD/JPY" | "Gold" | "BTC/USD" => 2,
            _ => 4,
        }
    }

    pub fn display_price(&self) -> String {
        format!("{:.*}", self.display_decimals(), self.price)
    }
}

/// Trade direction of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalSide {
    Buy,
    Sell,
}

/// Simulated trade recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    pub pair: String,
    pub side: SignalSide,
    pub entry: f64,
    pub tp: f64,
    pub sl: f64,
    pub confidence: u8,          // percent, kept within [90, 99]
}

/// Session role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Logged-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Error types for portal state operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortalError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Admin session required")]
    AdminRequired,

    #[error("No content form is open")]
    NoActiveForm,

    #[error("Submitted a {submitted:?} form while the {open:?} form is open")]
    WrongFormKind {
        open: ContentKind,
        submitted: ContentKind,
    },
}

/// Result type for portal state operations
pub type Result<T> = std::result::Result<T, PortalError>;
