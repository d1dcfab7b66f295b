//! Market analysis collaborator
//!
//! `MarketAnalyst` is the request/response seam to the language-model
//! service. Panels own whatever it returns: each request takes a `Ticket`,
//! and a response whose ticket is no longer current is dropped so a slow
//! answer never overwrites a newer request's state.

pub mod gemini;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use gemini::GeminiClient;

/// Shown when the market outlook could not be produced
pub const OUTLOOK_FAILED_MESSAGE: &str = "Failed to load AI insights. Please try again.";
/// Shown when a pair analysis could not be produced
pub const PAIR_FAILED_MESSAGE: &str = "Failed to generate analysis.";

/// General market outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOutlook {
    pub headline: String,
    pub key_trends: Vec<String>,
    pub top_movers: Vec<String>,
    pub advice: String,
}

/// Outlook for a single pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairAnalysis {
    pub sentiment: String,       // "Bullish" / "Bearish", free text from the model
    pub key_level: String,
    pub trade_idea: String,
}

impl PairAnalysis {
    pub fn is_bullish(&self) -> bool {
        self.sentiment.to_lowercase().contains("bullish")
    }
}

/// Response shapes that carry more requirements than their field types
pub trait Validate {
    fn validate(&self) -> Result<(), AnalysisError>;
}

fn non_blank(field: &str, value: &str) -> Result<(), AnalysisError> {
    if value.trim().is_empty() {
        return Err(AnalysisError::Schema(format!("{} is empty", field)));
    }
    Ok(())
}

impl Validate for MarketOutlook {
    fn validate(&self) -> Result<(), AnalysisError> {
        non_blank("headline", &self.headline)?;
        non_blank("advice", &self.advice)
    }
}

impl Validate for PairAnalysis {
    fn validate(&self) -> Result<(), AnalysisError> {
        non_blank("sentiment", &self.sentiment)?;
        non_blank("keyLevel", &self.key_level)?;
        non_blank("tradeIdea", &self.trade_idea)
    }
}

/// Error types for analysis requests
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    Parse(String),

    #[error("Response does not match schema: {0}")]
    Schema(String),
}

/// Source of generated market commentary
#[async_trait::async_trait]
pub trait MarketAnalyst: Send + Sync {
    async fn market_outlook(&self) -> Result<MarketOutlook, AnalysisError>;

    async fn pair_analysis(&self, symbol: &str) -> Result<PairAnalysis, AnalysisError>;

    fn name(&self) -> &str;
}

/// Identifies one request against a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What a panel currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelState<T> {
    Idle,
    Loading,
    Ready { value: T, fetched_at: DateTime<Utc> },
    Failed { message: String },
}

impl<T> PanelState<T> {
    /// The loaded value, absent while loading or after a failure
    pub fn value(&self) -> Option<&T> {
        match self {
            PanelState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }
}

/// Request generation plus state, shared by both panels
#[derive(Debug, Clone)]
struct Slot<T> {
    state: PanelState<T>,
    generation: u64,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: PanelState::Idle,
            generation: 0,
        }
    }

    fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = PanelState::Loading;
        Ticket(self.generation)
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.state = PanelState::Idle;
    }

    /// Apply a result if `ticket` is still current. A success replaces
    /// whatever was there; any failure leaves no value behind.
    fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<T, AnalysisError>,
        failure: &str,
    ) -> bool {
        if ticket.0 != self.generation {
            debug!(
                "Discarding stale analysis response (ticket {}, current {})",
                ticket.0, self.generation
            );
            return false;
        }
        self.state = match result {
            Ok(value) => PanelState::Ready {
                value,
                fetched_at: Utc::now(),
            },
            Err(e) => {
                warn!("Analysis request failed: {}", e);
                PanelState::Failed {
                    message: failure.to_string(),
                }
            }
        };
        true
    }
}

/// Home-page market outlook
#[derive(Debug, Clone)]
pub struct OutlookPanel {
    slot: Slot<MarketOutlook>,
}

impl OutlookPanel {
    pub fn new() -> Self {
        Self { slot: Slot::new() }
    }

    pub fn state(&self) -> &PanelState<MarketOutlook> {
        &self.slot.state
    }

    pub fn begin(&mut self) -> Ticket {
        self.slot.begin()
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<MarketOutlook, AnalysisError>,
    ) -> bool {
        self.slot.complete(ticket, result, OUTLOOK_FAILED_MESSAGE)
    }
}

impl Default for OutlookPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-pair analysis opened from the rate grid
#[derive(Debug, Clone)]
pub struct PairAnalysisPanel {
    selected: Option<String>,
    slot: Slot<PairAnalysis>,
}

impl PairAnalysisPanel {
    pub fn new() -> Self {
        Self {
            selected: None,
            slot: Slot::new(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn state(&self) -> &PanelState<PairAnalysis> {
        &self.slot.state
    }

    /// Select `symbol` and start a request for it
    pub fn begin(&mut self, symbol: &str) -> Ticket {
        self.selected = Some(symbol.to_string());
        self.slot.begin()
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<PairAnalysis, AnalysisError>,
    ) -> bool {
        self.slot.complete(ticket, result, PAIR_FAILED_MESSAGE)
    }

    /// Close the panel. Responses still in flight are discarded.
    pub fn dismiss(&mut self) {
        self.selected = None;
        self.slot.invalidate();
    }
}

impl Default for PairAnalysisPanel {
    fn default() -> Self {
        Self::new()
    }
}
