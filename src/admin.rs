//! Admin content workflow
//!
//! `closed -> type selection -> form entry -> submitting -> success -> closed`.
//! Submission is local and synchronous. Success is held for
//! `SUCCESS_DISPLAY` and then the flow closes itself and resets the forms.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Broker, NewsArticle, PortalError, Result, STAR_SCALE};

/// How long the success state stays visible before the flow closes
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(2);

/// Category preselected in the news form
pub const DEFAULT_CATEGORY: &str = "Analysis";
/// Categories offered by the news form (the field itself is free text)
pub const NEWS_CATEGORIES: [&str; 4] = ["Analysis", "Forecast", "Commodities", "Crypto"];

const DEFAULT_MIN_DEPOSIT: &str = "$100";
const DEFAULT_LEVERAGE: &str = "1:30";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    News,
    Broker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Closed,
    TypeSelection,
    FormEntry(ContentKind),
    Submitting(ContentKind),
    Success { kind: ContentKind, since: Instant },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Closed => "closed",
            FlowState::TypeSelection => "type_selection",
            FlowState::FormEntry(_) => "form_entry",
            FlowState::Submitting(_) => "submitting",
            FlowState::Success { .. } => "success",
        }
    }

    pub fn kind(&self) -> Option<ContentKind> {
        match self {
            FlowState::FormEntry(kind) | FlowState::Submitting(kind) => Some(*kind),
            FlowState::Success { kind, .. } => Some(*kind),
            FlowState::Closed | FlowState::TypeSelection => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsForm {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub summary: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for NewsForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: default_category(),
            summary: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub regulation: String,
    #[serde(default = "default_min_deposit")]
    pub min_deposit: String,
    #[serde(default = "default_rating")]
    pub rating: f64,
}

fn default_min_deposit() -> String {
    DEFAULT_MIN_DEPOSIT.to_string()
}

fn default_rating() -> f64 {
    STAR_SCALE as f64
}

impl Default for BrokerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            regulation: String::new(),
            min_deposit: default_min_deposit(),
            rating: default_rating(),
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PortalError::MissingField(field));
    }
    Ok(value.to_string())
}

fn generated_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl NewsForm {
    /// Validate and build the article. The category keeps its default when
    /// left blank.
    pub fn build(&self) -> Result<NewsArticle> {
        let title = required("title", &self.title)?;
        let summary = required("summary", &self.summary)?;
        let category = match self.category.trim() {
            "" => default_category(),
            c => c.to_string(),
        };
        let id = generated_id();

        Ok(NewsArticle {
            image: format!("https://picsum.photos/seed/{}/800/450", id),
            id,
            title,
            category,
            timestamp: "Just now".to_string(),
            summary,
        })
    }
}

impl BrokerForm {
    pub fn build(&self) -> Result<Broker> {
        let name = required("name", &self.name)?;
        let regulation = required("regulation", &self.regulation)?;
        let min_deposit = required("minDeposit", &self.min_deposit)?;
        if !(0.0..=STAR_SCALE as f64).contains(&self.rating) {
            return Err(PortalError::InvalidField {
                field: "rating",
                reason: format!("{} is outside 0-{}", self.rating, STAR_SCALE),
            });
        }
        let id = generated_id();

        Ok(Broker {
            logo: format!("https://picsum.photos/seed/{}/100/100", id),
            id,
            name,
            rating: self.rating,
            min_deposit,
            leverage: DEFAULT_LEVERAGE.to_string(),
            regulation,
            link: "#".to_string(),
        })
    }
}

/// A completed form, ready to hand to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentForm {
    News(NewsForm),
    Broker(BrokerForm),
}

impl ContentForm {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentForm::News(_) => ContentKind::News,
            ContentForm::Broker(_) => ContentKind::Broker,
        }
    }
}

/// Content produced by a successful submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Article(NewsArticle),
    Broker(Broker),
}

/// Add-content workflow with its form drafts
#[derive(Debug, Clone)]
pub struct ContentFlow {
    state: FlowState,
    news_form: NewsForm,
    broker_form: BrokerForm,
}

impl ContentFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Closed,
            news_form: NewsForm::default(),
            broker_form: BrokerForm::default(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn news_form(&self) -> &NewsForm {
        &self.news_form
    }

    pub fn broker_form(&self) -> &BrokerForm {
        &self.broker_form
    }

    /// Open the flow. With a kind (quick action) it skips type selection.
    pub fn open(&mut self, kind: Option<ContentKind>) {
        self.state = match kind {
            Some(kind) => FlowState::FormEntry(kind),
            None => FlowState::TypeSelection,
        };
        debug!("Content flow -> {}", self.state.name());
    }

    /// Pick the content type. Ignored unless the flow is selecting or
    /// already editing a form.
    pub fn choose(&mut self, kind: ContentKind) {
        if matches!(self.state, FlowState::TypeSelection | FlowState::FormEntry(_)) {
            self.state = FlowState::FormEntry(kind);
        }
    }

    /// Step back from a form to type selection. Entered fields are kept.
    pub fn back(&mut self) {
        if let FlowState::FormEntry(_) = self.state {
            self.state = FlowState::TypeSelection;
            debug!("Content flow -> {}", self.state.name());
        }
    }

    /// True once a success display has run its course
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.state, FlowState::Success { since, .. }
            if now.saturating_duration_since(since) >= SUCCESS_DISPLAY)
    }

    /// Close and reset both forms
    pub fn close(&mut self) {
        self.state = FlowState::Closed;
        self.news_form = NewsForm::default();
        self.broker_form = BrokerForm::default();
    }

    /// Validate `form` and produce the content to store. On a validation
    /// error the entered fields are kept and the flow stays in form entry.
    pub fn submit(&mut self, form: ContentForm, now: Instant) -> Result<Submission> {
        let FlowState::FormEntry(open) = self.state else {
            return Err(PortalError::NoActiveForm);
        };
        let kind = form.kind();
        if kind != open {
            return Err(PortalError::WrongFormKind {
                open,
                submitted: kind,
            });
        }

        self.state = FlowState::Submitting(kind);

        let built = match form {
            ContentForm::News(news) => {
                let result = news.build().map(Submission::Article);
                self.news_form = news;
                result
            }
            ContentForm::Broker(broker) => {
                let result = broker.build().map(Submission::Broker);
                self.broker_form = broker;
                result
            }
        };

        match built {
            Ok(submission) => {
                info!("Content submitted: {:?}", kind);
                self.state = FlowState::Success { kind, since: now };
                Ok(submission)
            }
            Err(e) => {
                debug!("Content submission rejected: {}", e);
                self.state = FlowState::FormEntry(kind);
                Err(e)
            }
        }
    }

    /// Auto-close once the success display interval has passed
    pub fn expire(&mut self, now: Instant) {
        if self.is_due(now) {
            self.close();
        }
    }
}

impl Default for ContentFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTab {
    #[default]
    Overview,
    News,
    Brokers,
}

/// Headline figure on the admin overview
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStat {
    pub label: &'static str,
    pub value: &'static str,
    pub change: &'static str,
}

/// Fixed overview figures. There is no analytics source behind these.
pub fn dashboard_stats() -> Vec<DashboardStat> {
    vec![
        DashboardStat { label: "Total Visits", value: "42.8K", change: "+12%" },
        DashboardStat { label: "Signal Success", value: "88.4%", change: "+5%" },
        DashboardStat { label: "New Signups", value: "1,204", change: "+24%" },
        DashboardStat { label: "Broker Clicks", value: "18.9K", change: "-2%" },
    ]
}
