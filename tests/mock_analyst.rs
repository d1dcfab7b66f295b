//! Scripted analyst for driving the API without a model service

use async_trait::async_trait;
use forex_portal::analysis::{AnalysisError, MarketAnalyst, MarketOutlook, PairAnalysis};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays queued results, then answers with a fixed success
pub struct MockAnalyst {
    outlooks: Mutex<VecDeque<Result<MarketOutlook, AnalysisError>>>,
    pairs: Mutex<VecDeque<Result<PairAnalysis, AnalysisError>>>,
    calls: AtomicUsize,
}

impl MockAnalyst {
    pub fn new() -> Self {
        Self {
            outlooks: Mutex::new(VecDeque::new()),
            pairs: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn queue_outlook(&self, result: Result<MarketOutlook, AnalysisError>) {
        self.outlooks.lock().unwrap().push_back(result);
    }

    pub fn queue_pair(&self, result: Result<PairAnalysis, AnalysisError>) {
        self.pairs.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_outlook() -> MarketOutlook {
    MarketOutlook {
        headline: "Dollar steadies ahead of CPI".to_string(),
        key_trends: vec!["Yields flat".to_string()],
        top_movers: vec!["USD/JPY".to_string()],
        advice: "Keep position sizes small into the release".to_string(),
    }
}

pub fn sample_pair(sentiment: &str) -> PairAnalysis {
    PairAnalysis {
        sentiment: sentiment.to_string(),
        key_level: "1.0850".to_string(),
        trade_idea: "Buy dips toward support".to_string(),
    }
}

#[async_trait]
impl MarketAnalyst for MockAnalyst {
    async fn market_outlook(&self) -> Result<MarketOutlook, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outlooks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_outlook()))
    }

    async fn pair_analysis(&self, _symbol: &str) -> Result<PairAnalysis, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pairs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_pair("Bullish")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
