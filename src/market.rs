//! Simulated market board: ticker strip, live rate grid and the top signal.

use rand::Rng;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::seed;
use crate::types::{MarketPair, MarketSignal, PairStatus};

/// Lowest confidence the top signal may show
pub const CONFIDENCE_MIN: u8 = 90;
/// Highest confidence the top signal may show
pub const CONFIDENCE_MAX: u8 = 99;

/// Ticker jitter as a fraction of current price
pub const TICKER_JITTER: f64 = 0.001;
/// Grid jitter as a fraction of current price
pub const GRID_JITTER: f64 = 0.0005;

/// How long a freshly updated ticker entry stays highlighted
pub const TICKER_HIGHLIGHT: Duration = Duration::from_secs(1);

impl MarketPair {
    /// Move the price by `delta` and recompute change figures against the
    /// reference price. Status follows the sign of `delta`, not of the
    /// cumulative change.
    pub fn apply_delta(&mut self, delta: f64) {
        self.price = (self.price + delta).max(f64::MIN_POSITIVE);
        self.change = self.price - self.reference_price;
        self.change_percent = if self.reference_price > 0.0 {
            self.change / self.reference_price * 100.0
        } else {
            0.0
        };
        self.status = PairStatus::from_delta(delta);
    }

    /// Random delta of up to +/- `fraction / 2` of the current price
    fn jitter<R: Rng>(&mut self, rng: &mut R, fraction: f64) -> f64 {
        let delta = (rng.gen::<f64>() - 0.5) * self.price * fraction;
        self.apply_delta(delta);
        delta
    }
}

/// Pairs whose symbol contains `query`, case-insensitively
pub fn filter_pairs<'a>(pairs: &'a [MarketPair], query: &str) -> Vec<&'a MarketPair> {
    pairs.iter().filter(|p| p.matches(query)).collect()
}

/// Live numeric state mutated by the scheduler
#[derive(Debug, Clone)]
pub struct MarketBoard {
    ticker: Vec<MarketPair>,
    grid: Vec<MarketPair>,
    signal: MarketSignal,
    last_ticker_update: Option<(usize, Instant)>,
}

impl MarketBoard {
    pub fn new(ticker: Vec<MarketPair>, grid: Vec<MarketPair>, signal: MarketSignal) -> Self {
        Self {
            ticker,
            grid,
            signal,
            last_ticker_update: None,
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed::ticker_pairs(), seed::grid_pairs(), seed::top_signal())
    }

    pub fn ticker(&self) -> &[MarketPair] {
        &self.ticker
    }

    pub fn grid(&self) -> &[MarketPair] {
        &self.grid
    }

    pub fn signal(&self) -> &MarketSignal {
        &self.signal
    }

    pub fn grid_pair(&self, symbol: &str) -> Option<&MarketPair> {
        self.grid.iter().find(|p| p.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Ticker index updated within the highlight window, if any
    pub fn highlighted_ticker(&self, now: Instant) -> Option<usize> {
        self.last_ticker_update
            .filter(|(_, at)| now.saturating_duration_since(*at) < TICKER_HIGHLIGHT)
            .map(|(idx, _)| idx)
    }

    /// Step confidence by -1, 0 or +1, clamped to the allowed range
    pub fn tick_confidence<R: Rng>(&mut self, rng: &mut R) -> u8 {
        let step: i16 = rng.gen_range(-1..=1);
        self.nudge_confidence(step)
    }

    pub fn nudge_confidence(&mut self, step: i16) -> u8 {
        let next = (self.signal.confidence as i16 + step)
            .clamp(CONFIDENCE_MIN as i16, CONFIDENCE_MAX as i16);
        self.signal.confidence = next as u8;
        self.signal.confidence
    }

    /// Perturb one randomly chosen ticker pair
    pub fn tick_ticker<R: Rng>(&mut self, rng: &mut R, now: Instant) -> Option<usize> {
        if self.ticker.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.ticker.len());
        let delta = self.ticker[idx].jitter(rng, TICKER_JITTER);
        trace!("Ticker {} moved by {:.6}", self.ticker[idx].symbol, delta);
        self.last_ticker_update = Some((idx, now));
        Some(idx)
    }

    /// Perturb every grid pair
    pub fn tick_grid<R: Rng>(&mut self, rng: &mut R) {
        for pair in &mut self.grid {
            pair.jitter(rng, GRID_JITTER);
        }
    }
}

impl Default for MarketBoard {
    fn default() -> Self {
        Self::seeded()
    }
}
