//! Periodic update scheduler
//!
//! `MarketSimulator` is the tickable core: it owns the random source and the
//! per-loop timing and can be stepped by hand. `spawn` drives it from real
//! tokio intervals against the shared portal and hands back a
//! `SchedulerHandle` that cancels every loop on shutdown or drop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Interval};
use tracing::{debug, info, warn};

use crate::market::MarketBoard;
use crate::portal::Portal;

/// The independent update loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateLoop {
    Confidence,
    Ticker,
    Grid,
}

/// Period of each update loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub confidence: Duration,
    pub ticker: Duration,
    pub grid: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            confidence: Duration::from_secs(5),
            ticker: Duration::from_secs(3),
            grid: Duration::from_secs(4),
        }
    }
}

impl Cadence {
    pub fn period(&self, which: UpdateLoop) -> Duration {
        match which {
            UpdateLoop::Confidence => self.confidence,
            UpdateLoop::Ticker => self.ticker,
            UpdateLoop::Grid => self.grid,
        }
    }
}

/// Number of times each loop fired during an `advance`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub confidence: u32,
    pub ticker: u32,
    pub grid: u32,
}

/// Deterministic market jitter with an injectable random source
pub struct MarketSimulator<R> {
    rng: R,
    cadence: Cadence,
    since_confidence: Duration,
    since_ticker: Duration,
    since_grid: Duration,
}

impl MarketSimulator<StdRng> {
    /// Simulator seeded from OS entropy
    pub fn from_entropy(cadence: Cadence) -> Self {
        Self::new(StdRng::from_entropy(), cadence)
    }
}

impl<R: Rng> MarketSimulator<R> {
    pub fn new(rng: R, cadence: Cadence) -> Self {
        Self {
            rng,
            cadence,
            since_confidence: Duration::ZERO,
            since_ticker: Duration::ZERO,
            since_grid: Duration::ZERO,
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Run one iteration of a single loop
    pub fn fire(&mut self, board: &mut MarketBoard, which: UpdateLoop, now: Instant) {
        match which {
            UpdateLoop::Confidence => {
                let confidence = board.tick_confidence(&mut self.rng);
                debug!("Signal confidence now {}%", confidence);
            }
            UpdateLoop::Ticker => {
                board.tick_ticker(&mut self.rng, now);
            }
            UpdateLoop::Grid => board.tick_grid(&mut self.rng),
        }
    }

    /// Step simulated time forward by `dt`, firing every loop whose period
    /// elapsed. Loops with a zero period never fire.
    pub fn advance(&mut self, board: &mut MarketBoard, dt: Duration, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        self.since_confidence += dt;
        self.since_ticker += dt;
        self.since_grid += dt;

        let cadence = self.cadence;
        report.confidence = Self::drain(&mut self.since_confidence, cadence.confidence);
        report.ticker = Self::drain(&mut self.since_ticker, cadence.ticker);
        report.grid = Self::drain(&mut self.since_grid, cadence.grid);

        for _ in 0..report.confidence {
            self.fire(board, UpdateLoop::Confidence, now);
        }
        for _ in 0..report.ticker {
            self.fire(board, UpdateLoop::Ticker, now);
        }
        for _ in 0..report.grid {
            self.fire(board, UpdateLoop::Grid, now);
        }

        report
    }

    fn drain(elapsed: &mut Duration, period: Duration) -> u32 {
        if period.is_zero() {
            *elapsed = Duration::ZERO;
            return 0;
        }
        let mut fired = 0;
        while *elapsed >= period {
            *elapsed -= period;
            fired += 1;
        }
        fired
    }
}

/// Cancels the running update loops
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop every loop and wait for the task to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Scheduler task ended abnormally: {}", e);
                }
            }
        }
        info!("Market scheduler stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Zero-period loops are disabled
fn loop_interval(start: tokio::time::Instant, period: Duration) -> Option<Interval> {
    (!period.is_zero()).then(|| interval_at(start + period, period))
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Start the update loops against `portal`. The first update of each loop
/// happens one full period after start.
pub fn spawn<R>(portal: Arc<RwLock<Portal>>, mut simulator: MarketSimulator<R>) -> SchedulerHandle
where
    R: Rng + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let cadence = simulator.cadence();

    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let mut confidence = loop_interval(start, cadence.confidence);
        let mut ticker = loop_interval(start, cadence.ticker);
        let mut grid = loop_interval(start, cadence.grid);

        info!(
            "Market scheduler started: confidence={:?}, ticker={:?}, grid={:?}",
            cadence.confidence, cadence.ticker, cadence.grid
        );

        loop {
            let which = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = next_tick(&mut confidence) => UpdateLoop::Confidence,
                _ = next_tick(&mut ticker) => UpdateLoop::Ticker,
                _ = next_tick(&mut grid) => UpdateLoop::Grid,
            };

            let now = tokio::time::Instant::now().into_std();
            let mut portal = portal.write().await;
            simulator.fire(&mut portal.market, which, now);
        }
    });

    SchedulerHandle {
        shutdown: shutdown_tx,
        task: Some(task),
    }
}
