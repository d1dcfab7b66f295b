//! Update loops on a paused clock

use forex_portal::market::{CONFIDENCE_MAX, CONFIDENCE_MIN};
use forex_portal::scheduler::{self, Cadence, MarketSimulator};
use forex_portal::Portal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

fn simulator() -> MarketSimulator<StdRng> {
    MarketSimulator::new(StdRng::seed_from_u64(42), Cadence::default())
}

#[tokio::test(start_paused = true)]
async fn test_loops_fire_on_their_own_periods() {
    let portal = Arc::new(RwLock::new(Portal::seeded()));
    let ticker_before = portal.read().await.market.ticker().to_vec();
    let grid_before = portal.read().await.market.grid().to_vec();

    let handle = scheduler::spawn(portal.clone(), simulator());

    // Nothing fires before the first full period
    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(portal.read().await.market.ticker(), ticker_before.as_slice());

    tokio::time::sleep(Duration::from_millis(200)).await;
    {
        let portal = portal.read().await;
        assert_ne!(portal.market.ticker(), ticker_before.as_slice());
        assert_eq!(portal.market.grid(), grid_before.as_slice());
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    {
        let portal = portal.read().await;
        assert!(portal
            .market
            .grid()
            .iter()
            .zip(&grid_before)
            .all(|(now, before)| now.price != before.price));
        let confidence = portal.market.signal().confidence;
        assert!((CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&confidence));
    }

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_updates_after_shutdown() {
    let portal = Arc::new(RwLock::new(Portal::seeded()));
    let handle = scheduler::spawn(portal.clone(), simulator());

    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.shutdown().await;

    let ticker = portal.read().await.market.ticker().to_vec();
    let grid = portal.read().await.market.grid().to_vec();
    let signal = portal.read().await.market.signal().clone();

    tokio::time::sleep(Duration::from_secs(60)).await;

    let portal = portal.read().await;
    assert_eq!(portal.market.ticker(), ticker.as_slice());
    assert_eq!(portal.market.grid(), grid.as_slice());
    assert_eq!(portal.market.signal(), &signal);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_loops() {
    let portal = Arc::new(RwLock::new(Portal::seeded()));
    let handle = scheduler::spawn(portal.clone(), simulator());
    drop(handle);
    tokio::task::yield_now().await;

    let grid = portal.read().await.market.grid().to_vec();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(portal.read().await.market.grid(), grid.as_slice());
}
