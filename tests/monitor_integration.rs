//! Integration tests for the position monitor
//!
//! Runs full cycles against an in-memory ledger, a fake market source and a
//! recording notifier.

mod common;

use common::{
    active_position, open_market, settled_market, FakeMarketSource, FlakyLedger,
    RecordingNotifier,
};
use paper_trader::common::errors::TraderError;
use paper_trader::common::channels::create_shutdown_channel;
use paper_trader::common::traits::PositionLedger;
use paper_trader::config::types::MonitorConfig;
use paper_trader::positions::{CycleReport, InMemoryLedger, PositionMonitor, PositionStatus};
use paper_trader::progress::ProgressTracker;
use paper_trader::Side;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Harness {
    ledger: Arc<InMemoryLedger>,
    market: Arc<FakeMarketSource>,
    notifier: Arc<RecordingNotifier>,
    progress: Arc<ProgressTracker>,
    monitor: PositionMonitor,
}

fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        interval_seconds: 3600,
        position_delay_ms: 0,
        price_move_threshold_cents: dec!(1),
    }
}

async fn harness() -> Harness {
    let ledger = Arc::new(InMemoryLedger::with_positions(vec![
        active_position("a1", "user-a", "KXWIN", Side::Yes, dec!(30)),
        active_position("a2", "user-a", "KXMOVE", Side::No, dec!(40)),
        active_position("a3", "user-a", "KXFAIL", Side::Yes, dec!(50)),
        active_position("b1", "user-b", "KXLOSE", Side::Yes, dec!(60)),
        active_position("b2", "user-b", "KXFLAT", Side::Yes, dec!(50)),
        active_position("c1", "user-c", "KXFLAT", Side::Yes, dec!(50)),
    ]));

    let market = Arc::new(FakeMarketSource::new());
    market.set_market(settled_market("KXWIN", Side::Yes)).await;
    market.set_market(open_market("KXMOVE", dec!(57))).await;
    market.set_market(settled_market("KXLOSE", Side::No)).await;
    market.set_market(open_market("KXFLAT", dec!(50))).await;
    market.fail_ticker("KXFAIL").await;

    let notifier = Arc::new(RecordingNotifier::new());
    let progress = Arc::new(ProgressTracker::new(ledger.clone(), dec!(10000)));
    let monitor = PositionMonitor::new(
        ledger.clone(),
        market.clone(),
        notifier.clone(),
        progress.clone(),
        &monitor_config(),
        "Position Update",
    );

    Harness {
        ledger,
        market,
        notifier,
        progress,
        monitor,
    }
}

#[test_log::test(tokio::test)]
async fn test_cycle_settles_and_sends_one_digest_per_user() {
    let h = harness().await;

    let report = h.monitor.run_cycle().await.expect("cycle should run");
    assert_eq!(
        report,
        CycleReport {
            users: 3,
            positions_checked: 6,
            settlements: 2,
            price_moves: 1,
            failures: 1,
            digests: 2,
        }
    );

    let mut sent = h.notifier.sent().await;
    sent.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    let bodies: Vec<(&str, &str)> = sent
        .iter()
        .map(|d| (d.user_id.as_str(), d.body.as_str()))
        .collect();
    assert_eq!(
        bodies,
        vec![
            ("user-a", "Settled: KXWIN W +70¢ | Moved: KXMOVE +3¢"),
            ("user-b", "Settled: KXLOSE L -60¢"),
        ]
    );
    assert!(sent.iter().all(|d| d.title == "Position Update"));
}

#[tokio::test]
async fn test_cycle_persists_transitions() {
    let h = harness().await;
    h.monitor.run_cycle().await.unwrap();

    let won = h.ledger.get_position("a1").await.unwrap().unwrap();
    assert_eq!(won.status, PositionStatus::SettledWin);
    assert_eq!(won.settlement_price, Some(dec!(100)));
    assert_eq!(won.realized_pnl, Some(dec!(70)));
    assert_eq!(won.current_price, None);

    let lost = h.ledger.get_position("b1").await.unwrap().unwrap();
    assert_eq!(lost.status, PositionStatus::SettledLoss);
    assert_eq!(lost.realized_pnl, Some(dec!(-60)));

    let moved = h.ledger.get_position("a2").await.unwrap().unwrap();
    assert_eq!(moved.status, PositionStatus::Active);
    assert_eq!(moved.current_price, Some(dec!(43)));
    assert_eq!(moved.last_notified_price, Some(dec!(43)));

    // A failed lookup leaves the position untouched
    let failed = h.ledger.get_position("a3").await.unwrap().unwrap();
    assert_eq!(failed.status, PositionStatus::Active);
    assert_eq!(failed.updated_at, None);
}

#[tokio::test]
async fn test_settlement_recounts_progress() {
    let h = harness().await;
    h.monitor.run_cycle().await.unwrap();

    // 10000 - 30 - 40 - 50 + 100
    let a = h.ledger.get_progress("user-a").await.unwrap().unwrap();
    assert_eq!(a.total_positions, 3);
    assert_eq!(a.settled_positions, 1);
    assert_eq!(a.paper_balance, dec!(9980));

    // 10000 - 60 - 50
    let b = h.progress.paper_balance("user-b").await.unwrap();
    assert_eq!(b, dec!(9890));

    // No settlement, no progress record written by the monitor
    assert!(h.ledger.get_progress("user-c").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_cycle_is_quiet() {
    let h = harness().await;
    h.monitor.run_cycle().await.unwrap();
    let first = h.notifier.sent().await.len();

    let report = h.monitor.run_cycle().await.unwrap();
    assert_eq!(report.users, 3);
    assert_eq!(report.settlements, 0);
    assert_eq!(report.price_moves, 0);
    assert_eq!(report.digests, 0);
    assert_eq!(h.notifier.sent().await.len(), first);
}

#[tokio::test]
async fn test_move_below_threshold_is_not_reported() {
    let h = harness().await;
    h.monitor.run_cycle().await.unwrap();

    // Last notified at 43; 42.5 is under the one-cent threshold
    h.market.set_market(open_market("KXMOVE", dec!(57.5))).await;
    let report = h.monitor.run_cycle().await.unwrap();
    assert_eq!(report.price_moves, 0);

    h.market.set_market(open_market("KXMOVE", dec!(60))).await;
    let report = h.monitor.run_cycle().await.unwrap();
    assert_eq!(report.price_moves, 1);
    let sent = h.notifier.sent().await;
    assert_eq!(sent.last().unwrap().body, "Moved: KXMOVE -3¢");
}

#[tokio::test]
async fn test_empty_ledger_cycle() {
    let ledger = Arc::new(InMemoryLedger::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = PositionMonitor::new(
        ledger.clone(),
        Arc::new(FakeMarketSource::new()),
        notifier.clone(),
        Arc::new(ProgressTracker::new(ledger, dec!(10000))),
        &monitor_config(),
        "Position Update",
    );

    assert_eq!(monitor.run_cycle().await.unwrap(), CycleReport::default());
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let h = harness().await;
    let (tx, rx) = create_shutdown_channel();
    tx.send(()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), h.monitor.run(rx))
        .await
        .expect("monitor should stop after the first cycle");

    assert_eq!(h.notifier.sent().await.len(), 2);
}

#[tokio::test]
async fn test_each_cycle_purges_expired_market_data() {
    let h = harness().await;
    h.monitor.run_cycle().await.unwrap();
    h.monitor.run_cycle().await.unwrap();
    assert_eq!(h.market.purge_count(), 2);
}

#[tokio::test]
async fn test_positions_are_paced_by_delay() {
    let h = harness().await;
    let monitor = PositionMonitor::new(
        h.ledger.clone(),
        h.market.clone(),
        h.notifier.clone(),
        h.progress.clone(),
        &MonitorConfig {
            position_delay_ms: 20,
            ..monitor_config()
        },
        "Position Update",
    );

    let started = Instant::now();
    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.positions_checked, 6);
    assert!(started.elapsed() >= Duration::from_millis(6 * 20));
    assert_eq!(report.digests, 2);
}

#[test_log::test(tokio::test)]
async fn test_enumeration_failure_fails_cycle_but_not_loop() {
    let inner = Arc::new(InMemoryLedger::with_positions(vec![active_position(
        "a1",
        "user-a",
        "KXWIN",
        Side::Yes,
        dec!(30),
    )]));
    let ledger = Arc::new(FlakyLedger::new(inner.clone(), 1));
    let market = Arc::new(FakeMarketSource::new());
    market.set_market(settled_market("KXWIN", Side::Yes)).await;
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = PositionMonitor::new(
        ledger.clone(),
        market,
        notifier.clone(),
        Arc::new(ProgressTracker::new(inner.clone(), dec!(10000))),
        &MonitorConfig {
            interval_seconds: 1,
            ..monitor_config()
        },
        "Position Update",
    );

    assert!(matches!(monitor.run_cycle().await, Err(TraderError::Ledger(_))));
    assert_eq!(ledger.listings(), 1);
    assert!(notifier.sent().await.is_empty());

    // A failed cycle inside the loop is logged and the next one still runs
    let flaky = Arc::new(FlakyLedger::new(inner.clone(), 1));
    let looping_market = Arc::new(FakeMarketSource::new());
    looping_market.set_market(settled_market("KXWIN", Side::Yes)).await;
    let looping = PositionMonitor::new(
        flaky.clone(),
        looping_market,
        notifier.clone(),
        Arc::new(ProgressTracker::new(inner.clone(), dec!(10000))),
        &MonitorConfig {
            interval_seconds: 1,
            ..monitor_config()
        },
        "Position Update",
    );
    let (tx, rx) = create_shutdown_channel();
    let stop_after_digest = async {
        while notifier.sent().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(()).await.unwrap();
    };

    tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(looping.run(rx), stop_after_digest)
    })
    .await
    .expect("monitor should recover and then stop");

    assert_eq!(flaky.listings(), 2);
    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "Settled: KXWIN W +70¢");
    let settled = inner.get_position("a1").await.unwrap().unwrap();
    assert_eq!(settled.status, PositionStatus::SettledWin);
}
