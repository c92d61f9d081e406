//! Integration tests for the sync facade. These use real time, so intervals
//! are kept short and assertions only check lower bounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use auto_refresh::{BlockingAutoRefresh, FetchError, RefreshConfig};

fn recording_fetch(
    calls: &Arc<Mutex<Vec<u64>>>,
) -> impl Fn(u64) -> std::future::Ready<Result<(), FetchError>> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |invoice_id: u64| {
        calls.lock().push(invoice_id);
        std::future::ready(Ok(()))
    }
}

#[test]
fn test_blocking_refresh_fetches_current_target() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let refresh = BlockingAutoRefresh::new(
        recording_fetch(&calls),
        RefreshConfig::default().with_interval_millis(20),
    )
    .unwrap();

    refresh.set_target(1042);
    thread::sleep(Duration::from_millis(150));

    refresh.set_target(1043);
    thread::sleep(Duration::from_millis(150));

    let stats = refresh.stats();
    refresh.shutdown().unwrap();

    let calls = calls.lock().clone();
    assert!(calls.contains(&1042));
    assert!(calls.contains(&1043));
    assert!(stats.dispatched >= 2);
    assert!(stats.is_running);
}

#[test]
fn test_blocking_refresh_stops_on_shutdown() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let refresh = BlockingAutoRefresh::new(
        recording_fetch(&calls),
        RefreshConfig::default().with_interval_millis(10),
    )
    .unwrap();

    let handle = refresh.handle();
    handle.set_target(7);
    thread::sleep(Duration::from_millis(50));

    refresh.shutdown().unwrap();
    let after_shutdown = calls.lock().len();
    assert!(after_shutdown >= 1);

    // The handle outlives the controller but nothing polls any more
    handle.set_target(8);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(calls.lock().len(), after_shutdown);
    assert!(!calls.lock().contains(&8));
}

#[test]
fn test_blocking_refresh_without_target_skips() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let refresh = BlockingAutoRefresh::new(
        recording_fetch(&calls),
        RefreshConfig::default().with_interval_millis(10),
    )
    .unwrap();

    thread::sleep(Duration::from_millis(50));
    let stats = refresh.stats();
    drop(refresh);

    assert!(calls.lock().is_empty());
    assert!(stats.skipped >= 1);
    assert_eq!(stats.dispatched, 0);
}

#[test]
fn test_blocking_shutdown_waits_for_in_flight_fetch() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let fetch = move |_: u64| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, FetchError>(())
        }
    };

    // Only the immediate first tick fires during this test
    let refresh = BlockingAutoRefresh::with_target(
        fetch,
        RefreshConfig::default().with_interval(Duration::from_secs(60)),
        1042,
    )
    .unwrap();

    thread::sleep(Duration::from_millis(50));
    assert_eq!(refresh.stats().in_flight, 1);

    refresh.shutdown().unwrap();
    assert!(finished.load(Ordering::SeqCst));
}

#[test]
fn test_blocking_refresh_goes_quiet_after_drop() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let refresh = BlockingAutoRefresh::new(
        recording_fetch(&calls),
        RefreshConfig::default().with_interval_millis(10),
    )
    .unwrap();

    refresh.set_target(5);
    thread::sleep(Duration::from_millis(30));
    drop(refresh);

    // A tick may still land while the worker picks up the signal
    thread::sleep(Duration::from_millis(50));
    let settled = calls.lock().len();
    assert!(settled >= 1);

    thread::sleep(Duration::from_millis(60));
    assert_eq!(calls.lock().len(), settled);
}
