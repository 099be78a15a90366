//! LifecycleManager Tests
//!
//! Tests verify:
//! - Maintenance ticks at the configured cadence
//! - Interval updates (zero ignored, ignored after close)
//! - Close handshake: result propagation, timeout, repeated calls
//! - Shutdown when the manager is dropped

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lexikv::config::Config;
use lexikv::lifecycle::{LifecycleManager, LifecycleState, Maintainable};
use lexikv::{LexiError, MaintenanceOutcome, Result};
use tempfile::TempDir;

// =============================================================================
// Fake Target
// =============================================================================

#[derive(Default)]
struct FakeTarget {
    ticks: AtomicUsize,
    closes: AtomicUsize,
    close_delay: Duration,
    fail_maintenance: bool,
    fail_close: bool,
}

impl FakeTarget {
    fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Maintainable for FakeTarget {
    fn run_maintenance(&self, _reclaim_ratio: f64) -> Result<MaintenanceOutcome> {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        if self.fail_maintenance {
            return Err(LexiError::Storage("disk full".to_string()));
        }
        Ok(MaintenanceOutcome::Skipped { reclaimable: 0.0 })
    }

    fn close(&self) -> Result<()> {
        thread::sleep(self.close_delay);
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(LexiError::Storage("flush failed".to_string()));
        }
        Ok(())
    }
}

fn config(interval: Duration, close_timeout: Duration) -> Config {
    Config::builder()
        .maintenance_interval(interval)
        .close_timeout(close_timeout)
        .build()
}

fn start(target: FakeTarget, interval: Duration) -> (Arc<FakeTarget>, LifecycleManager<FakeTarget>) {
    let target = Arc::new(target);
    let manager = LifecycleManager::start(
        Arc::clone(&target),
        &config(interval, Duration::from_secs(5)),
    )
    .unwrap();
    (target, manager)
}

/// Poll until `cond` holds or `timeout` passes
fn wait_for(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

// =============================================================================
// Ticks
// =============================================================================

#[test]
fn test_ticks_at_interval() {
    let (target, manager) = start(FakeTarget::default(), Duration::from_millis(30));

    assert!(wait_for(Duration::from_secs(2), || target.ticks() >= 3));
    assert_eq!(manager.state(), LifecycleState::Running);

    manager.close().unwrap();
}

#[test]
fn test_failed_tick_keeps_loop_alive() {
    let target = FakeTarget {
        fail_maintenance: true,
        ..Default::default()
    };
    let (target, manager) = start(target, Duration::from_millis(20));

    assert!(wait_for(Duration::from_secs(2), || target.ticks() >= 3));
    manager.close().unwrap();
}

#[test]
fn test_invalid_config_rejected() {
    let target = Arc::new(FakeTarget::default());
    let config = Config::builder().reclaim_ratio(2.0).build();

    assert!(matches!(
        LifecycleManager::start(target, &config),
        Err(LexiError::Config(_))
    ));
}

// =============================================================================
// Interval Updates
// =============================================================================

#[test]
fn test_interval_update_takes_effect() {
    let (target, manager) = start(FakeTarget::default(), Duration::from_secs(3600));

    thread::sleep(Duration::from_millis(100));
    assert_eq!(target.ticks(), 0);

    manager.set_maintenance_interval(Duration::from_millis(20));
    assert_eq!(manager.maintenance_interval(), Duration::from_millis(20));
    assert!(wait_for(Duration::from_secs(2), || target.ticks() >= 3));

    manager.close().unwrap();
}

#[test]
fn test_interval_update_does_not_tick_early() {
    let (target, manager) = start(FakeTarget::default(), Duration::from_millis(20));
    assert!(wait_for(Duration::from_secs(2), || target.ticks() >= 1));

    manager.set_maintenance_interval(Duration::from_secs(3600));
    // Let the loop pick up the change, then make sure nothing else fires
    thread::sleep(Duration::from_millis(60));
    let settled = target.ticks();
    thread::sleep(Duration::from_millis(150));

    assert_eq!(target.ticks(), settled);
    manager.close().unwrap();
}

#[test]
fn test_zero_interval_ignored() {
    let (_target, manager) = start(FakeTarget::default(), Duration::from_secs(60));

    manager.set_maintenance_interval(Duration::ZERO);

    assert_eq!(manager.maintenance_interval(), Duration::from_secs(60));
    manager.close().unwrap();
}

#[test]
fn test_interval_update_after_close_ignored() {
    let (_target, manager) = start(FakeTarget::default(), Duration::from_secs(60));
    manager.close().unwrap();

    manager.set_maintenance_interval(Duration::from_secs(1));

    assert_eq!(manager.maintenance_interval(), Duration::from_secs(60));
}

// =============================================================================
// Close
// =============================================================================

#[test]
fn test_close_closes_target_once() {
    let (target, manager) = start(FakeTarget::default(), Duration::from_secs(60));

    manager.close().unwrap();
    assert_eq!(manager.state(), LifecycleState::Closed);
    assert_eq!(target.closes(), 1);

    // Loop is gone; later calls are no-ops
    manager.close().unwrap();
    assert_eq!(target.closes(), 1);
}

#[test]
fn test_close_returns_target_error() {
    let target = FakeTarget {
        fail_close: true,
        ..Default::default()
    };
    let (_target, manager) = start(target, Duration::from_secs(60));

    assert!(matches!(manager.close(), Err(LexiError::Storage(_))));
    assert_eq!(manager.state(), LifecycleState::Closed);
}

#[test]
fn test_close_times_out() {
    let target = Arc::new(FakeTarget {
        close_delay: Duration::from_millis(800),
        ..Default::default()
    });
    let manager = LifecycleManager::start(
        Arc::clone(&target),
        &config(Duration::from_secs(60), Duration::from_millis(200)),
    )
    .unwrap();

    let started = Instant::now();
    let result = manager.close();
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(LexiError::CloseTimedOut)));
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(800));
    assert_eq!(manager.state(), LifecycleState::Closing);

    // The loop still finishes in the background
    assert!(wait_for(Duration::from_secs(3), || target.closes() == 1));
    assert!(wait_for(Duration::from_secs(1), || {
        manager.state() == LifecycleState::Closed
    }));
}

#[test]
fn test_concurrent_close_calls() {
    let target = FakeTarget {
        close_delay: Duration::from_millis(50),
        ..Default::default()
    };
    let (target, manager) = start(target, Duration::from_secs(60));
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.close())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(target.closes(), 1);
}

#[test]
fn test_drop_without_close_closes_target() {
    let (target, manager) = start(FakeTarget::default(), Duration::from_secs(60));

    drop(manager);

    assert!(wait_for(Duration::from_secs(2), || target.closes() == 1));
}

// =============================================================================
// Real Engine
// =============================================================================

#[test]
fn test_manages_engine() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(dir.path())
        .maintenance_interval(Duration::from_millis(20))
        .build();

    let manager = LifecycleManager::open(config).unwrap();
    manager.engine().set(b"k", b"v").unwrap();
    thread::sleep(Duration::from_millis(60));

    manager.close().unwrap();

    assert!(manager.engine().is_closed());
    assert!(matches!(manager.engine().get(b"k"), Err(LexiError::Closed)));
}
