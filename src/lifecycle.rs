//! Lifecycle Module
//!
//! Background maintenance cadence and controlled shutdown for an open engine.
//!
//! ## State Machine
//! ```text
//!   ┌─────────┐  set_maintenance_interval
//!   │ Running │◄──────────────┐
//!   └────┬────┘───────────────┘
//!        │ close()
//!        ▼
//!   ┌─────────┐  target closed, ack sent  ┌────────┐
//!   │ Closing │──────────────────────────►│ Closed │
//!   └─────────┘                           └────────┘
//! ```
//!
//! One background thread serves a `select!` over the maintenance ticker and
//! a command queue. Ticks and interval updates are therefore never
//! concurrent. Every `close()` mints its own acknowledgement channel, so
//! repeated or concurrent calls are safe.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{LexiError, Result};
use crate::storage::MaintenanceOutcome;

/// Something the lifecycle manager can maintain and close
pub trait Maintainable: Send + Sync + 'static {
    /// One space-reclamation pass
    fn run_maintenance(&self, reclaim_ratio: f64) -> Result<MaintenanceOutcome>;

    /// Release the underlying resources
    fn close(&self) -> Result<()>;
}

impl Maintainable for Engine {
    fn run_maintenance(&self, reclaim_ratio: f64) -> Result<MaintenanceOutcome> {
        Engine::run_maintenance(self, reclaim_ratio)
    }

    fn close(&self) -> Result<()> {
        Engine::close(self)
    }
}

/// Where the manager is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Closing,
    Closed,
}

/// Messages to the maintenance thread
enum Command {
    UpdateInterval(Duration),
    Shutdown { ack: Sender<Result<()>> },
}

/// Owns an engine's maintenance thread and its shutdown handshake
pub struct LifecycleManager<T: Maintainable = Engine> {
    target: Arc<T>,
    commands: Sender<Command>,
    state: Arc<Mutex<LifecycleState>>,
    /// Last interval accepted by `set_maintenance_interval`
    interval: Mutex<Duration>,
    close_timeout: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleManager<Engine> {
    /// Open an engine and start maintaining it
    pub fn open(config: Config) -> Result<Self> {
        let engine = Arc::new(Engine::open(config.clone())?);
        Self::start(engine, &config)
    }

    /// The engine under management
    pub fn engine(&self) -> &Arc<Engine> {
        &self.target
    }
}

impl<T: Maintainable> LifecycleManager<T> {
    /// Start maintaining `target` with the cadence and timeouts in `config`
    pub fn start(target: Arc<T>, config: &Config) -> Result<Self> {
        config.validate()?;

        let (commands, inbox) = channel::unbounded();
        let state = Arc::new(Mutex::new(LifecycleState::Running));

        let worker = MaintenanceLoop {
            target: Arc::clone(&target),
            inbox,
            state: Arc::clone(&state),
            reclaim_ratio: config.reclaim_ratio,
        };
        let interval = config.maintenance_interval;
        let handle = thread::Builder::new()
            .name("lexikv-maintenance".to_string())
            .spawn(move || worker.run(interval))?;

        tracing::debug!("Maintenance loop started, interval {:?}", interval);

        Ok(Self {
            target,
            commands,
            state,
            interval: Mutex::new(interval),
            close_timeout: config.close_timeout,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// The maintained target
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Last accepted maintenance interval
    pub fn maintenance_interval(&self) -> Duration {
        *self.interval.lock()
    }

    /// Change the maintenance interval
    ///
    /// A zero interval is ignored. Otherwise the ticker restarts, so the next
    /// pass happens `interval` after the loop picks up the change; no pass is
    /// run early. Ignored once the manager is closed.
    pub fn set_maintenance_interval(&self, interval: Duration) {
        if interval.is_zero() {
            return;
        }
        if self.commands.send(Command::UpdateInterval(interval)).is_ok() {
            *self.interval.lock() = interval;
        }
    }

    /// Stop maintenance and close the target
    ///
    /// Returns the target's close result once the loop acknowledges, or
    /// `CloseTimedOut` if no acknowledgement arrives within the configured
    /// timeout. A timeout means the outcome is unknown: the loop may still
    /// finish closing in the background. Calling `close` after the loop has
    /// exited returns `Ok(())`.
    pub fn close(&self) -> Result<()> {
        let (ack, acked) = channel::bounded(1);
        if self.commands.send(Command::Shutdown { ack }).is_err() {
            return Ok(());
        }

        match acked.recv_timeout(self.close_timeout) {
            Ok(result) => {
                if let Some(handle) = self.worker.lock().take() {
                    let _ = handle.join();
                }
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Maintenance loop did not acknowledge shutdown within {:?}",
                    self.close_timeout
                );
                Err(LexiError::CloseTimedOut)
            }
            // An earlier shutdown already stopped the loop
            Err(RecvTimeoutError::Disconnected) => Ok(()),
        }
    }
}

/// State owned by the maintenance thread
struct MaintenanceLoop<T: Maintainable> {
    target: Arc<T>,
    inbox: Receiver<Command>,
    state: Arc<Mutex<LifecycleState>>,
    reclaim_ratio: f64,
}

impl<T: Maintainable> MaintenanceLoop<T> {
    fn run(self, mut interval: Duration) {
        let mut ticker = channel::tick(interval);

        loop {
            // `None` = ticker fired
            let received = select! {
                recv(ticker) -> _ => None,
                recv(self.inbox) -> command => Some(command),
            };

            match received {
                None => self.tick(),
                Some(Ok(Command::UpdateInterval(next))) => {
                    tracing::debug!("Maintenance interval {:?} -> {:?}", interval, next);
                    interval = next;
                    ticker = channel::tick(interval);
                }
                Some(Ok(Command::Shutdown { ack })) => {
                    let result = self.shutdown();
                    let _ = ack.send(result);
                    return;
                }
                // Manager dropped without close()
                Some(Err(_)) => {
                    if let Err(e) = self.shutdown() {
                        tracing::warn!("Close after manager drop failed: {}", e);
                    }
                    return;
                }
            }
        }
    }

    /// Fire-and-forget maintenance pass
    fn tick(&self) {
        match self.target.run_maintenance(self.reclaim_ratio) {
            Ok(outcome) => tracing::debug!("Maintenance tick: {:?}", outcome),
            Err(e) => tracing::warn!("Maintenance tick failed: {}", e),
        }
    }

    fn shutdown(&self) -> Result<()> {
        *self.state.lock() = LifecycleState::Closing;
        let result = self.target.close();
        *self.state.lock() = LifecycleState::Closed;

        match &result {
            Ok(()) => tracing::info!("Engine closed"),
            Err(e) => tracing::warn!("Engine close failed: {}", e),
        }
        result
    }
}
