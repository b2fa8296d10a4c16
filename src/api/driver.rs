//! Live simulation driver: one tokio task owning the engine.
//!
//! Ticks, commands and shutdown are multiplexed in a single `select!` loop,
//! so a command is always applied between two ticks and ticks never overlap.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::sensor::Sensor;
use crate::sim::command::Command;
use crate::sim::engine::Engine;
use crate::sim::types::Snapshot;

/// Pending commands buffered before senders wait.
const COMMAND_QUEUE: usize = 32;

/// Error talking to the driver task.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("simulation driver has stopped")]
    Stopped,
    #[error("simulation driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A command paired with the channel its post-command snapshot goes to.
struct Envelope {
    command: Command,
    reply: oneshot::Sender<Snapshot>,
}

/// Cloneable handle for reading state and issuing commands.
#[derive(Clone)]
pub struct DriverClient {
    commands: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<Snapshot>,
}

impl DriverClient {
    /// Latest published snapshot.
    pub fn latest(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Queues `command` and waits for the snapshot taken right after it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Stopped`] if the driver is no longer running.
    pub async fn send(&self, command: Command) -> Result<Snapshot, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| DriverError::Stopped)?;
        response.await.map_err(|_| DriverError::Stopped)
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }
}

/// Owner handle of a running driver.
pub struct LiveHandle<S: Sensor> {
    client: DriverClient,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<Engine<S>>,
}

impl<S: Sensor + Send + 'static> LiveHandle<S> {
    pub fn client(&self) -> DriverClient {
        self.client.clone()
    }

    /// Stops the clock and returns the engine with its last state.
    ///
    /// A tick in progress completes first; no tick starts afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Join`] if the driver task panicked.
    pub async fn stop(self) -> Result<Engine<S>, DriverError> {
        // The task may already be gone; joining reports that.
        let _ = self.shutdown.send(());
        Ok(self.join.await?)
    }
}

/// Spawns the driver task ticking `engine` once per `period`.
///
/// The first tick fires one period after start. A late tick delays the
/// schedule instead of bursting.
pub fn spawn<S: Sensor + Send + 'static>(engine: Engine<S>, period: Duration) -> LiveHandle<S> {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let join = tokio::spawn(drive(engine, period, command_rx, snapshot_tx, shutdown_rx));

    LiveHandle {
        client: DriverClient {
            commands: command_tx,
            snapshots: snapshot_rx,
        },
        shutdown: shutdown_tx,
        join,
    }
}

async fn drive<S: Sensor>(
    mut engine: Engine<S>,
    period: Duration,
    mut commands: mpsc::Receiver<Envelope>,
    snapshots: watch::Sender<Snapshot>,
    mut shutdown: oneshot::Receiver<()>,
) -> Engine<S> {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = period.as_millis() as u64, "simulation driver started");

    loop {
        tokio::select! {
            biased;

            // Fires on an explicit stop or when the owner handle is dropped.
            _ = &mut shutdown => {
                info!(tick = engine.ticks(), "simulation driver stopping");
                break;
            }

            // Ticks take precedence over queued commands.
            _ = ticker.tick() => {
                snapshots.send_replace(engine.tick());
            }

            Some(envelope) = commands.recv() => {
                debug!(command = %envelope.command, "applying command");
                engine.apply(&envelope.command);
                let snapshot = engine.snapshot();
                snapshots.send_replace(snapshot.clone());
                // The requester may have given up waiting.
                let _ = envelope.reply.send(snapshot);
            }
        }
    }

    engine
}
