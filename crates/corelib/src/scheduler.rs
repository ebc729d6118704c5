//! Drives the periodic maintenance protocol across every node in a
//! directory: one `tokio::time::interval` per tick kind, each tick fanning
//! out to every live actor's mailbox.
//!
//! Mirrors the interval/shutdown-select shape used by background
//! persistence tasks, generalized from a single background job to three
//! independent periodic passes sharing one directory.

use crate::actor::{Command, TickKind};
use crate::cluster::Directory;
use crate::config::RingConfig;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Handle to a running [`Scheduler`] background task. Dropping it does not
/// stop the scheduler; call [`SchedulerHandle::shutdown`] explicitly.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Signals every periodic loop to stop after its current tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Spawns the three maintenance loops (stabilize, fix_fingers,
/// check_predecessor) against every node currently or later registered in
/// `directory`. Each loop reads `directory.ids()` fresh on every tick, so
/// nodes created or removed after the scheduler starts are picked up
/// without restarting it.
pub fn spawn(directory: Arc<Directory>, config: RingConfig) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    spawn_loop(
        directory.clone(),
        config.stabilize_period,
        TickKind::Stabilize,
        shutdown_rx.clone(),
    );
    spawn_loop(
        directory.clone(),
        config.fix_fingers_period,
        TickKind::FixFingers,
        shutdown_rx.clone(),
    );
    spawn_loop(
        directory,
        config.check_predecessor_period,
        TickKind::CheckPredecessor,
        shutdown_rx,
    );

    SchedulerHandle { shutdown_tx }
}

fn spawn_loop(
    directory: Arc<Directory>,
    period: Duration,
    kind: TickKind,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_round(&directory, kind).await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });
}

#[tracing::instrument(skip(directory), fields(kind = ?kind))]
async fn run_round(directory: &Directory, kind: TickKind) {
    for id in directory.ids() {
        let Some(actor) = directory.get(&id) else {
            continue;
        };
        let (reply, rx) = oneshot::channel();
        if actor.send(Command::Tick { kind, reply }).await.is_err() {
            tracing::debug!(node = %id, "actor mailbox closed, skipping tick");
            continue;
        }
        match rx.await {
            Ok(Err(e)) => tracing::warn!(node = %id, error = %e, "maintenance tick failed"),
            Err(_) => tracing::debug!(node = %id, "actor dropped reply before responding"),
            Ok(Ok(())) => {}
        }
    }
}
