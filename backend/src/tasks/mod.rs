// Per-connection telemetry emitter task.
// Invariants: one emitter per socket connection; stopping or dropping the
// emitter ends its task, so no timer outlives the connection.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use rover_telemetry_core::generator::snapshot_at;
use rover_telemetry_core::TelemetrySnapshot;

use crate::constants::EMITTER_CHANNEL_CAP;
use crate::utils::now_epoch_ms;

pub struct TelemetryEmitter {
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl TelemetryEmitter {
    /// Starts emitting; the first snapshot is produced immediately.
    pub fn spawn(period: Duration) -> (Self, mpsc::Receiver<TelemetrySnapshot>) {
        let (tx, rx) = mpsc::channel(EMITTER_CHANNEL_CAP);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(emit_loop(period, tx, cancel_rx));
        (
            Self {
                cancel: Some(cancel_tx),
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Cancels the task and waits for it, returning how many snapshots it emitted.
    pub async fn stop(mut self) -> u64 {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for TelemetryEmitter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn emit_loop(
    period: Duration,
    tx: mpsc::Sender<TelemetrySnapshot>,
    mut cancel: oneshot::Receiver<()>,
) -> u64 {
    let mut rng = StdRng::from_entropy();
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut emitted = 0u64;

    loop {
        tokio::select! {
            _ = &mut cancel => break,
            _ = interval.tick() => {
                let snapshot = snapshot_at(now_epoch_ms(), &mut rng);
                if tx.send(snapshot).await.is_err() {
                    break;
                }
                emitted += 1;
            }
        }
    }
    debug!(emitted, "telemetry emitter stopped");
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_first_snapshot_immediately() {
        let (emitter, mut rx) = TelemetryEmitter::spawn(Duration::from_secs(3600));
        let snapshot = time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("first tick should be immediate")
            .expect("channel open");
        assert!((0.0..=100.0).contains(&snapshot.battery));
        emitter.stop().await;
    }

    #[tokio::test]
    async fn stop_ends_emission() {
        let (emitter, mut rx) = TelemetryEmitter::spawn(Duration::from_millis(10));
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        let emitted = emitter.stop().await;
        assert!(emitted >= 2);
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn drop_aborts_task() {
        let (emitter, mut rx) = TelemetryEmitter::spawn(Duration::from_millis(10));
        rx.recv().await.unwrap();
        drop(emitter);
        let drained = time::timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "sender should be released after drop");
    }

    #[tokio::test]
    async fn closed_receiver_stops_task() {
        let (emitter, rx) = TelemetryEmitter::spawn(Duration::from_millis(5));
        drop(rx);
        let emitted = time::timeout(Duration::from_secs(1), emitter.stop())
            .await
            .unwrap();
        assert!(emitted <= 1);
    }
}
