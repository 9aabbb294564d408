//! Async driver for the reveal engine.
//!
//! The engine lives on one tokio task. Signals arrive through a bounded
//! channel; the task sleeps until the engine's next wakeup or the next command,
//! whichever comes first, and hands every display update to a
//! [`TranscriptSink`].
//!
//! ```text
//! EngineHandle ──mpsc──▶ engine task ──DisplayUpdate──▶ TranscriptSink
//!                          ▲      │
//!                          └sleep_until(next_wakeup)
//! ```

use crate::clock::SystemClock;
use crate::engine::RevealEngine;
use crate::error::{AvatextError, Result};
use crate::signal::Signal;
use crate::sink::TranscriptSink;
use crate::transcript::Message;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Requests accepted by the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    Signal(Signal),
    /// Reply with the current transcript.
    Snapshot(oneshot::Sender<Vec<Message>>),
    /// Reply with the transcript once no reveal or refresh is pending.
    Settled(oneshot::Sender<Vec<Message>>),
    Shutdown,
}

/// Handle to a running engine task.
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    task: JoinHandle<Vec<Message>>,
}

impl EngineHandle {
    /// Queues a signal for the engine.
    pub async fn send(&self, signal: Signal) -> Result<()> {
        self.command(EngineCommand::Signal(signal)).await
    }

    /// Current transcript as seen by the engine task.
    pub async fn snapshot(&self) -> Result<Vec<Message>> {
        let (reply, rx) = oneshot::channel();
        self.command(EngineCommand::Snapshot(reply)).await?;
        rx.await.map_err(|_| AvatextError::EngineStopped)
    }

    /// Waits until every scheduled reveal has fired and the last refresh has
    /// been delivered, then returns the transcript.
    pub async fn settled(&self) -> Result<Vec<Message>> {
        let (reply, rx) = oneshot::channel();
        self.command(EngineCommand::Settled(reply)).await?;
        rx.await.map_err(|_| AvatextError::EngineStopped)
    }

    /// Clone of the command sender, for producers on other tasks.
    pub fn sender(&self) -> mpsc::Sender<EngineCommand> {
        self.tx.clone()
    }

    /// Stops the task and returns the final transcript.
    pub async fn shutdown(self) -> Result<Vec<Message>> {
        if self.tx.send(EngineCommand::Shutdown).await.is_err() {
            tracing::debug!("engine task already stopped");
        }
        self.task
            .await
            .map_err(|e| AvatextError::Other(format!("engine task failed: {e}")))
    }

    async fn command(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| AvatextError::EngineStopped)
    }
}

/// Spawns `engine` on the current tokio runtime.
pub fn spawn_engine<S: TranscriptSink>(
    engine: RevealEngine<SystemClock>,
    sink: S,
    buffer: usize,
) -> EngineHandle {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let task = tokio::spawn(run_engine(engine, sink, rx));
    EngineHandle { tx, task }
}

async fn run_engine<S: TranscriptSink>(
    mut engine: RevealEngine<SystemClock>,
    mut sink: S,
    mut rx: mpsc::Receiver<EngineCommand>,
) -> Vec<Message> {
    let clock = *engine.clock();
    let mut waiters: Vec<oneshot::Sender<Vec<Message>>> = Vec::new();
    tracing::debug!(sink = sink.name(), "engine task started");

    loop {
        let wake = engine.next_wakeup();
        tokio::select! {
            command = rx.recv() => match command {
                Some(EngineCommand::Signal(signal)) => engine.handle(signal),
                Some(EngineCommand::Snapshot(reply)) => {
                    if reply.send(engine.transcript().to_vec()).is_err() {
                        tracing::debug!("snapshot requester went away");
                    }
                }
                Some(EngineCommand::Settled(reply)) => waiters.push(reply),
                Some(EngineCommand::Shutdown) | None => break,
            },
            () = sleep_until_wake(&clock, wake) => {}
        }

        if let Some(update) = engine.poll() {
            deliver(&mut sink, &update);
        }
        if engine.next_wakeup().is_none() {
            for reply in waiters.drain(..) {
                if reply.send(engine.transcript().to_vec()).is_err() {
                    tracing::debug!("settle requester went away");
                }
            }
        }
    }

    if let Some(update) = engine.flush() {
        deliver(&mut sink, &update);
    }
    let transcript = engine.transcript().to_vec();
    for reply in waiters {
        if reply.send(transcript.clone()).is_err() {
            tracing::debug!("settle requester went away");
        }
    }
    sink.finish();
    tracing::debug!(messages = transcript.len(), "engine task stopped");
    transcript
}

async fn sleep_until_wake(clock: &SystemClock, wake: Option<Duration>) {
    match wake {
        Some(at) => tokio::time::sleep_until(clock.instant_at(at)).await,
        None => std::future::pending().await,
    }
}

fn deliver<S: TranscriptSink>(sink: &mut S, update: &crate::display::DisplayUpdate) {
    if let Err(e) = sink.handle(update) {
        tracing::warn!(sink = sink.name(), revision = update.revision, "{e}");
    }
}
