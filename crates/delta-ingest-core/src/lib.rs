//! Source-independent plumbing between a live telemetry source and its consumers.

use analysis::Snapshot;
use model::Reading;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashUpdate {
    pub reading: Reading,
    pub snapshot: Snapshot,
}

/// What a running source reports to the presentation side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DashEvent {
    /// Sent for every decoded datagram.
    RaceState(bool),
    /// Sent for race-on datagrams after the pipeline has run.
    Update(Box<DashUpdate>),
    /// Sent once after the source has released its socket.
    Stopped,
}

pub type DashTx = crossbeam_channel::Sender<DashEvent>;
pub type DashRx = crossbeam_channel::Receiver<DashEvent>;

/// Trait for any live source connector
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Runs until `cancel` fires or the receiver goes away.
    async fn run(&self, tx: DashTx, cancel: CancellationToken) -> Result<(), IngestError>;
}

pub fn channel() -> (DashTx, DashRx) {
    crossbeam_channel::unbounded()
}

/// A source running on the tokio runtime. Dropping the handle without
/// calling [`IngestHandle::stop`] cancels the source but does not wait for it.
pub struct IngestHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), IngestError>>>,
}

impl IngestHandle {
    pub fn spawn<S: TelemetrySource + 'static>(source: S, tx: DashTx) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { source.run(tx, token).await });
        Self { cancel, task: Some(task) }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Requests a stop and waits for the source to exit. Once this returns
    /// the source's socket is closed.
    pub async fn stop(mut self) -> Result<(), IngestError> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else { return Ok(()) };
        match task.await {
            Ok(res) => {
                debug!("ingest task joined");
                res
            }
            Err(err) => {
                warn!(?err, "ingest task did not finish cleanly");
                Err(IngestError::Msg(format!("ingest task failed: {err}")))
            }
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
