use crate::config::MirrorSettings;
use cricket_common::match_state::MatchState;
use log::*;
use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::{self, JoinHandle},
    time::{Duration, timeout},
};

/// Somewhere live match state gets copied to for viewers. Pushing must never
/// block the caller, and a failed push is not a failed ball.
pub trait RealtimeMirror {
    fn push(&self, state: &MatchState) -> Result<(), MirrorError>;
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("The mirror queue is full, dropping update for match {0}")]
    QueueFull(String),
    #[error("The mirror worker has stopped")]
    Closed,
}

#[derive(Debug)]
enum WorkerMessage {
    NewState(Box<MatchState>),
    Stop,
}

/// Cheap handle that feeds the mirror worker.
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    tx: mpsc::Sender<WorkerMessage>,
}

impl RealtimeMirror for MirrorHandle {
    fn push(&self, state: &MatchState) -> Result<(), MirrorError> {
        self.tx
            .try_send(WorkerMessage::NewState(Box::new(state.clone())))
            .map_err(|e| match e {
                TrySendError::Full(_) => MirrorError::QueueFull(state.id.to_string()),
                TrySendError::Closed(_) => MirrorError::Closed,
            })
    }
}

/// Owns the background task that `PUT`s each state to
/// `{url}/matches/{id}.json`. Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct MirrorSender {
    tx: mpsc::Sender<WorkerMessage>,
    worker_join: Option<JoinHandle<()>>,
}

impl MirrorSender {
    pub fn new(settings: &MirrorSettings) -> Result<Self, reqwest::Error> {
        let builder = ClientBuilder::new().timeout(Duration::from_millis(settings.timeout_ms));
        let client = match settings.proxy {
            Some(ref proxy) => builder.proxy(Proxy::all(proxy)?),
            None => builder.no_proxy(),
        }
        .build()?;
        let base_url = settings.url.trim_end_matches('/').to_string();

        let (tx, rx) = mpsc::channel(settings.queue_len.max(1));
        let worker_join = task::spawn(worker_loop(rx, client, base_url));

        Ok(Self {
            tx,
            worker_join: Some(worker_join),
        })
    }

    pub fn handle(&self) -> MirrorHandle {
        MirrorHandle {
            tx: self.tx.clone(),
        }
    }

    /// Lets queued updates drain for up to `grace`, then stops the worker.
    pub async fn shutdown(mut self, grace: Duration) {
        let Some(join) = self.worker_join.take() else {
            return;
        };
        if self.tx.send(WorkerMessage::Stop).await.is_err() {
            join.abort();
            return;
        }
        let abort = join.abort_handle();
        if timeout(grace, join).await.is_err() {
            warn!("Mirror did not drain within {grace:?}, abandoning queued updates");
            abort.abort();
        }
    }
}

impl Drop for MirrorSender {
    fn drop(&mut self) {
        if let Some(join) = self.worker_join.take() {
            if self.tx.try_send(WorkerMessage::Stop).is_err() {
                join.abort();
            }
        }
    }
}

async fn worker_loop(mut rx: mpsc::Receiver<WorkerMessage>, client: Client, base_url: String) {
    while let Some(msg) = rx.recv().await {
        match msg {
            WorkerMessage::NewState(state) => push_state(&client, &base_url, &state).await,
            WorkerMessage::Stop => {
                debug!("Mirror worker stopping");
                break;
            }
        }
    }
}

async fn push_state(client: &Client, base_url: &str, state: &MatchState) {
    let url = format!("{base_url}/matches/{}.json", state.id);
    match client.put(&url).json(state).send().await {
        Ok(response) if response.status().is_success() => {
            debug!("Mirrored match {} to {url}", state.id);
        }
        Ok(response) => {
            warn!(
                "Mirror rejected match {} update with status {}",
                state.id,
                response.status()
            );
        }
        Err(e) => {
            error!("Mirror push for match {} failed: {e}", state.id);
        }
    }
}
