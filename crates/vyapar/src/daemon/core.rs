use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::DaemonConfig;
use crate::error::Error;
use crate::orchestrator::Orchestrator;
use crate::request::{AutomationRequest, ResponseStatus};

use super::store::TaskStore;
use super::types::{DaemonCommand, QueuedTask, TaskState};

/// Cloneable handle for submitting work and reading task state.
#[derive(Clone)]
pub struct DaemonHandle {
    tx: mpsc::UnboundedSender<DaemonCommand>,
    store: Arc<dyn TaskStore>,
}

impl DaemonHandle {
    /// Submit a request: create in store as Pending, enqueue for the worker.
    pub fn submit(
        &self,
        request: AutomationRequest,
        source: impl Into<String>,
    ) -> Result<Uuid, Error> {
        let id = Uuid::new_v4();
        let source = source.into();
        self.store
            .insert(QueuedTask::new(id, request.clone(), &source))?;
        self.tx
            .send(DaemonCommand::SubmitRequest {
                id,
                request,
                source,
            })
            .map_err(|_| Error::Daemon("daemon command channel closed".into()))?;
        Ok(id)
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<QueuedTask>, Error> {
        self.store.get(id)
    }

    pub fn list_tasks(&self, limit: usize, offset: usize) -> Result<(Vec<QueuedTask>, usize), Error> {
        self.store.list(limit, offset)
    }

    pub fn cancel(&self, id: Uuid) -> Result<(), Error> {
        self.tx
            .send(DaemonCommand::CancelTask { id })
            .map_err(|_| Error::Daemon("daemon command channel closed".into()))
    }
}

/// The daemon event loop: drains the command channel, executes tasks via the
/// orchestrator with bounded concurrency.
pub struct DaemonCore {
    rx: mpsc::UnboundedReceiver<DaemonCommand>,
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn TaskStore>,
    semaphore: Arc<Semaphore>,
    task_cancels: Arc<std::sync::RwLock<HashMap<Uuid, CancellationToken>>>,
    active_tasks: JoinSet<()>,
    cancel: CancellationToken,
}

impl DaemonCore {
    pub fn new(
        config: &DaemonConfig,
        orchestrator: Arc<Orchestrator>,
        store: Arc<dyn TaskStore>,
        cancel: CancellationToken,
    ) -> (Self, DaemonHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = DaemonHandle {
            tx,
            store: store.clone(),
        };
        let core = Self {
            rx,
            orchestrator,
            store,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_tasks)),
            task_cancels: Arc::new(std::sync::RwLock::new(HashMap::new())),
            active_tasks: JoinSet::new(),
            cancel,
        };
        (core, handle)
    }

    /// Run the worker loop. Blocks until cancellation, then drains active
    /// tasks before returning.
    pub async fn run(mut self) -> Result<(), Error> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("daemon shutting down, draining active tasks");
                    while self.active_tasks.join_next().await.is_some() {}
                    break;
                }
                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::warn!("daemon command channel closed");
                        while self.active_tasks.join_next().await.is_some() {}
                        break;
                    };
                    match cmd {
                        DaemonCommand::SubmitRequest { id, request, .. } => {
                            self.start_task(id, request).await;
                        }
                        DaemonCommand::CancelTask { id } => {
                            self.cancel_task(id);
                        }
                    }
                }
                Some(result) = self.active_tasks.join_next() => {
                    if let Err(e) = result {
                        tracing::error!("task panicked: {e}");
                    }
                }
            }
        }
        Ok(())
    }

    async fn start_task(&mut self, id: Uuid, request: AutomationRequest) {
        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => return, // semaphore closed
        };

        let task_cancel = CancellationToken::new();
        if let Ok(mut cancels) = self.task_cancels.write() {
            cancels.insert(id, task_cancel.clone());
        }

        let orchestrator = self.orchestrator.clone();
        let store = self.store.clone();
        let task_cancels = self.task_cancels.clone();

        self.active_tasks.spawn(async move {
            store
                .update(id, &|t| {
                    t.state = TaskState::Running;
                    t.started_at = Some(Utc::now());
                })
                .ok();

            tokio::select! {
                envelope = orchestrator.process(&request) => {
                    let failed = envelope.status == ResponseStatus::Error;
                    store
                        .update(id, &|t| {
                            if failed {
                                t.state = TaskState::Failed;
                                t.error = envelope.error.clone();
                            } else {
                                t.state = TaskState::Completed;
                            }
                            t.completed_at = Some(Utc::now());
                            t.result = Some(envelope.clone());
                        })
                        .ok();
                }
                _ = task_cancel.cancelled() => {
                    store
                        .update(id, &|t| {
                            t.state = TaskState::Cancelled;
                            t.completed_at = Some(Utc::now());
                        })
                        .ok();
                }
            }

            if let Ok(mut cancels) = task_cancels.write() {
                cancels.remove(&id);
            }
            drop(permit);
        });
    }

    fn cancel_task(&self, id: Uuid) {
        // Cancel the running task if it exists.
        if let Ok(cancels) = self.task_cancels.read() {
            if let Some(token) = cancels.get(&id) {
                token.cancel();
                return;
            }
        }
        // Not running: mark a pending task cancelled in the store.
        if let Ok(Some(task)) = self.store.get(id) {
            if task.state == TaskState::Pending {
                self.store
                    .update(id, &|t| {
                        t.state = TaskState::Cancelled;
                        t.completed_at = Some(Utc::now());
                    })
                    .ok();
            }
        }
    }
}
