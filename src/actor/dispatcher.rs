use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use crate::actor::broker::{Broker, REQUEST_TOPIC};
use crate::actor::companion::Companion;
use crate::actor::model::{InternalMessage, Queue, ResponseSignal, SharedCompanion, Task, lock};
use crate::actor::worker::spawn_worker;

const MAX_WAIT_TIME: u64 = 10; // seconds

pub struct Dispatcher {
    broker: Broker,
    queue: Queue,
    active_tasks: Arc<AtomicUsize>,
    companion: SharedCompanion,

    handles: JoinSet<()>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(broker: Broker, companion: Companion) -> Self {
        Self {
            broker,
            queue: Arc::new(Mutex::new(VecDeque::<Task>::new())),
            active_tasks: Arc::new(AtomicUsize::new(0)),
            companion: Arc::new(Mutex::new(companion)),
            handles: JoinSet::new(),
            task_handle: None,
        }
    }

    pub fn queue(&self) -> Queue {
        self.queue.clone()
    }

    pub fn companion(&self) -> SharedCompanion {
        self.companion.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<InternalMessage> {
        self.topic().subscribe()
    }

    pub fn topic(&self) -> tokio::sync::broadcast::Sender<InternalMessage> {
        self.broker.topic(REQUEST_TOPIC).sender.clone()
    }

    pub fn send(
        &self,
        msg: InternalMessage,
    ) -> Result<usize, tokio::sync::broadcast::error::SendError<InternalMessage>> {
        self.broker.publish(REQUEST_TOPIC, msg)
    }

    pub async fn start(&mut self, workers: u8) {
        for _ in 0..workers {
            let rx = self.subscribe();
            let queue = self.queue.clone();
            let active_tasks = self.active_tasks.clone();
            let companion = self.companion.clone();

            self.handles
                .spawn(spawn_worker(rx, queue, active_tasks, companion));
        }

        let mut receiver = self.subscribe();
        let sender = self.topic();
        let queue = self.queue();
        let companion = self.companion();

        self.task_handle = Some(tokio::spawn(async move {
            let mut accepting = true;
            loop {
                match receiver.recv().await {
                    Ok(InternalMessage::TaskRequest(request)) if !accepting => {
                        tracing::debug!("Refusing request {} during shutdown", request.request_id);
                        let _ = request
                            .respond_to
                            .send(ResponseSignal::Error {
                                request_id: request.request_id,
                                message: "companion is shutting down".to_string(),
                            })
                            .await;
                    }
                    Ok(InternalMessage::TaskRequest(request)) => {
                        tracing::info!(
                            "Received {} request {} from {}",
                            request.command.method(),
                            request.request_id,
                            request.owner
                        );
                        {
                            lock(&queue).push_back(Task::from(request));
                        }
                        let _ = sender.send(InternalMessage::TaskAdded);
                    }
                    Ok(InternalMessage::RemoteLoaded(snapshot)) => {
                        lock(&companion).apply_remote(&snapshot);
                    }
                    Ok(InternalMessage::GracefulStop) => {
                        accepting = false;
                    }
                    Ok(InternalMessage::Stop) => {
                        tracing::debug!("Request listener received stop signal");
                        break;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Request listener lagged, {} messages dropped", skipped);
                    }
                    Err(e) => {
                        tracing::error!("Error receiving request: {}", e);
                        break;
                    }
                }
            }

            tracing::info!("Request listener stopped.");
        }));
    }

    pub async fn stop(&mut self) {
        tracing::info!("Initiating graceful shutdown...");

        let _ = self.send(InternalMessage::GracefulStop);

        let start_time = tokio::time::Instant::now();

        loop {
            let active = self.active_task_count();
            let pending = self.pending_task_count();

            if !poll_tasks(start_time, active, pending) {
                break;
            }

            // Pending work with nobody on it means a TaskAdded was missed.
            if pending > 0 && active == 0 {
                let _ = self.send(InternalMessage::TaskAdded);
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }

        tracing::info!("All tasks completed (or timed out), stopping workers...");

        let _ = self.send(InternalMessage::Stop);

        if let Some(task_handle) = self.task_handle.take() {
            tracing::info!("Waiting for request listener to finish...");
            match tokio::time::timeout(tokio::time::Duration::from_secs(5), task_handle).await {
                Ok(_) => tracing::info!("Request listener finished gracefully"),
                Err(_) => tracing::warn!("Request listener timed out, continuing shutdown"),
            }
        }

        let worker_timeout = tokio::time::Duration::from_secs(5);
        let worker_start = tokio::time::Instant::now();

        loop {
            if self.handles.is_empty() {
                tracing::info!("All worker handles completed");
                break;
            }

            if worker_start.elapsed() > worker_timeout {
                tracing::warn!("Timeout waiting for workers to stop. Aborting remaining workers.");
                self.handles.abort_all();
                break;
            }

            match tokio::time::timeout(
                tokio::time::Duration::from_millis(100),
                self.handles.join_next(),
            )
            .await
            {
                Ok(Some(Ok(_))) => tracing::debug!("Worker stopped successfully"),
                Ok(Some(Err(e))) => tracing::warn!("Worker stopped with error: {:?}", e),
                Ok(None) => break,
                Err(_) => {}
            }
        }

        tracing::info!("All tasks completed and workers stopped.");
    }

    pub async fn force_stop(&mut self) {
        tracing::warn!("Force stopping dispatcher...");

        let _ = self.send(InternalMessage::Stop);

        if let Some(task_handle) = self.task_handle.take() {
            task_handle.abort();
        }
        self.handles.abort_all();

        tracing::warn!("Force stop completed - all tasks and workers terminated immediately.");
    }

    pub fn active_task_count(&self) -> usize {
        self.active_tasks.load(Ordering::SeqCst)
    }

    pub fn pending_task_count(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn total_task_count(&self) -> usize {
        self.active_task_count() + self.pending_task_count()
    }
}

fn poll_tasks(start_time: tokio::time::Instant, active: usize, pending: usize) -> bool {
    if active == 0 && pending == 0 {
        return false;
    }

    if start_time.elapsed() > tokio::time::Duration::from_secs(MAX_WAIT_TIME) {
        tracing::warn!(
            "Timeout waiting for tasks to complete. Active: {}, Pending: {}. Forcing shutdown.",
            active,
            pending
        );
        return false;
    }

    tracing::info!(
        "Waiting for tasks to complete... Active: {}, Pending: {} (elapsed: {:?})",
        active,
        pending,
        start_time.elapsed()
    );

    true
}
