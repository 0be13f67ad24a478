use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::actor::{
    error::Error,
    model::{InternalMessage, Queue, ResponseSignal, SharedCompanion, Task, lock},
    refresh::fetch_remote,
};
use crate::api::model::Command;

pub async fn spawn_worker(
    receiver: tokio::sync::broadcast::Receiver<InternalMessage>,
    queue: Queue,
    active_tasks: Arc<AtomicUsize>,
    companion: SharedCompanion,
) {
    let worker_id = Uuid::new_v4();
    let mut rx = receiver;
    let mut graceful_stop = false;
    tracing::info!("Worker {} started, waiting for signals...", worker_id);

    loop {
        let signal_result =
            tokio::time::timeout(tokio::time::Duration::from_secs(1), rx.recv()).await;

        match signal_result {
            Ok(Ok(signal)) => match signal {
                InternalMessage::TaskAdded => {
                    if let Err(e) = process_next(
                        queue.clone(),
                        active_tasks.clone(),
                        companion.clone(),
                        worker_id,
                    )
                    .await
                    {
                        match e {
                            Error::QueueEmptyError => {
                                tracing::debug!("No tasks available in queue for worker {}", worker_id);
                            }
                            Error::ProcessError { message } => {
                                tracing::error!("Error processing task: {}", message);
                            }
                        }
                    }
                }
                InternalMessage::GracefulStop => {
                    tracing::info!("Worker received graceful stop signal, draining queue");
                    graceful_stop = true;
                }
                InternalMessage::Stop => {
                    tracing::info!("Worker received stop signal, exiting...");
                    break;
                }
                _ => {}
            },
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!("Worker {} lagged behind by {} signals", worker_id, skipped);
                // Signals may have been dropped; make sure the backlog still drains.
                drain(&queue, &active_tasks, &companion, worker_id).await;
            }
            Ok(Err(RecvError::Closed)) => {
                tracing::warn!("Worker {} signal channel closed", worker_id);
                break;
            }
            Err(_) => {
                if graceful_stop && lock(&queue).is_empty() {
                    tracing::info!("No pending tasks, worker exiting during graceful stop");
                    break;
                }
            }
        }
    }

    tracing::info!("Worker {} finished processing signals.", worker_id);
}

async fn drain(queue: &Queue, active_tasks: &Arc<AtomicUsize>, companion: &SharedCompanion, worker_id: Uuid) {
    while process_next(queue.clone(), active_tasks.clone(), companion.clone(), worker_id)
        .await
        .is_ok()
    {}
}

async fn process_next(
    queue: Queue,
    active_tasks: Arc<AtomicUsize>,
    companion: SharedCompanion,
    worker_id: Uuid,
) -> Result<(), Error> {
    let task = { lock(&queue).pop_front() };
    let Some(task) = task else {
        return Err(Error::QueueEmptyError);
    };

    active_tasks.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(
        "Worker {} started {} task {} for {}",
        worker_id,
        task.command.method(),
        task.id,
        task.owner
    );

    let response = run(&task, &companion).await;

    active_tasks.fetch_sub(1, Ordering::SeqCst);
    tracing::debug!("Completed task with ID: {}", task.id);

    task.respond_to
        .send(response)
        .await
        .map_err(|e| Error::ProcessError {
            message: format!("failed to deliver response for task {}: {}", task.id, e),
        })
}

async fn run(task: &Task, companion: &SharedCompanion) -> ResponseSignal {
    if task.command == Command::Refresh {
        // Fetch without holding the lock so other requests keep being served.
        let store = lock(companion).store().clone();
        let snapshot = fetch_remote(&store).await;
        lock(companion).apply_remote(&snapshot);
    }

    let result = lock(companion).execute(task.command.clone());
    match result {
        Ok(result) => ResponseSignal::Success {
            request_id: task.request_id.clone(),
            result,
        },
        Err(e) => {
            tracing::debug!("Task {} rejected: {}", task.id, e);
            ResponseSignal::Error {
                request_id: task.request_id.clone(),
                message: e.to_string(),
            }
        }
    }
}
