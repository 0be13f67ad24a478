use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::actor::companion::Companion;
use crate::actor::refresh::RemoteSnapshot;
use crate::api::model::{ApiResponse, Command};

pub type Queue = Arc<Mutex<VecDeque<Task>>>;
pub type SharedCompanion = Arc<Mutex<Companion>>;

/// Locks shared state, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug)]
pub struct TaskRequest {
    pub owner: Uuid,
    pub request_id: String,
    pub command: Command,
    pub respond_to: tokio::sync::mpsc::Sender<ResponseSignal>,
}

#[derive(Debug)]
pub struct Task {
    pub id: Uuid,
    pub owner: Uuid,
    pub request_id: String,
    pub command: Command,
    pub respond_to: tokio::sync::mpsc::Sender<ResponseSignal>,
}

impl From<TaskRequest> for Task {
    fn from(request: TaskRequest) -> Self {
        Task {
            id: Uuid::new_v4(),
            owner: request.owner,
            request_id: request.request_id,
            command: request.command,
            respond_to: request.respond_to,
        }
    }
}

#[derive(Clone, Debug)]
pub enum InternalMessage {
    TaskRequest(TaskRequest),
    TaskAdded,
    RemoteLoaded(Arc<RemoteSnapshot>),
    GracefulStop,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSignal {
    Success {
        request_id: String,
        result: serde_json::Value,
    },
    Error {
        request_id: String,
        message: String,
    },
    Stop,
}

impl ResponseSignal {
    pub fn to_response(&self) -> Option<ApiResponse> {
        match self {
            ResponseSignal::Success { request_id, result } => Some(ApiResponse {
                id: request_id.clone(),
                result: Some(result.clone()),
                error: None,
            }),
            ResponseSignal::Error {
                request_id,
                message,
            } => Some(ApiResponse {
                id: request_id.clone(),
                result: None,
                error: Some(message.clone()),
            }),
            ResponseSignal::Stop => None,
        }
    }
}

impl fmt::Display for ResponseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_response() {
            Some(response) => {
                let body = serde_json::to_string(&response).map_err(|_| fmt::Error)?;
                f.write_str(&body)
            }
            None => f.write_str("stop"),
        }
    }
}
