//! In-memory transport that replays canned responses

use super::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued results in order and records every request it saw.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: &str) -> Self {
        self.push(Ok(ApiResponse::new(status, body)))
    }

    pub(crate) fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    fn push(self, reply: Result<ApiResponse, TransportError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("script exhausted".into())))
    }
}
