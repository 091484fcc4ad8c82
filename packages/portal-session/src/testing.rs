// Mock collaborators for tests.
//
// Swap these in through `Portal::with_parts` or the individual constructors to
// exercise the session layer without a backend or a UI.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::gateway::{RawRequest, RawResponse, Transport, TransportError};
use crate::notice::{Notice, Notifier};
use crate::routes::Navigator;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock Transport
// =============================================================================

#[derive(Debug, Clone)]
enum MockReply {
    Respond(RawResponse),
    Fail(TransportError),
}

/// Transport answering from canned replies keyed by request path.
///
/// Replies for a path are consumed in order; the last one repeats.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    calls: Arc<Mutex<Vec<RawRequest>>>,
    delay: Option<Duration>,
    path_delays: HashMap<String, Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an HTTP response for `path`.
    pub fn with_response(self, path: &str, status: u16, body: Value) -> Self {
        self.push(path, MockReply::Respond(RawResponse { status, body }));
        self
    }

    /// Queue a `{ code: 200, data }` envelope for `path`.
    pub fn with_success(self, path: &str, data: Value) -> Self {
        self.with_response(
            path,
            200,
            serde_json::json!({ "code": 200, "message": "success", "data": data }),
        )
    }

    /// Queue a transport failure (no response) for `path`.
    pub fn with_failure(self, path: &str, error: TransportError) -> Self {
        self.push(path, MockReply::Fail(error));
        self
    }

    /// Delay every reply, e.g. to trip the gateway timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay replies for `path` only, overriding [`with_delay`](Self::with_delay).
    pub fn with_delay_for(mut self, path: &str, delay: Duration) -> Self {
        self.path_delays.insert(path.to_string(), delay);
        self
    }

    fn push(&self, path: &str, reply: MockReply) {
        lock(&self.replies)
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, path: &str) -> Option<MockReply> {
        let mut replies = lock(&self.replies);
        let queue = replies.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    /// Every request sent, in order.
    pub fn calls(&self) -> Vec<RawRequest> {
        lock(&self.calls).clone()
    }

    /// Requests sent to `path`.
    pub fn calls_to(&self, path: &str) -> Vec<RawRequest> {
        lock(&self.calls)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn was_called(&self, path: &str) -> bool {
        lock(&self.calls).iter().any(|r| r.path == path)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        let path = request.path.clone();
        lock(&self.calls).push(request);

        if let Some(delay) = self.path_delays.get(&path).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(&path) {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(RawResponse {
                status: 404,
                body: serde_json::json!({ "code": 404, "message": format!("No mock for {}", path) }),
            }),
        }
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn count(&self, notice: &Notice) -> usize {
        lock(&self.notices).iter().filter(|n| *n == notice).count()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.notices).is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

// =============================================================================
// Recording Navigator
// =============================================================================

#[derive(Clone, Default)]
pub struct RecordingNavigator {
    redirects: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        lock(&self.redirects).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        lock(&self.redirects).push(path.to_string());
    }
}
