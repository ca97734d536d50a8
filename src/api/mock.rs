//! Scripted transport for tests.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};

type Reply = Result<ApiResponse, TransportError>;

enum MockReply {
  Ready(Reply),
  Deferred(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct MockState {
  replies: HashMap<(Method, String), VecDeque<MockReply>>,
  requests: Vec<ApiRequest>,
}

/// Transport that answers from per-route queues and records every request.
///
/// Requests without a queued reply fail with a transport error.
#[derive(Default)]
pub struct MockTransport {
  state: Mutex<MockState>,
}

impl MockTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  fn push(&self, method: Method, path: &str, reply: MockReply) {
    self
      .state
      .lock()
      .unwrap()
      .replies
      .entry((method, path.to_string()))
      .or_default()
      .push_back(reply);
  }

  /// Queue a response with the given status and JSON body.
  pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
    self.push(
      method,
      path,
      MockReply::Ready(Ok(ApiResponse::new(status, body))),
    );
  }

  /// Queue a transport-level failure.
  pub fn fail(&self, method: Method, path: &str, message: &str) {
    self.push(
      method,
      path,
      MockReply::Ready(Err(TransportError(message.to_string()))),
    );
  }

  /// Queue a reply that is only delivered once the returned sender fires.
  pub fn defer(&self, method: Method, path: &str) -> oneshot::Sender<Reply> {
    let (tx, rx) = oneshot::channel();
    self.push(method, path, MockReply::Deferred(rx));
    tx
  }

  pub fn requests(&self) -> Vec<ApiRequest> {
    self.state.lock().unwrap().requests.clone()
  }

  /// Number of requests made to `method path`.
  pub fn count(&self, method: Method, path: &str) -> usize {
    self
      .state
      .lock()
      .unwrap()
      .requests
      .iter()
      .filter(|r| r.method == method && r.path == path)
      .count()
  }
}

impl Transport for MockTransport {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Reply> {
    let reply = {
      let mut state = self.state.lock().unwrap();
      let key = (request.method, request.path.clone());
      state.requests.push(request);
      state.replies.get_mut(&key).and_then(VecDeque::pop_front)
    };

    Box::pin(async move {
      match reply {
        Some(MockReply::Ready(reply)) => reply,
        Some(MockReply::Deferred(rx)) => rx
          .await
          .unwrap_or_else(|_| Err(TransportError("deferred reply dropped".into()))),
        None => Err(TransportError("no reply queued".into())),
      }
    })
  }
}
