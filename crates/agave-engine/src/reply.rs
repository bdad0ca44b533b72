//! Reply handles returned to callers.
//!
//! Every accepted request yields a [`TaskReply`]. The reply resolves
//! exactly once with a [`TaskOutcome`], either when the transport answers
//! or, for requests the client completes itself, as soon as the outcome is
//! known.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use agave_guide::TaskGuide;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Caller-supplied values carried alongside a reply, keyed by name.
pub type TaskParams = BTreeMap<String, Vec<String>>;

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
  Good,
  /// The service answered and refused.
  Fail,
  /// No usable answer: the request never reached the service, or the
  /// response was unreadable.
  NoConnect,
}

/// What a completed request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
  None,
  /// The parsed response document.
  Json(serde_json::Value),
  /// A buffered download.
  Bytes(Bytes),
  /// A download written to this local file.
  File(PathBuf),
  /// A remote path, for working-directory changes.
  RemotePath(String),
}

/// Final result of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
  pub state: RequestState,
  pub payload: ReplyPayload,
}

impl TaskOutcome {
  pub fn new(state: RequestState) -> Self {
    Self {
      state,
      payload: ReplyPayload::None,
    }
  }

  pub fn with_payload(state: RequestState, payload: ReplyPayload) -> Self {
    Self { state, payload }
  }

  pub fn is_good(&self) -> bool {
    self.state == RequestState::Good
  }
}

/// A resolved reply: the outcome plus the reply's identity and parameters.
#[derive(Debug, Clone)]
pub struct CompletedTask {
  pub guide_id: String,
  pub state: RequestState,
  pub payload: ReplyPayload,
  pub params: TaskParams,
}

impl CompletedTask {
  pub fn is_good(&self) -> bool {
    self.state == RequestState::Good
  }

  /// First value of a named parameter.
  pub fn param(&self, name: &str) -> Option<&str> {
    first_param(&self.params, name)
  }

  /// The response document, if the request produced one.
  pub fn json(&self) -> Option<&serde_json::Value> {
    match &self.payload {
      ReplyPayload::Json(value) => Some(value),
      _ => None,
    }
  }
}

/// Handle to a request the client accepted.
#[derive(Debug)]
pub struct TaskReply {
  guide: Arc<TaskGuide>,
  params: TaskParams,
  receiver: oneshot::Receiver<TaskOutcome>,
}

impl TaskReply {
  pub fn guide_id(&self) -> &str {
    self.guide.id()
  }

  pub fn guide(&self) -> &TaskGuide {
    &self.guide
  }

  pub fn params(&self) -> &TaskParams {
    &self.params
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    first_param(&self.params, name)
  }

  /// Append a value to a named parameter.
  pub fn insert_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.params.entry(name.into()).or_default().push(value.into());
  }

  pub(crate) fn extend_params(&mut self, params: TaskParams) {
    for (name, values) in params {
      self.params.entry(name).or_default().extend(values);
    }
  }

  /// Wait for the request to finish.
  ///
  /// A reply whose request was abandoned resolves as
  /// [`RequestState::NoConnect`].
  pub async fn wait(self) -> CompletedTask {
    let outcome = self
      .receiver
      .await
      .unwrap_or_else(|_| TaskOutcome::new(RequestState::NoConnect));

    CompletedTask {
      guide_id: self.guide.id().to_string(),
      state: outcome.state,
      payload: outcome.payload,
      params: self.params,
    }
  }
}

/// Sending half of a reply.
///
/// Clones share one slot, so however many holders exist the reply is
/// delivered at most once.
#[derive(Debug, Clone)]
pub(crate) struct ReplyLink {
  slot: Arc<Mutex<Option<oneshot::Sender<TaskOutcome>>>>,
}

impl ReplyLink {
  /// Resolve the reply. Returns false when it was already resolved.
  pub(crate) fn deliver(&self, outcome: TaskOutcome) -> bool {
    let sender = self
      .slot
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();

    match sender {
      Some(sender) => {
        // The caller may have dropped its handle
        let _ = sender.send(outcome);
        true
      }
      None => false,
    }
  }
}

pub(crate) fn reply_channel(guide: Arc<TaskGuide>) -> (TaskReply, ReplyLink) {
  let (sender, receiver) = oneshot::channel();
  let reply = TaskReply {
    guide,
    params: TaskParams::new(),
    receiver,
  };
  let link = ReplyLink {
    slot: Arc::new(Mutex::new(Some(sender))),
  };
  (reply, link)
}

fn first_param<'a>(params: &'a TaskParams, name: &str) -> Option<&'a str> {
  params
    .get(name)
    .and_then(|values| values.first())
    .map(String::as_str)
}
