//! Client events and notifiers for observability.
//!
//! Events are emitted as requests are issued and completed and as the
//! login session changes, so consumers can drive progress displays, logs,
//! or shutdown logic without polling.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::reply::RequestState;

/// Events emitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
  /// A request was handed to the transport.
  RequestIssued { guide_id: String, url: String },

  /// A transport request finished.
  RequestCompleted {
    guide_id: String,
    state: RequestState,
  },

  /// The last in-flight request finished. Emitted once each time the
  /// pending count returns to zero.
  AllTasksFinished,

  /// The login flow obtained an access token.
  LoginSucceeded { username: String },

  /// Credentials and tokens were discarded.
  SessionCleared,

  /// An internal invariant was broken. The client keeps running but the
  /// condition indicates a defect or a service contract violation.
  FatalError { message: String },
}

/// Trait for receiving client events.
///
/// `notify` is called while the client holds its state lock, so
/// implementations must not call back into the client.
pub trait EventNotifier: Send + Sync {
  /// Called when a client event occurs.
  fn notify(&self, event: ClientEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl EventNotifier for NoopNotifier {
  fn notify(&self, _event: ClientEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never blocks request completion
  sender: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ClientEvent>) -> Self {
    Self { sender }
  }
}

impl EventNotifier for ChannelNotifier {
  fn notify(&self, event: ClientEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
