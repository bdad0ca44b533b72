//! The Agave client.
//!
//! Every request goes through [`AgaveClient::dispatch`], which applies the
//! shutdown and login gates, builds the transport request, and hands it to
//! a spawned task. Completions run one at a time under the client's state
//! lock: the reply or the login state machine is handled first and the
//! pending count is decremented last, so a completion that chains another
//! request never lets the count touch zero in between.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use agave_guide::{AuthHeader, GuideRegistry, RequestKind, TaskGuide, catalog_with_apps, ids};
use agave_transport::{Transport, TransportError, TransportResponse, Url};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::envelope::classify;
use crate::error::{ClientError, DispatchError};
use crate::events::{ClientEvent, EventNotifier, NoopNotifier};
use crate::pending::PendingCount;
use crate::reply::{ReplyLink, ReplyPayload, RequestState, TaskOutcome, TaskReply, reply_channel};
use crate::request::{DispatchArgs, build_request};
use crate::session::AuthSession;

/// Client for one Agave tenant.
///
/// Cloning is cheap and every clone drives the same session. Requests are
/// spawned onto the current Tokio runtime, so the client must be used from
/// within one.
pub struct AgaveClient<N: EventNotifier = NoopNotifier> {
  pub(crate) inner: Arc<Inner<N>>,
}

impl<N: EventNotifier> Clone for AgaveClient<N> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

pub(crate) struct Inner<N> {
  tenant_url: Url,
  registry: GuideRegistry,
  transport: Arc<dyn Transport>,
  notifier: N,
  state: Mutex<ClientState>,
}

/// Mutable client state, guarded by one lock.
#[derive(Debug, Default)]
pub(crate) struct ClientState {
  pub(crate) session: AuthSession,
  pub(crate) pending: PendingCount,
  pub(crate) shutting_down: bool,
  /// Remote working directory; empty means the root.
  pub(crate) working_dir: String,
}

/// A request handed to the transport.
struct InFlight {
  guide: Arc<TaskGuide>,
  reply: ReplyLink,
  /// Reply of the user-facing request an internal step belongs to.
  parent: Option<ReplyLink>,
}

impl AgaveClient<NoopNotifier> {
  pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
    Self::with_notifier(config, transport, NoopNotifier)
  }
}

impl<N: EventNotifier + 'static> AgaveClient<N> {
  /// Create a client that reports [`ClientEvent`]s to `notifier`.
  pub fn with_notifier(
    config: &ClientConfig,
    transport: Arc<dyn Transport>,
    notifier: N,
  ) -> Result<Self, ClientError> {
    let tenant_url = Url::parse(&config.tenant_url).map_err(|source| ClientError::TenantUrl {
      url: config.tenant_url.clone(),
      source,
    })?;
    if tenant_url.cannot_be_a_base() {
      return Err(ClientError::NotABase {
        url: config.tenant_url.clone(),
      });
    }

    let registry = match catalog_with_apps(&config.catalog(), config.apps.iter().cloned()) {
      Ok(registry) => registry,
      Err(err) => {
        let message = err.to_string();
        error!(%message, "fatal client error");
        notifier.notify(ClientEvent::FatalError { message });
        return Err(err.into());
      }
    };
    debug!(tenant = %tenant_url, guides = registry.len(), "client created");

    Ok(Self {
      inner: Arc::new(Inner {
        tenant_url,
        registry,
        transport,
        notifier,
        state: Mutex::new(ClientState::default()),
      }),
    })
  }

  pub fn tenant_url(&self) -> &str {
    self.inner.tenant_url.as_str()
  }

  pub fn registry(&self) -> &GuideRegistry {
    &self.inner.registry
  }

  pub fn is_authenticated(&self) -> bool {
    self.inner.lock().session.is_authenticated()
  }

  pub fn in_shutdown_mode(&self) -> bool {
    self.inner.lock().shutting_down
  }

  /// Number of transport requests currently in flight.
  pub fn pending_requests(&self) -> usize {
    self.inner.lock().pending.count()
  }

  /// Issue a request by guide identifier.
  ///
  /// Internal guides belong to the login state machine and are refused.
  pub fn dispatch(&self, guide_id: &str, args: DispatchArgs) -> Result<TaskReply, DispatchError> {
    if let Ok(guide) = self.inner.registry.lookup(guide_id)
      && guide.is_internal()
    {
      return Err(DispatchError::NotDispatchable {
        guide_id: guide_id.to_string(),
      });
    }

    let mut state = self.inner.lock();
    self.inner.dispatch_locked(&mut state, guide_id, args, None)
  }

  /// Begin shutting down.
  ///
  /// From now on every request except session revocation is refused. A
  /// logged-in session is revoked remotely and cleared once the revocation
  /// completes; otherwise it is cleared at once. The returned reply
  /// resolves when no request is in flight any more. Calling this again
  /// only returns another such reply.
  pub fn close_session(&self) -> Result<TaskReply, DispatchError> {
    let guide = self.inner.lookup(ids::WAIT_ALL)?;
    let (reply, link) = reply_channel(guide);

    let mut guard = self.inner.lock();
    let state = &mut *guard;

    if !state.shutting_down {
      state.shutting_down = true;

      if state.session.is_revocable() {
        info!(pending = state.pending.count(), "closing session: revoking access token");
        let token = state.session.access_token().to_string();
        let revoke = DispatchArgs::new().body_arg(token);
        if let Err(err) = self.inner.dispatch_locked(state, ids::AUTH_REVOKE, revoke, None) {
          warn!(error = %err, "token revocation refused, clearing session locally");
          self.inner.clear_session(state);
        }
      } else {
        info!(pending = state.pending.count(), "closing session: not logged in");
        self.inner.clear_session(state);
      }
    }

    state.pending.wait_for_drain(link);
    Ok(reply)
  }
}

impl<N: EventNotifier + 'static> Inner<N> {
  pub(crate) fn lock(&self) -> MutexGuard<'_, ClientState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Look up a guide the client itself relies on. A miss is fatal.
  pub(crate) fn lookup(&self, guide_id: &str) -> Result<Arc<TaskGuide>, DispatchError> {
    self.registry.lookup(guide_id).map_err(|err| {
      self.fatal(err.to_string());
      DispatchError::from(err)
    })
  }

  pub(crate) fn registry(&self) -> &GuideRegistry {
    &self.registry
  }

  pub(crate) fn notify(&self, event: ClientEvent) {
    self.notifier.notify(event);
  }

  pub(crate) fn fatal(&self, message: impl Into<String>) {
    let message = message.into();
    error!(%message, "fatal client error");
    self.notifier.notify(ClientEvent::FatalError { message });
  }

  pub(crate) fn clear_session(&self, state: &mut ClientState) {
    state.session.clear();
    debug!("session cleared");
    self.notifier.notify(ClientEvent::SessionCleared);
  }

  pub(crate) fn dispatch_locked(
    self: &Arc<Self>,
    state: &mut ClientState,
    guide_id: &str,
    args: DispatchArgs,
    parent: Option<ReplyLink>,
  ) -> Result<TaskReply, DispatchError> {
    if state.shutting_down && guide_id != ids::AUTH_REVOKE {
      debug!(guide_id, "request refused during shutdown");
      return Err(DispatchError::ShuttingDown {
        guide_id: guide_id.to_string(),
      });
    }

    let guide = self.lookup(guide_id)?;

    if guide.auth() == AuthHeader::Bearer && !state.session.is_authenticated() {
      debug!(guide_id, "request refused: not logged in");
      return Err(DispatchError::NotAuthenticated {
        guide_id: guide_id.to_string(),
      });
    }

    let request = build_request(&self.tenant_url, &guide, args, &state.session).inspect_err(|err| {
      if err.is_fatal() {
        self.fatal(err.to_string());
      }
    })?;

    let (reply, link) = reply_channel(Arc::clone(&guide));
    let url = request.url.to_string();

    state.pending.increment();
    debug!(guide_id, %url, pending = state.pending.count(), "request issued");
    self.notifier.notify(ClientEvent::RequestIssued {
      guide_id: guide_id.to_string(),
      url,
    });

    let in_flight = InFlight {
      guide,
      reply: link,
      parent,
    };
    let inner = Arc::clone(self);
    tokio::spawn(async move {
      let result = inner.transport.execute(request).await;
      inner.complete(in_flight, result);
    });

    Ok(reply)
  }

  fn complete(self: &Arc<Self>, in_flight: InFlight, result: Result<TransportResponse, TransportError>) {
    let mut guard = self.lock();
    let state = &mut *guard;
    let InFlight {
      guide,
      reply,
      parent,
    } = in_flight;

    if guide.is_internal() {
      self.handle_internal(state, &guide, parent, result);
    } else {
      let outcome = external_outcome(&guide, result);
      self.completed(guide.id(), outcome.state);
      reply.deliver(outcome);
    }

    match state.pending.decrement() {
      Ok(true) => {
        debug!("all requests finished");
        self.notifier.notify(ClientEvent::AllTasksFinished);
      }
      Ok(false) => {}
      Err(err) => self.fatal(err.to_string()),
    }
  }

  pub(crate) fn completed(&self, guide_id: &str, state: RequestState) {
    debug!(guide_id, ?state, "request completed");
    self.notifier.notify(ClientEvent::RequestCompleted {
      guide_id: guide_id.to_string(),
      state,
    });
  }
}

impl<N> Drop for Inner<N> {
  fn drop(&mut self) {
    let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
    if state.session.is_authenticated() && !state.shutting_down {
      warn!("client dropped without closing its session");
    }
  }
}

/// Outcome of a request whose reply goes straight back to the caller.
fn external_outcome(
  guide: &TaskGuide,
  result: Result<TransportResponse, TransportError>,
) -> TaskOutcome {
  let response = match result {
    Ok(response) => response,
    Err(err) => {
      warn!(guide_id = guide.id(), error = %err, "request failed");
      return TaskOutcome::new(RequestState::NoConnect);
    }
  };

  match guide.kind() {
    RequestKind::Download => {
      if let Some(path) = response.saved_to {
        return TaskOutcome::with_payload(RequestState::Good, ReplyPayload::File(path));
      }
    }
    RequestKind::BufferDownload if response.is_success() => {
      return TaskOutcome::with_payload(RequestState::Good, ReplyPayload::Bytes(response.body));
    }
    _ => {}
  }

  let envelope = classify(guide, &response.body);
  let state = match (guide.kind(), envelope.state) {
    // Downloads only succeed with file content
    (RequestKind::Download | RequestKind::BufferDownload, RequestState::Good) => {
      RequestState::NoConnect
    }
    (_, state) => state,
  };
  let payload = envelope
    .doc
    .map(ReplyPayload::Json)
    .unwrap_or(ReplyPayload::None);

  TaskOutcome::with_payload(state, payload)
}
