//! Login, token refresh, and revocation.
//!
//! Logging in walks a fixed sequence of internal requests:
//!
//! 1. check whether our API client exists (password auth),
//! 2. delete it when it does,
//! 3. register it again to obtain a consumer key and secret,
//! 4. exchange the user's credentials for tokens (client auth).
//!
//! A missing client skips straight to registration. Each step's reply is
//! consumed here rather than by a caller; the user-facing login reply is
//! resolved once the sequence ends, successfully or not.

use std::sync::Arc;

use agave_guide::{TaskGuide, ids};
use agave_transport::{TransportError, TransportResponse};
use tracing::{debug, info, instrument, warn};

use crate::client::{AgaveClient, ClientState, Inner};
use crate::envelope::{ClientCheckFailure, Envelope, classify, client_check_failure};
use crate::error::DispatchError;
use crate::events::{ClientEvent, EventNotifier};
use crate::reply::{ReplyLink, RequestState, TaskOutcome, TaskReply, reply_channel};
use crate::request::DispatchArgs;

/// Internal requests whose replies drive the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalTask {
  ClientCheck,
  ClientRemove,
  ClientRegister,
  TokenGrant,
  TokenRefresh,
  Revoke,
}

impl InternalTask {
  fn from_guide_id(id: &str) -> Option<Self> {
    match id {
      ids::AUTH_STEP1 => Some(Self::ClientCheck),
      ids::AUTH_STEP1A => Some(Self::ClientRemove),
      ids::AUTH_STEP2 => Some(Self::ClientRegister),
      ids::AUTH_STEP3 => Some(Self::TokenGrant),
      ids::AUTH_REFRESH => Some(Self::TokenRefresh),
      ids::AUTH_REVOKE => Some(Self::Revoke),
      _ => None,
    }
  }
}

impl<N: EventNotifier + 'static> AgaveClient<N> {
  /// Log in.
  ///
  /// Refused while another login is running or one has already succeeded.
  /// The reply resolves `Good` once tokens are held, `Fail` when the
  /// credentials were rejected, and `NoConnect` on any other failure; in
  /// both failure cases the session is left cleared.
  #[instrument(name = "perform_auth", skip(self, password))]
  pub fn perform_auth(&self, username: &str, password: &str) -> Result<TaskReply, DispatchError> {
    let mut guard = self.inner.lock();
    let state = &mut *guard;

    if state.session.is_active() {
      return Err(DispatchError::LoginActive);
    }

    let guide = self.inner.lookup(ids::FULL_AUTH)?;
    let (mut reply, link) = reply_channel(guide);

    state.session.begin_login(username, password);
    if let Err(err) =
      self
        .inner
        .dispatch_locked(state, ids::AUTH_STEP1, DispatchArgs::new(), Some(link))
    {
      state.session.clear();
      return Err(err);
    }

    info!("login started");
    reply.insert_param("uname", username);
    Ok(reply)
  }

  /// Exchange the refresh token for a new access token.
  ///
  /// A failed refresh leaves the current tokens in place.
  pub fn refresh_session(&self) -> Result<TaskReply, DispatchError> {
    let mut guard = self.inner.lock();
    let state = &mut *guard;

    if !state.session.is_authenticated() {
      return Err(DispatchError::NotAuthenticated {
        guide_id: ids::AUTH_REFRESH.to_string(),
      });
    }

    let guide = self.inner.lookup(ids::AUTH_REFRESH)?;
    let (reply, link) = reply_channel(guide);
    let args = DispatchArgs::new().body_arg(state.session.refresh_token());
    self
      .inner
      .dispatch_locked(state, ids::AUTH_REFRESH, args, Some(link))?;

    Ok(reply)
  }

  /// Name of the logged-in user, empty when not logged in.
  pub fn user_name(&self) -> String {
    let state = self.inner.lock();
    if state.session.is_authenticated() {
      state.session.username().to_string()
    } else {
      String::new()
    }
  }
}

impl<N: EventNotifier + 'static> Inner<N> {
  /// Consume the reply of an internal request.
  pub(crate) fn handle_internal(
    self: &Arc<Self>,
    state: &mut ClientState,
    guide: &TaskGuide,
    parent: Option<ReplyLink>,
    result: Result<TransportResponse, TransportError>,
  ) {
    let Some(task) = InternalTask::from_guide_id(guide.id()) else {
      self.fatal(format!("non-existent internal request: '{}'", guide.id()));
      forward_to_parent(parent.as_ref(), RequestState::NoConnect);
      return;
    };

    let envelope = match result {
      Ok(response) => classify(guide, &response.body),
      Err(err) => {
        warn!(guide_id = guide.id(), error = %err, "internal request failed");
        Envelope::no_connect()
      }
    };
    self.completed(guide.id(), envelope.state);

    match task {
      InternalTask::Revoke => {
        info!(state = ?envelope.state, "token revocation finished");
        self.clear_session(state);
      }
      // Shutdown began while this request was out; do not finish the login
      _ if state.shutting_down => {
        debug!(guide_id = guide.id(), "dropping session step during shutdown");
        if task == InternalTask::TokenRefresh || !state.session.is_active() {
          forward_to_parent(parent.as_ref(), RequestState::NoConnect);
        } else {
          self.fail_login(state, parent.as_ref(), RequestState::NoConnect);
        }
      }
      InternalTask::ClientCheck => self.on_client_check(state, parent, &envelope),
      InternalTask::ClientRemove => match envelope.state {
        RequestState::Good => self.advance(state, ids::AUTH_STEP2, DispatchArgs::new(), parent),
        failed => self.fail_login(state, parent.as_ref(), failed),
      },
      InternalTask::ClientRegister => self.on_client_registered(state, parent, &envelope),
      InternalTask::TokenGrant => self.on_token_granted(state, parent, &envelope),
      InternalTask::TokenRefresh => self.on_token_refreshed(state, parent, &envelope),
    }
  }

  fn on_client_check(
    self: &Arc<Self>,
    state: &mut ClientState,
    parent: Option<ReplyLink>,
    envelope: &Envelope,
  ) {
    if envelope.state == RequestState::Good {
      self.advance(state, ids::AUTH_STEP1A, DispatchArgs::new(), parent);
      return;
    }

    match client_check_failure(envelope) {
      ClientCheckFailure::NoSuchClient => {
        debug!("no api client registered yet");
        self.advance(state, ids::AUTH_STEP2, DispatchArgs::new(), parent);
      }
      ClientCheckFailure::InvalidCredentials => {
        info!("login rejected: invalid credentials");
        self.fail_login(state, parent.as_ref(), RequestState::Fail);
      }
      ClientCheckFailure::Unrecognized => {
        warn!(message = envelope.message().unwrap_or(""), "client check failed");
        self.fail_login(state, parent.as_ref(), RequestState::NoConnect);
      }
    }
  }

  fn on_client_registered(
    self: &Arc<Self>,
    state: &mut ClientState,
    parent: Option<ReplyLink>,
    envelope: &Envelope,
  ) {
    if envelope.state != RequestState::Good {
      self.fail_login(state, parent.as_ref(), envelope.state);
      return;
    }

    let key = envelope.string_at(&["result", "consumerKey"]);
    let secret = envelope.string_at(&["result", "consumerSecret"]);
    if key.is_empty() || secret.is_empty() {
      self.fatal("client registration succeeded without client credentials");
      self.fail_login(state, parent.as_ref(), RequestState::NoConnect);
      return;
    }

    state.session.set_client(key, secret);
    let args = DispatchArgs::new()
      .body_arg(state.session.username())
      .body_arg(state.session.password());
    self.advance(state, ids::AUTH_STEP3, args, parent);
  }

  fn on_token_granted(&self, state: &mut ClientState, parent: Option<ReplyLink>, envelope: &Envelope) {
    if envelope.state != RequestState::Good {
      self.fail_login(state, parent.as_ref(), envelope.state);
      return;
    }

    let access = envelope.string_at(&["access_token"]);
    let refresh = envelope.string_at(&["refresh_token"]);
    if access.is_empty() || refresh.is_empty() {
      warn!("token response carried no tokens");
      self.fail_login(state, parent.as_ref(), RequestState::Fail);
      return;
    }

    state.session.set_tokens(access, refresh);
    state.session.mark_authenticated();

    let username = state.session.username().to_string();
    info!(%username, "login succeeded");
    self.notify(ClientEvent::LoginSucceeded { username });
    forward_to_parent(parent.as_ref(), RequestState::Good);
  }

  fn on_token_refreshed(&self, state: &mut ClientState, parent: Option<ReplyLink>, envelope: &Envelope) {
    if envelope.state != RequestState::Good {
      warn!(state = ?envelope.state, "token refresh failed");
      forward_to_parent(parent.as_ref(), envelope.state);
      return;
    }

    let access = envelope.string_at(&["access_token"]);
    let refresh = envelope.string_at(&["refresh_token"]);
    if access.is_empty() || refresh.is_empty() {
      self.fatal("token refresh succeeded without tokens");
      forward_to_parent(parent.as_ref(), RequestState::Fail);
      return;
    }

    state.session.set_tokens(access, refresh);
    debug!("access token refreshed");
    forward_to_parent(parent.as_ref(), RequestState::Good);
  }

  /// Issue the next login step, ending the login when it is refused.
  fn advance(
    self: &Arc<Self>,
    state: &mut ClientState,
    guide_id: &str,
    args: DispatchArgs,
    parent: Option<ReplyLink>,
  ) {
    debug!(guide_id, "next login step");
    if let Err(err) = self.dispatch_locked(state, guide_id, args, parent.clone()) {
      warn!(guide_id, error = %err, "login step refused");
      self.fail_login(state, parent.as_ref(), RequestState::NoConnect);
    }
  }

  fn fail_login(&self, state: &mut ClientState, parent: Option<&ReplyLink>, result: RequestState) {
    self.clear_session(state);
    forward_to_parent(parent, result);
  }
}

fn forward_to_parent(parent: Option<&ReplyLink>, state: RequestState) {
  if let Some(parent) = parent {
    parent.deliver(TaskOutcome::new(state));
  }
}
