//! Credentials and tokens of the current login.

use std::fmt;

use agave_guide::AuthHeader;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Everything learned while logging in.
///
/// The session is only ever reset as a whole through [`AuthSession::clear`].
#[derive(Default)]
pub(crate) struct AuthSession {
  username: String,
  password: String,
  password_header: String,
  client_key: String,
  client_secret: String,
  client_header: String,
  access_token: String,
  refresh_token: String,
  bearer_header: String,
  authenticated: bool,
  login_in_progress: bool,
}

impl AuthSession {
  /// Start a login attempt with the user's credentials.
  pub(crate) fn begin_login(&mut self, username: &str, password: &str) {
    self.username = username.to_string();
    self.password = password.to_string();
    self.password_header = basic_header(username, password);
    self.login_in_progress = true;
  }

  pub(crate) fn set_client(&mut self, key: &str, secret: &str) {
    self.client_key = key.to_string();
    self.client_secret = secret.to_string();
    self.client_header = basic_header(key, secret);
  }

  pub(crate) fn set_tokens(&mut self, access: &str, refresh: &str) {
    self.access_token = access.to_string();
    self.refresh_token = refresh.to_string();
    self.bearer_header = format!("Bearer {access}");
  }

  /// Finish the login. The password is not needed past this point.
  pub(crate) fn mark_authenticated(&mut self) {
    self.authenticated = true;
    self.login_in_progress = false;
    self.password.clear();
    self.password_header.clear();
  }

  pub(crate) fn clear(&mut self) {
    *self = Self::default();
  }

  pub(crate) fn is_authenticated(&self) -> bool {
    self.authenticated
  }

  pub(crate) fn is_active(&self) -> bool {
    self.authenticated || self.login_in_progress
  }

  /// A session that can be revoked remotely.
  pub(crate) fn is_revocable(&self) -> bool {
    self.authenticated && !self.client_header.is_empty() && !self.access_token.is_empty()
  }

  pub(crate) fn username(&self) -> &str {
    &self.username
  }

  pub(crate) fn password(&self) -> &str {
    &self.password
  }

  pub(crate) fn access_token(&self) -> &str {
    &self.access_token
  }

  pub(crate) fn refresh_token(&self) -> &str {
    &self.refresh_token
  }

  /// Header value for `kind`, or `None` when the kind sends no header.
  ///
  /// An empty string means the header is required but not yet known.
  pub(crate) fn header(&self, kind: AuthHeader) -> Option<&str> {
    match kind {
      AuthHeader::None | AuthHeader::Refresh => None,
      AuthHeader::Password => Some(&self.password_header),
      AuthHeader::Client => Some(&self.client_header),
      AuthHeader::Bearer => Some(&self.bearer_header),
    }
  }
}

impl fmt::Debug for AuthSession {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AuthSession")
      .field("username", &self.username)
      .field("has_client", &!self.client_key.is_empty())
      .field("has_tokens", &!self.access_token.is_empty())
      .field("authenticated", &self.authenticated)
      .field("login_in_progress", &self.login_in_progress)
      .finish_non_exhaustive()
  }
}

fn basic_header(user: &str, secret: &str) -> String {
  format!("Basic {}", STANDARD.encode(format!("{user}:{secret}")))
}
