use std::path::PathBuf;

use agave_guide::{AuthHeader, GuideError, RegistryError, TemplateError};
use thiserror::Error;

/// Why a request was not accepted.
///
/// A refused request never reaches the transport and never counts as
/// pending.
#[derive(Debug, Error)]
pub enum DispatchError {
  /// Only session revocation is accepted once shutdown has begun.
  #[error("request '{guide_id}' refused: shutdown in progress")]
  ShuttingDown { guide_id: String },

  #[error("request '{guide_id}' refused: not logged in")]
  NotAuthenticated { guide_id: String },

  #[error("login refused: a login is already in progress or complete")]
  LoginActive,

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error("request '{guide_id}' has invalid arguments: {source}")]
  Arguments {
    guide_id: String,
    #[source]
    source: TemplateError,
  },

  #[error(transparent)]
  Job(#[from] GuideError),

  /// Local marker guides and app descriptors have no transport shape;
  /// internal login steps are only issued by the client itself.
  #[error("guide '{guide_id}' cannot be sent to the service")]
  NotDispatchable { guide_id: String },

  #[error("request '{guide_id}' is missing its {what}")]
  MissingPayload {
    guide_id: String,
    what: &'static str,
  },

  #[error("cannot open local file {path}: {source}")]
  LocalFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("download destination {path} already exists")]
  DestinationExists { path: PathBuf },

  /// The guide needs an authorization header the session does not hold.
  #[error("request '{guide_id}' requires a {header:?} header that is not available")]
  MissingAuthHeader {
    guide_id: String,
    header: AuthHeader,
  },

  #[error("tenant url cannot carry a request path")]
  InvalidBaseUrl,
}

impl DispatchError {
  /// Refusals that indicate a defect in the calling code or the catalog
  /// rather than a runtime condition.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::Registry(_)
        | Self::Arguments { .. }
        | Self::MissingAuthHeader { .. }
        | Self::InvalidBaseUrl
    )
  }
}

/// Errors raised while constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("invalid tenant url '{url}': {source}")]
  TenantUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("tenant url '{url}' cannot carry a request path")]
  NotABase { url: String },

  #[error("invalid task guide catalog: {0}")]
  Catalog(#[from] GuideError),
}
