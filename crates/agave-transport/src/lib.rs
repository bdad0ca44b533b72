//! Agave Transport
//!
//! The [`Transport`] trait is the seam between the request dispatcher and
//! the network. A transport takes a fully built [`TransportRequest`] and
//! resolves once the remote side has answered (or the exchange failed).
//! It imposes no timeout or retry policy of its own beyond what the
//! underlying HTTP client is configured with.
//!
//! [`HttpTransport`] is the production implementation on top of `reqwest`.

mod error;
mod http;
mod request;

pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{
  RequestBody, ResponseSink, TransportRequest, TransportResponse, UPLOAD_CONTENT_TYPE,
  UPLOAD_FIELD, UploadPart, UploadSource,
};
pub use reqwest::Method;
pub use url::Url;

use async_trait::async_trait;

/// Issues requests against the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
  /// Perform one request.
  ///
  /// Any HTTP status counts as a response; only failures to obtain one are
  /// errors.
  async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
