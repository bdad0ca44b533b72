use thiserror::Error;

/// Transport-level failures. The request never produced a usable response.
#[derive(Debug, Error)]
pub enum TransportError {
  /// Connection, TLS, or protocol failure.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Local file I/O failed while streaming a body.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
