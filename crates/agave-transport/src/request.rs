use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use reqwest::Method;
use url::Url;

/// Form field name the remote service expects for uploads.
pub const UPLOAD_FIELD: &str = "fileToUpload";

/// Content type of every uploaded part.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// A fully built request ready for the transport.
#[derive(Debug)]
pub struct TransportRequest {
  pub method: Method,
  pub url: Url,
  /// Raw `Authorization` header value.
  pub authorization: Option<String>,
  pub body: RequestBody,
  pub sink: ResponseSink,
}

/// Request payload shapes.
pub enum RequestBody {
  Empty,
  /// Sent as `application/x-www-form-urlencoded`.
  Form(String),
  /// Sent as-is with no content type.
  Text(String),
  /// Single-part `multipart/form-data` upload.
  Multipart(UploadPart),
}

impl fmt::Debug for RequestBody {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => f.write_str("Empty"),
      // Form bodies may carry credentials
      Self::Form(body) => write!(f, "Form({} bytes)", body.len()),
      Self::Text(body) => write!(f, "Text({} bytes)", body.len()),
      Self::Multipart(part) => f.debug_tuple("Multipart").field(part).finish(),
    }
  }
}

/// The one file part of a multipart upload.
#[derive(Debug)]
pub struct UploadPart {
  pub file_name: String,
  pub source: UploadSource,
}

/// Where upload bytes come from.
///
/// An open file is owned by the request and closed once the request
/// completes.
#[derive(Debug)]
pub enum UploadSource {
  File(tokio::fs::File),
  Buffer(Bytes),
}

/// Where response bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSink {
  Memory,
  /// Stream a successful response into a new file at this path. The file
  /// must not already exist.
  File(PathBuf),
}

/// What the remote side answered.
#[derive(Debug, Clone)]
pub struct TransportResponse {
  pub status: u16,
  /// Response body, empty when it was streamed to a file.
  pub body: Bytes,
  /// Set when the body was written to a [`ResponseSink::File`].
  pub saved_to: Option<PathBuf>,
}

impl TransportResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}
