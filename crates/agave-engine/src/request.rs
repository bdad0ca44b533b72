//! Turning a guide and caller arguments into a transport request.

use std::path::{Path, PathBuf};

use agave_guide::{RequestKind, TaskGuide, Template};
use agave_transport::{
  Method, RequestBody, ResponseSink, TransportRequest, UploadPart, UploadSource, Url,
};
use bytes::Bytes;

use crate::error::DispatchError;
use crate::session::AuthSession;

/// Data a request carries beyond its template arguments.
#[derive(Debug, Clone, Default)]
pub enum Payload {
  #[default]
  None,
  /// Local file to upload.
  LocalFile(PathBuf),
  /// Local path a download is written to. Must not exist yet.
  Destination(PathBuf),
  /// In-memory upload under the given file name.
  Buffer { file_name: String, data: Bytes },
}

/// Arguments for one dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchArgs {
  /// Values for the guide's URL placeholders.
  pub url: Vec<String>,
  /// Values for the guide's body placeholders.
  pub body: Vec<String>,
  pub payload: Payload,
}

impl DispatchArgs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn url_arg(mut self, value: impl Into<String>) -> Self {
    self.url.push(value.into());
    self
  }

  pub fn body_arg(mut self, value: impl Into<String>) -> Self {
    self.body.push(value.into());
    self
  }

  pub fn payload(mut self, payload: Payload) -> Self {
    self.payload = payload;
    self
  }
}

/// Build the request for `guide`.
///
/// Every check happens before any local file is opened, so a refused
/// request leaves nothing behind.
pub(crate) fn build_request(
  base: &Url,
  guide: &TaskGuide,
  args: DispatchArgs,
  session: &AuthSession,
) -> Result<TransportRequest, DispatchError> {
  let guide_id = guide.id();
  let arguments = |source| DispatchError::Arguments {
    guide_id: guide_id.to_string(),
    source,
  };

  let method = match guide.kind() {
    RequestKind::Get | RequestKind::Download | RequestKind::BufferDownload => Method::GET,
    RequestKind::Post | RequestKind::Upload | RequestKind::BufferUpload => Method::POST,
    RequestKind::Put => Method::PUT,
    RequestKind::Delete => Method::DELETE,
    RequestKind::None | RequestKind::JobApp => {
      return Err(DispatchError::NotDispatchable {
        guide_id: guide_id.to_string(),
      });
    }
  };

  let suffix = guide.url().render(&args.url).map_err(arguments)?;
  let url = join_url(base, &suffix)?;

  let form = match guide.body() {
    Some(template) => template.render_form(&args.body),
    None => Template::empty().render_form(&args.body),
  }
  .map_err(arguments)?;

  let authorization = match session.header(guide.auth()) {
    None => None,
    Some("") => {
      return Err(DispatchError::MissingAuthHeader {
        guide_id: guide_id.to_string(),
        header: guide.auth(),
      });
    }
    Some(value) => Some(value.to_string()),
  };

  let missing = |what| DispatchError::MissingPayload {
    guide_id: guide_id.to_string(),
    what,
  };

  let (body, sink) = match (guide.kind(), args.payload) {
    (RequestKind::Post, _) => (RequestBody::Form(form), ResponseSink::Memory),
    (RequestKind::Put, _) => (RequestBody::Text(form), ResponseSink::Memory),
    (RequestKind::Upload, Payload::LocalFile(path)) => {
      let part = UploadPart {
        file_name: file_name(&path),
        source: UploadSource::File(open_upload(&path)?),
      };
      (RequestBody::Multipart(part), ResponseSink::Memory)
    }
    (RequestKind::Upload, _) => return Err(missing("local file")),
    (RequestKind::BufferUpload, Payload::Buffer { file_name, data }) => {
      let part = UploadPart {
        file_name,
        source: UploadSource::Buffer(data),
      };
      (RequestBody::Multipart(part), ResponseSink::Memory)
    }
    (RequestKind::BufferUpload, _) => return Err(missing("upload buffer")),
    (RequestKind::Download, Payload::Destination(path)) => {
      if path.exists() {
        return Err(DispatchError::DestinationExists { path });
      }
      (RequestBody::Empty, ResponseSink::File(path))
    }
    (RequestKind::Download, _) => return Err(missing("download destination")),
    _ => (RequestBody::Empty, ResponseSink::Memory),
  };

  Ok(TransportRequest {
    method,
    url,
    authorization,
    body,
    sink,
  })
}

/// Append the rendered suffix to the tenant URL segment by segment, so each
/// segment is percent-encoded on its own.
fn join_url(base: &Url, suffix: &str) -> Result<Url, DispatchError> {
  let mut url = base.clone();
  {
    let mut segments = url
      .path_segments_mut()
      .map_err(|()| DispatchError::InvalidBaseUrl)?;
    segments.pop_if_empty();
    segments.extend(suffix.split('/').filter(|segment| !segment.is_empty()));
    if suffix.ends_with('/') {
      segments.push("");
    }
  }
  Ok(url)
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn open_upload(path: &Path) -> Result<tokio::fs::File, DispatchError> {
  let file = std::fs::File::open(path).map_err(|source| DispatchError::LocalFile {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(tokio::fs::File::from_std(file))
}
