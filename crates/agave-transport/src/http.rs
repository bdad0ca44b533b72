use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use crate::Transport;
use crate::error::TransportError;
use crate::request::{
  RequestBody, ResponseSink, TransportRequest, TransportResponse, UPLOAD_CONTENT_TYPE,
  UPLOAD_FIELD, UploadPart, UploadSource,
};

/// `reqwest`-backed transport.
///
/// The underlying client pools connections, so one instance should be
/// shared by every request of a session.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
}

impl HttpTransport {
  pub fn new() -> Result<Self, TransportError> {
    let client = Client::builder()
      .user_agent(concat!("agave-client/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client })
  }

  /// Use an already configured client (proxies, TLS roots, timeouts).
  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  #[instrument(name = "transport_execute", skip(self, request), fields(method = %request.method, url = %request.url))]
  async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
    let TransportRequest {
      method,
      url,
      authorization,
      body,
      sink,
    } = request;

    let mut builder = self.client.request(method, url);

    if let Some(value) = authorization {
      builder = builder.header(reqwest::header::AUTHORIZATION, value);
    }

    builder = match body {
      RequestBody::Empty => builder,
      RequestBody::Form(form) => builder
        .header(
          reqwest::header::CONTENT_TYPE,
          "application/x-www-form-urlencoded",
        )
        .body(form),
      RequestBody::Text(text) => builder.body(text),
      RequestBody::Multipart(part) => builder.multipart(multipart_form(part)?),
    };

    let response = builder.send().await?;
    let status = response.status().as_u16();
    debug!(status, "response received");

    match sink {
      ResponseSink::File(path) if response.status().is_success() => {
        write_to_file(response, &path).await?;
        Ok(TransportResponse {
          status,
          body: bytes::Bytes::new(),
          saved_to: Some(path),
        })
      }
      _ => Ok(TransportResponse {
        status,
        body: response.bytes().await?,
        saved_to: None,
      }),
    }
  }
}

fn multipart_form(part: UploadPart) -> Result<Form, TransportError> {
  let body = match part.source {
    UploadSource::File(file) => Body::wrap_stream(ReaderStream::new(file)),
    UploadSource::Buffer(bytes) => Body::from(bytes),
  };

  let part = Part::stream(body)
    .file_name(part.file_name)
    .mime_str(UPLOAD_CONTENT_TYPE)?;

  Ok(Form::new().part(UPLOAD_FIELD, part))
}

async fn write_to_file(response: Response, path: &std::path::Path) -> Result<(), TransportError> {
  // Never overwrite, even if the path appeared after dispatch
  let mut file = OpenOptions::new()
    .write(true)
    .create_new(true)
    .open(path)
    .await?;

  let written = copy_body(response, &mut file).await;
  drop(file);

  // No partial file is left behind
  if written.is_err() {
    if let Err(err) = tokio::fs::remove_file(path).await {
      debug!(path = %path.display(), error = %err, "failed to remove partial download");
    }
  }
  written
}

async fn copy_body(response: Response, file: &mut tokio::fs::File) -> Result<(), TransportError> {
  let mut stream = response.bytes_stream();
  while let Some(chunk) = stream.next().await {
    file.write_all(&chunk?).await?;
  }

  file.flush().await?;
  Ok(())
}
