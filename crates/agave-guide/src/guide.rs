//! Task guide data model.

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::template::Template;

/// The transport shape a guide produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
  /// Marker guide completed locally; never reaches the transport.
  None,
  Get,
  Post,
  Put,
  Delete,
  /// Multipart upload of a local file.
  Upload,
  /// GET streamed into a local file that must not already exist.
  Download,
  /// Multipart upload of an in-memory buffer.
  BufferUpload,
  /// GET collected into an in-memory buffer.
  BufferDownload,
  /// Job-submission app descriptor. Submitted through the app-start guide.
  JobApp,
}

/// Which authorization header a guide sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthHeader {
  None,
  /// Basic auth from the user's name and password.
  Password,
  /// Basic auth from the registered API client key and secret.
  Client,
  /// Bearer access token from a completed login.
  Bearer,
  /// Reserved for refresh-token authorization; no header is sent.
  Refresh,
}

/// Description of a remote job-submission app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
  /// Local name the app is registered and submitted under.
  pub name: String,
  /// Full remote app identifier, e.g. `openfoam-2.4.0u11`.
  pub app_id: String,
  /// Names routed into the job's `parameters` object.
  #[serde(default)]
  pub parameters: Vec<String>,
  /// Names routed into the job's `inputs` object.
  #[serde(default)]
  pub inputs: Vec<String>,
  /// Parameter that receives the resolved remote working directory.
  #[serde(default)]
  pub working_dir_param: Option<String>,
}

/// Immutable template describing one kind of remote request.
#[derive(Debug, Clone)]
pub struct TaskGuide {
  id: String,
  kind: RequestKind,
  url: Template,
  body: Option<Template>,
  auth: AuthHeader,
  internal: bool,
  token_format: bool,
  app: Option<AppSpec>,
}

impl TaskGuide {
  /// Create a guide with an empty URL suffix and no auth.
  pub fn new(id: impl Into<String>, kind: RequestKind) -> Self {
    Self {
      id: id.into(),
      kind,
      url: Template::empty(),
      body: None,
      auth: AuthHeader::None,
      internal: false,
      token_format: false,
      app: None,
    }
  }

  /// Create the descriptor guide for a job-submission app.
  pub fn app(spec: AppSpec) -> Self {
    let mut guide = Self::new(spec.name.clone(), RequestKind::JobApp);
    guide.app = Some(spec);
    guide
  }

  pub fn with_url(mut self, url: &str) -> Result<Self, TemplateError> {
    self.url = Template::parse(url)?;
    Ok(self)
  }

  pub fn with_body(mut self, body: &str) -> Result<Self, TemplateError> {
    self.body = Some(Template::parse(body)?);
    Ok(self)
  }

  pub fn with_auth(mut self, auth: AuthHeader) -> Self {
    self.auth = auth;
    self
  }

  /// Mark the guide's replies as consumed by the auth state machine.
  pub fn internal(mut self) -> Self {
    self.internal = true;
    self
  }

  /// Mark the guide's replies as OAuth token documents.
  pub fn token_format(mut self) -> Self {
    self.token_format = true;
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn kind(&self) -> RequestKind {
    self.kind
  }

  pub fn url(&self) -> &Template {
    &self.url
  }

  pub fn body(&self) -> Option<&Template> {
    self.body.as_ref()
  }

  pub fn auth(&self) -> AuthHeader {
    self.auth
  }

  pub fn is_internal(&self) -> bool {
    self.internal
  }

  pub fn is_token_format(&self) -> bool {
    self.token_format
  }

  pub fn app_spec(&self) -> Option<&AppSpec> {
    self.app.as_ref()
  }

  /// Whether a reply can be completed without a transport call.
  pub fn is_local(&self) -> bool {
    self.kind == RequestKind::None
  }
}
