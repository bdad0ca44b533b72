//! The standard guide catalog for an Agave tenant.

use crate::error::GuideError;
use crate::guide::{AppSpec, AuthHeader, RequestKind, TaskGuide};
use crate::registry::GuideRegistry;

/// Guide identifiers of the standard catalog.
pub mod ids {
  pub const CHANGE_DIR: &str = "changeDir";
  pub const FULL_AUTH: &str = "fullAuth";
  pub const WAIT_ALL: &str = "waitAll";

  pub const AUTH_STEP1: &str = "authStep1";
  pub const AUTH_STEP1A: &str = "authStep1a";
  pub const AUTH_STEP2: &str = "authStep2";
  pub const AUTH_STEP3: &str = "authStep3";
  pub const AUTH_REFRESH: &str = "authRefresh";
  pub const AUTH_REVOKE: &str = "authRevoke";

  pub const DIR_LISTING: &str = "dirListing";
  pub const FILE_UPLOAD: &str = "fileUpload";
  pub const FILE_DOWNLOAD: &str = "fileDownload";
  pub const FILE_PIPE_UPLOAD: &str = "filePipeUpload";
  pub const FILE_PIPE_DOWNLOAD: &str = "filePipeDownload";
  pub const FILE_DELETE: &str = "fileDelete";
  pub const NEW_FOLDER: &str = "newFolder";
  pub const RENAME_FILE: &str = "renameFile";
  pub const FILE_COPY: &str = "fileCopy";
  pub const FILE_MOVE: &str = "fileMove";

  pub const APP_START: &str = "agaveAppStart";
  pub const APP_LIST: &str = "getAgaveList";
  pub const JOB_LIST: &str = "getJobList";
  pub const JOB_DETAILS: &str = "getJobDetails";
  pub const STOP_JOB: &str = "stopJob";

  /// Every identifier the standard catalog registers.
  pub const ALL: &[&str] = &[
    CHANGE_DIR,
    FULL_AUTH,
    WAIT_ALL,
    AUTH_STEP1,
    AUTH_STEP1A,
    AUTH_STEP2,
    AUTH_STEP3,
    AUTH_REFRESH,
    AUTH_REVOKE,
    DIR_LISTING,
    FILE_UPLOAD,
    FILE_DOWNLOAD,
    FILE_PIPE_UPLOAD,
    FILE_PIPE_DOWNLOAD,
    FILE_DELETE,
    NEW_FOLDER,
    RENAME_FILE,
    FILE_COPY,
    FILE_MOVE,
    APP_START,
    APP_LIST,
    JOB_LIST,
    JOB_DETAILS,
    STOP_JOB,
  ];
}

/// Deployment constants substituted into the catalog's templates.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
  /// Storage system identifier used in file paths.
  pub storage_system: String,
  /// API client name registered for this application.
  pub client_name: String,
  /// Description sent when registering the API client.
  pub client_description: String,
}

/// Build the standard catalog.
pub fn standard_catalog(config: &CatalogConfig) -> Result<GuideRegistry, GuideError> {
  let mut registry = GuideRegistry::new();
  for guide in standard_guides(config)? {
    registry.register(guide)?;
  }
  Ok(registry)
}

/// Build the standard catalog plus one descriptor guide per app.
pub fn catalog_with_apps(
  config: &CatalogConfig,
  apps: impl IntoIterator<Item = AppSpec>,
) -> Result<GuideRegistry, GuideError> {
  let mut registry = standard_catalog(config)?;
  for app in apps {
    registry.register(TaskGuide::app(app))?;
  }
  Ok(registry)
}

fn standard_guides(config: &CatalogConfig) -> Result<Vec<TaskGuide>, GuideError> {
  // Spliced into template source as-is
  template_literal("client_name", &config.client_name)?;
  template_literal("storage_system", &config.storage_system)?;

  let client_path = format!("/clients/v2/{}", config.client_name);
  let listing_path = format!("/files/v2/listings/system/{}/{{0}}", config.storage_system);
  let media_path = format!("/files/v2/media/system/{}/{{0}}", config.storage_system);
  let register_body = format!(
    "clientName={}&description={}",
    form_value(&config.client_name),
    form_value(&config.client_description)
  );

  let media = |id: &str, kind: RequestKind| -> Result<TaskGuide, GuideError> {
    Ok(
      TaskGuide::new(id, kind)
        .with_url(&media_path)?
        .with_auth(AuthHeader::Bearer),
    )
  };
  let file_action = |id: &str, action: &str| -> Result<TaskGuide, GuideError> {
    Ok(media(id, RequestKind::Put)?.with_body(&format!("action={action}&path={{0}}"))?)
  };

  Ok(vec![
    TaskGuide::new(ids::CHANGE_DIR, RequestKind::None),
    TaskGuide::new(ids::FULL_AUTH, RequestKind::None),
    TaskGuide::new(ids::WAIT_ALL, RequestKind::None),
    // Login sequence
    TaskGuide::new(ids::AUTH_STEP1, RequestKind::Get)
      .with_url(&client_path)?
      .with_auth(AuthHeader::Password)
      .internal(),
    TaskGuide::new(ids::AUTH_STEP1A, RequestKind::Delete)
      .with_url(&client_path)?
      .with_auth(AuthHeader::Password)
      .internal(),
    TaskGuide::new(ids::AUTH_STEP2, RequestKind::Post)
      .with_url("/clients/v2/")?
      .with_body(&register_body)?
      .with_auth(AuthHeader::Password)
      .internal(),
    TaskGuide::new(ids::AUTH_STEP3, RequestKind::Post)
      .with_url("/token")?
      .with_body("username={0}&password={1}&grant_type=password&scope=PRODUCTION")?
      .with_auth(AuthHeader::Client)
      .token_format()
      .internal(),
    TaskGuide::new(ids::AUTH_REFRESH, RequestKind::Post)
      .with_url("/token")?
      .with_body("grant_type=refresh_token&scope=PRODUCTION&refresh_token={0}")?
      .with_auth(AuthHeader::Client)
      .token_format()
      .internal(),
    TaskGuide::new(ids::AUTH_REVOKE, RequestKind::Post)
      .with_url("/revoke")?
      .with_body("token={0}")?
      .with_auth(AuthHeader::Client)
      .internal(),
    // Files
    TaskGuide::new(ids::DIR_LISTING, RequestKind::Get)
      .with_url(&listing_path)?
      .with_auth(AuthHeader::Bearer),
    media(ids::FILE_UPLOAD, RequestKind::Upload)?,
    media(ids::FILE_DOWNLOAD, RequestKind::Download)?,
    media(ids::FILE_PIPE_UPLOAD, RequestKind::BufferUpload)?,
    media(ids::FILE_PIPE_DOWNLOAD, RequestKind::BufferDownload)?,
    media(ids::FILE_DELETE, RequestKind::Delete)?,
    file_action(ids::NEW_FOLDER, "mkdir")?,
    file_action(ids::RENAME_FILE, "rename")?,
    file_action(ids::FILE_COPY, "copy")?,
    file_action(ids::FILE_MOVE, "move")?,
    // Apps and jobs
    TaskGuide::new(ids::APP_START, RequestKind::BufferUpload)
      .with_url("/jobs/v2")?
      .with_auth(AuthHeader::Bearer),
    TaskGuide::new(ids::APP_LIST, RequestKind::Get)
      .with_url("/apps/v2")?
      .with_auth(AuthHeader::Bearer),
    TaskGuide::new(ids::JOB_LIST, RequestKind::Get)
      .with_url("/jobs/v2")?
      .with_auth(AuthHeader::Bearer),
    TaskGuide::new(ids::JOB_DETAILS, RequestKind::Get)
      .with_url("/jobs/v2/{0}")?
      .with_auth(AuthHeader::Bearer),
    TaskGuide::new(ids::STOP_JOB, RequestKind::Post)
      .with_url("/jobs/v2/{0}")?
      .with_body("action=stop")?
      .with_auth(AuthHeader::Bearer),
  ])
}

fn template_literal(field: &'static str, value: &str) -> Result<(), GuideError> {
  if value.contains(['{', '}']) {
    return Err(GuideError::InvalidCatalogValue {
      field,
      value: value.to_string(),
    });
  }
  Ok(())
}

fn form_value(value: &str) -> String {
  url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
