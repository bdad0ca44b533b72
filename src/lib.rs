//! Agave
//!
//! Asynchronous client for the Agave science-gateway REST service: login,
//! remote file management, and job submission against one tenant.
//!
//! ```ignore
//! agave::init_logging();
//! let config = agave::Config::load_default().await?;
//! let client = agave::connect(&config)?;
//!
//! client.perform_auth("alice", "secret")?.wait().await;
//! let jobs = client.list_jobs()?.wait().await;
//! client.close_session()?.wait().await;
//! ```

mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

pub use agave_engine::{
  AgaveClient, ChannelNotifier, ClientConfig, ClientError, ClientEvent, CompletedTask,
  DispatchArgs, DispatchError, EventNotifier, NoopNotifier, Payload, ReplyPayload, RequestState,
  TaskOutcome, TaskParams, TaskReply, resolve,
};
pub use agave_guide::{AppSpec, JobParams, ids};
pub use agave_transport::{HttpTransport, Transport};
pub use config::{Config, TENANT_URL_ENV};
pub use logging::init_logging;

/// Create a client for the configured tenant over HTTP.
pub fn connect(config: &Config) -> Result<AgaveClient> {
  debug!(tenant = %config.client.tenant_url, "connecting");
  let transport = HttpTransport::new().context("failed to create http transport")?;
  AgaveClient::new(&config.client, Arc::new(transport))
    .with_context(|| format!("failed to create client for {}", config.client.tenant_url))
}

/// Like [`connect`], reporting client events to `notifier`.
pub fn connect_with_notifier<N: EventNotifier + 'static>(
  config: &Config,
  notifier: N,
) -> Result<AgaveClient<N>> {
  let transport = HttpTransport::new().context("failed to create http transport")?;
  AgaveClient::with_notifier(&config.client, Arc::new(transport), notifier)
    .with_context(|| format!("failed to create client for {}", config.client.tenant_url))
}
