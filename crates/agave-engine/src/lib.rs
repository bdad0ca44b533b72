//! Agave Engine
//!
//! Asynchronous client for the Agave science-gateway service. An
//! [`AgaveClient`] turns named task guides into HTTP requests, tracks every
//! request it has in flight, runs the multi-step login against the tenant,
//! and coordinates an orderly shutdown that revokes the session and waits
//! for outstanding work.
//!
//! # Example
//!
//! ```ignore
//! let transport = Arc::new(HttpTransport::new()?);
//! let client = AgaveClient::new(&ClientConfig::default(), transport)?;
//!
//! let login = client.perform_auth("alice", "secret")?;
//! if login.wait().await.is_good() {
//!   let listing = client.remote_ls("")?.wait().await;
//!   println!("{:?}", listing.json());
//! }
//!
//! client.close_session()?.wait().await;
//! ```

mod auth;
mod client;
mod config;
mod envelope;
mod error;
mod events;
mod operations;
mod path;
mod pending;
mod reply;
mod request;
mod session;

pub use client::AgaveClient;
pub use config::{ClientConfig, DEFAULT_CLIENT_NAME, DEFAULT_STORAGE_SYSTEM, DEFAULT_TENANT_URL};
pub use error::{ClientError, DispatchError};
pub use events::{ChannelNotifier, ClientEvent, EventNotifier, NoopNotifier};
pub use path::resolve;
pub use reply::{CompletedTask, ReplyPayload, RequestState, TaskOutcome, TaskParams, TaskReply};
pub use request::{DispatchArgs, Payload};
