//! Scripted transport for driving the client without a network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agave_engine::{AgaveClient, ChannelNotifier, ClientConfig, ClientEvent};
use agave_transport::{
  Method, RequestBody, ResponseSink, Transport, TransportError, TransportRequest,
  TransportResponse, UploadSource,
};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc, oneshot};

pub const TENANT: &str = "https://agave.test";
pub const STORAGE: &str = "sys";
pub const CLIENT_NAME: &str = "test-client";

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
  pub method: Method,
  pub path: String,
  pub authorization: Option<String>,
  /// Form or text body.
  pub body: Option<String>,
  /// File name and buffered bytes of a multipart upload. File uploads
  /// record no bytes.
  pub upload: Option<(String, Option<Bytes>)>,
  pub sink: ResponseSink,
}

enum Scripted {
  Respond { status: u16, body: Vec<u8> },
  Unreachable,
}

#[derive(Default)]
pub struct ScriptedTransport {
  routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
  calls: Mutex<Vec<Recorded>>,
  hold: bool,
  held: Mutex<Vec<(String, oneshot::Sender<()>)>>,
  arrived: Notify,
}

impl ScriptedTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// A transport that holds every request until it is released.
  pub fn holding() -> Arc<Self> {
    Arc::new(Self {
      hold: true,
      ..Self::default()
    })
  }

  pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<Vec<u8>>) {
    self.push(
      method,
      path,
      Scripted::Respond {
        status,
        body: body.into(),
      },
    );
  }

  pub fn respond_json(&self, method: Method, path: &str, value: Value) {
    self.respond(method, path, 200, value.to_string());
  }

  pub fn unreachable(&self, method: Method, path: &str) {
    self.push(method, path, Scripted::Unreachable);
  }

  fn push(&self, method: Method, path: &str, scripted: Scripted) {
    self
      .routes
      .lock()
      .unwrap()
      .entry((method, path.to_string()))
      .or_default()
      .push_back(scripted);
  }

  pub fn calls(&self) -> Vec<Recorded> {
    self.calls.lock().unwrap().clone()
  }

  pub fn paths(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .map(|call| format!("{} {}", call.method, call.path))
      .collect()
  }

  /// Wait until at least `n` requests have reached the transport.
  pub async fn wait_for_calls(&self, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
      loop {
        let notified = self.arrived.notified();
        if self.calls.lock().unwrap().len() >= n {
          return;
        }
        notified.await;
      }
    })
    .await
    .expect("timed out waiting for requests");
  }

  /// Let the oldest held request for `path` complete.
  pub fn release(&self, path: &str) {
    let mut held = self.held.lock().unwrap();
    let index = held
      .iter()
      .position(|(held_path, _)| held_path == path)
      .unwrap_or_else(|| panic!("no held request for {path}"));
    let (_, gate) = held.remove(index);
    gate.send(()).unwrap();
  }

  pub fn held_count(&self) -> usize {
    self.held.lock().unwrap().len()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
    let path = request.url.path().to_string();

    let (body, upload) = match request.body {
      RequestBody::Empty => (None, None),
      RequestBody::Form(form) | RequestBody::Text(form) => (Some(form), None),
      RequestBody::Multipart(part) => {
        let data = match part.source {
          UploadSource::Buffer(bytes) => Some(bytes),
          UploadSource::File(_) => None,
        };
        (None, Some((part.file_name, data)))
      }
    };

    self.calls.lock().unwrap().push(Recorded {
      method: request.method.clone(),
      path: path.clone(),
      authorization: request.authorization.clone(),
      body,
      upload,
      sink: request.sink.clone(),
    });

    let gate = if self.hold {
      let (tx, rx) = oneshot::channel();
      self.held.lock().unwrap().push((path.clone(), tx));
      Some(rx)
    } else {
      None
    };
    self.arrived.notify_waiters();

    if let Some(gate) = gate {
      let _ = gate.await;
    }

    let scripted = self
      .routes
      .lock()
      .unwrap()
      .get_mut(&(request.method, path))
      .and_then(VecDeque::pop_front);

    match scripted {
      Some(Scripted::Respond { status, body }) => {
        let ok = (200..300).contains(&status);
        match request.sink {
          ResponseSink::File(dest) if ok => {
            std::fs::write(&dest, &body)?;
            Ok(TransportResponse {
              status,
              body: Bytes::new(),
              saved_to: Some(dest),
            })
          }
          _ => Ok(TransportResponse {
            status,
            body: Bytes::from(body),
            saved_to: None,
          }),
        }
      }
      Some(Scripted::Unreachable) => Err(TransportError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
      ))),
      None => Ok(TransportResponse {
        status: 404,
        body: Bytes::from(json!({"status": "error", "message": "no route"}).to_string()),
        saved_to: None,
      }),
    }
  }
}

pub fn config() -> ClientConfig {
  ClientConfig {
    tenant_url: TENANT.to_string(),
    storage_system: STORAGE.to_string(),
    client_name: CLIENT_NAME.to_string(),
    ..ClientConfig::default()
  }
}

pub fn client_with(
  config: &ClientConfig,
  transport: Arc<ScriptedTransport>,
) -> (
  AgaveClient<ChannelNotifier>,
  mpsc::UnboundedReceiver<ClientEvent>,
) {
  let (tx, rx) = mpsc::unbounded_channel();
  let client = AgaveClient::with_notifier(config, transport, ChannelNotifier::new(tx)).unwrap();
  (client, rx)
}

pub fn client(
  transport: Arc<ScriptedTransport>,
) -> (
  AgaveClient<ChannelNotifier>,
  mpsc::UnboundedReceiver<ClientEvent>,
) {
  client_with(&config(), transport)
}

/// Events received so far.
pub fn drain(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
  let mut out = Vec::new();
  while let Ok(event) = events.try_recv() {
    out.push(event);
  }
  out
}

pub fn count(events: &[ClientEvent], wanted: &ClientEvent) -> usize {
  events.iter().filter(|event| *event == wanted).count()
}

pub fn success(result: Value) -> Value {
  json!({"status": "success", "message": null, "result": result})
}

pub fn failure(message: &str) -> Value {
  json!({"status": "error", "message": message, "result": null})
}

pub const CLIENT_PATH: &str = "/clients/v2/test-client";

/// Script the four-step login where the API client already exists.
pub fn script_login(transport: &ScriptedTransport) {
  transport.respond_json(Method::GET, CLIENT_PATH, success(json!({"name": CLIENT_NAME})));
  transport.respond_json(Method::DELETE, CLIENT_PATH, success(Value::Null));
  script_registration(transport);
}

/// Script client registration and token grant.
pub fn script_registration(transport: &ScriptedTransport) {
  transport.respond_json(
    Method::POST,
    "/clients/v2/",
    success(json!({"consumerKey": "k", "consumerSecret": "s"})),
  );
  transport.respond_json(
    Method::POST,
    "/token",
    json!({"access_token": "at", "refresh_token": "rt", "expires_in": 14400}),
  );
}

/// A client that has completed a login.
pub async fn logged_in(
  transport: Arc<ScriptedTransport>,
) -> (
  AgaveClient<ChannelNotifier>,
  mpsc::UnboundedReceiver<ClientEvent>,
) {
  logged_in_with(&config(), transport).await
}

pub async fn logged_in_with(
  config: &ClientConfig,
  transport: Arc<ScriptedTransport>,
) -> (
  AgaveClient<ChannelNotifier>,
  mpsc::UnboundedReceiver<ClientEvent>,
) {
  script_login(&transport);
  let (client, mut events) = client_with(config, Arc::clone(&transport));
  let login = client.perform_auth("alice", "pw").unwrap();

  if transport.hold {
    let steps = [CLIENT_PATH, CLIENT_PATH, "/clients/v2/", "/token"];
    for (n, path) in steps.into_iter().enumerate() {
      transport.wait_for_calls(n + 1).await;
      transport.release(path);
    }
  }

  let done = login.wait().await;
  assert!(done.is_good(), "login failed: {done:?}");
  drain(&mut events);
  (client, events)
}
