mod common;

use agave_engine::{ClientEvent, DispatchError, RequestState};
use agave_transport::Method;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_login_replaces_existing_client() {
  let transport = ScriptedTransport::new();
  script_login(&transport);
  let (client, mut events) = client(transport.clone());

  let login = client.perform_auth("alice", "pw").unwrap();
  assert_eq!(login.guide_id(), "fullAuth");
  assert_eq!(login.param("uname"), Some("alice"));

  let done = login.wait().await;
  assert_eq!(done.state, RequestState::Good);
  assert!(client.is_authenticated());
  assert_eq!(client.user_name(), "alice");

  assert_eq!(
    transport.paths(),
    vec![
      "GET /clients/v2/test-client",
      "DELETE /clients/v2/test-client",
      "POST /clients/v2/",
      "POST /token",
    ]
  );

  let calls = transport.calls();
  for call in &calls[..3] {
    assert_eq!(call.authorization.as_deref(), Some("Basic YWxpY2U6cHc="));
  }
  assert_eq!(
    calls[2].body.as_deref(),
    Some("clientName=test-client&description=Client+ID+for+agave-client")
  );
  assert_eq!(calls[3].authorization.as_deref(), Some("Basic azpz"));
  assert_eq!(
    calls[3].body.as_deref(),
    Some("username=alice&password=pw&grant_type=password&scope=PRODUCTION")
  );

  let events = drain(&mut events);
  assert_eq!(
    count(&events, &ClientEvent::LoginSucceeded {
      username: "alice".to_string()
    }),
    1
  );
  assert_eq!(count(&events, &ClientEvent::AllTasksFinished), 1);
  assert_eq!(count(&events, &ClientEvent::SessionCleared), 0);
  assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_missing_client_goes_straight_to_registration() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    404,
    failure("Application not found").to_string(),
  );
  script_registration(&transport);
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;

  assert!(done.is_good());
  assert_eq!(
    transport.paths(),
    vec!["GET /clients/v2/test-client", "POST /clients/v2/", "POST /token"]
  );
  assert_eq!(count(&drain(&mut events), &ClientEvent::SessionCleared), 0);
}

#[tokio::test]
async fn test_rejected_credentials_fail_and_clear() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    401,
    failure("Login failed.Please recheck the username and password and try again.").to_string(),
  );
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "wrong").unwrap().wait().await;

  assert_eq!(done.state, RequestState::Fail);
  assert!(!client.is_authenticated());
  assert_eq!(client.user_name(), "");
  assert_eq!(transport.calls().len(), 1);
  assert_eq!(count(&drain(&mut events), &ClientEvent::SessionCleared), 1);

  // A cleared session may log in again
  script_login(&transport);
  assert!(client.perform_auth("alice", "pw").unwrap().wait().await.is_good());
}

#[tokio::test]
async fn test_unrecognized_check_failure_is_no_connect() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    500,
    failure("Service temporarily unavailable").to_string(),
  );
  let (client, _events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;
  assert_eq!(done.state, RequestState::NoConnect);
  assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_unreachable_service_mid_login() {
  let transport = ScriptedTransport::new();
  transport.respond_json(Method::GET, CLIENT_PATH, success(json!({})));
  transport.unreachable(Method::DELETE, CLIENT_PATH);
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;

  assert_eq!(done.state, RequestState::NoConnect);
  assert!(!client.is_authenticated());
  assert_eq!(transport.calls().len(), 2);

  let events = drain(&mut events);
  assert_eq!(count(&events, &ClientEvent::SessionCleared), 1);
  assert_eq!(count(&events, &ClientEvent::AllTasksFinished), 1);
}

#[tokio::test]
async fn test_registration_without_credentials_is_fatal() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    404,
    failure("Application not found").to_string(),
  );
  transport.respond_json(Method::POST, "/clients/v2/", success(json!({"consumerKey": "k"})));
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;

  assert_eq!(done.state, RequestState::NoConnect);
  assert!(!client.is_authenticated());
  assert_eq!(transport.calls().len(), 2);
  assert!(
    drain(&mut events)
      .iter()
      .any(|event| matches!(event, ClientEvent::FatalError { .. }))
  );
}

#[tokio::test]
async fn test_rejected_token_grant_fails_login() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    404,
    failure("Application not found").to_string(),
  );
  transport.respond_json(
    Method::POST,
    "/clients/v2/",
    success(json!({"consumerKey": "k", "consumerSecret": "s"})),
  );
  transport.respond(
    Method::POST,
    "/token",
    401,
    json!({"error": "invalid_grant", "error_description": "bad credentials"}).to_string(),
  );
  let (client, _events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;
  assert_eq!(done.state, RequestState::Fail);
  assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_is_not_reentrant() {
  let transport = ScriptedTransport::holding();
  script_login(&transport);
  let (client, _events) = client(transport.clone());

  let _first = client.perform_auth("alice", "pw").unwrap();
  assert!(matches!(
    client.perform_auth("alice", "pw"),
    Err(DispatchError::LoginActive)
  ));
  transport.wait_for_calls(1).await;
  assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_login_refused_once_logged_in() {
  let (client, _events) = logged_in(ScriptedTransport::new()).await;
  assert!(matches!(
    client.perform_auth("bob", "pw"),
    Err(DispatchError::LoginActive)
  ));
  assert_eq!(client.user_name(), "alice");
}

#[tokio::test]
async fn test_refresh_replaces_tokens() {
  let transport = ScriptedTransport::new();
  let (client, _events) = logged_in(transport.clone()).await;

  transport.respond_json(
    Method::POST,
    "/token",
    json!({"access_token": "at2", "refresh_token": "rt2"}),
  );
  let done = client.refresh_session().unwrap().wait().await;
  assert!(done.is_good());

  let refresh = transport.calls().pop().unwrap();
  assert_eq!(refresh.authorization.as_deref(), Some("Basic azpz"));
  assert_eq!(
    refresh.body.as_deref(),
    Some("grant_type=refresh_token&scope=PRODUCTION&refresh_token=rt")
  );

  transport.respond_json(Method::GET, "/jobs/v2", success(json!([])));
  client.list_jobs().unwrap().wait().await;
  let listing = transport.calls().pop().unwrap();
  assert_eq!(listing.authorization.as_deref(), Some("Bearer at2"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_session() {
  let transport = ScriptedTransport::new();
  let (client, mut events) = logged_in(transport.clone()).await;

  transport.respond(
    Method::POST,
    "/token",
    400,
    json!({"error": "invalid_grant"}).to_string(),
  );
  let done = client.refresh_session().unwrap().wait().await;

  assert_eq!(done.state, RequestState::Fail);
  assert!(client.is_authenticated());
  assert_eq!(count(&drain(&mut events), &ClientEvent::SessionCleared), 0);
}

#[tokio::test]
async fn test_refresh_requires_login() {
  let (client, _events) = client(ScriptedTransport::new());
  assert!(matches!(
    client.refresh_session(),
    Err(DispatchError::NotAuthenticated { .. })
  ));
}

#[tokio::test]
async fn test_rejected_client_removal_fails_and_clears() {
  let transport = ScriptedTransport::new();
  transport.respond_json(Method::GET, CLIENT_PATH, success(json!({"name": CLIENT_NAME})));
  transport.respond(
    Method::DELETE,
    CLIENT_PATH,
    403,
    failure("User does not have permission to delete this client").to_string(),
  );
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;

  assert_eq!(done.state, RequestState::Fail);
  assert!(!client.is_authenticated());
  assert_eq!(client.user_name(), "");
  assert_eq!(
    transport.paths(),
    vec!["GET /clients/v2/test-client", "DELETE /clients/v2/test-client"]
  );
  assert_eq!(count(&drain(&mut events), &ClientEvent::SessionCleared), 1);
}

#[tokio::test]
async fn test_empty_access_token_fails_login() {
  let transport = ScriptedTransport::new();
  transport.respond(
    Method::GET,
    CLIENT_PATH,
    404,
    failure("Application not found").to_string(),
  );
  transport.respond_json(
    Method::POST,
    "/clients/v2/",
    success(json!({"consumerKey": "k", "consumerSecret": "s"})),
  );
  transport.respond_json(
    Method::POST,
    "/token",
    json!({"access_token": "", "refresh_token": "rt"}),
  );
  let (client, mut events) = client(transport.clone());

  let done = client.perform_auth("alice", "pw").unwrap().wait().await;

  assert_eq!(done.state, RequestState::Fail);
  assert!(!client.is_authenticated());

  let events = drain(&mut events);
  assert_eq!(count(&events, &ClientEvent::SessionCleared), 1);
  assert!(!events.iter().any(|event| matches!(event, ClientEvent::LoginSucceeded { .. })));
}
