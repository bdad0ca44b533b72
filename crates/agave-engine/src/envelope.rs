//! Classification of response documents.
//!
//! Agave answers with a JSON envelope, `{"status": "success"|"error",
//! "message": ..., "result": ...}`, except for the OAuth token endpoint
//! which returns a bare token document.

use agave_guide::TaskGuide;
use serde_json::Value;

use crate::reply::RequestState;

const NO_SUCH_CLIENT: &str = "Application not found";
const BAD_CREDENTIALS: &str =
  "Login failed.Please recheck the username and password and try again.";

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Envelope {
  pub(crate) state: RequestState,
  /// The parsed document, absent when the body was not JSON.
  pub(crate) doc: Option<Value>,
}

impl Envelope {
  pub(crate) fn no_connect() -> Self {
    Self {
      state: RequestState::NoConnect,
      doc: None,
    }
  }

  /// The envelope's `message` field.
  pub(crate) fn message(&self) -> Option<&str> {
    self.doc.as_ref()?.get("message")?.as_str()
  }

  /// String at a JSON path, empty when absent or not a string.
  pub(crate) fn string_at(&self, path: &[&str]) -> &str {
    let mut current = match &self.doc {
      Some(doc) => doc,
      None => return "",
    };
    for key in path {
      match current.get(key) {
        Some(next) => current = next,
        None => return "",
      }
    }
    current.as_str().unwrap_or("")
  }
}

/// Classify a response body for `guide`.
pub(crate) fn classify(guide: &TaskGuide, body: &[u8]) -> Envelope {
  let doc: Value = match serde_json::from_slice(body) {
    Ok(Value::Object(map)) => Value::Object(map),
    _ => return Envelope::no_connect(),
  };

  let state = if guide.is_token_format() {
    if doc.get("access_token").is_some_and(|v| !v.is_null()) {
      RequestState::Good
    } else if doc.get("error").is_some() {
      RequestState::Fail
    } else {
      RequestState::NoConnect
    }
  } else {
    match doc.get("status").and_then(Value::as_str) {
      Some("success") => RequestState::Good,
      Some("error") => RequestState::Fail,
      _ => RequestState::NoConnect,
    }
  };

  Envelope {
    state,
    doc: Some(doc),
  }
}

/// Why a client check did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientCheckFailure {
  /// No API client registered under our name yet.
  NoSuchClient,
  InvalidCredentials,
  Unrecognized,
}

pub(crate) fn client_check_failure(envelope: &Envelope) -> ClientCheckFailure {
  match envelope.message() {
    Some(NO_SUCH_CLIENT) => ClientCheckFailure::NoSuchClient,
    Some(BAD_CREDENTIALS) => ClientCheckFailure::InvalidCredentials,
    _ => ClientCheckFailure::Unrecognized,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use agave_guide::RequestKind;
  use serde_json::json;

  fn standard() -> TaskGuide {
    TaskGuide::new("dirListing", RequestKind::Get)
  }

  fn token() -> TaskGuide {
    TaskGuide::new("authStep3", RequestKind::Post).token_format()
  }

  fn bytes(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
  }

  #[test]
  fn test_standard_envelope() {
    let good = classify(&standard(), &bytes(json!({"status": "success", "result": []})));
    assert_eq!(good.state, RequestState::Good);

    let fail = classify(&standard(), &bytes(json!({"status": "error", "message": "nope"})));
    assert_eq!(fail.state, RequestState::Fail);
    assert_eq!(fail.message(), Some("nope"));

    let odd = classify(&standard(), &bytes(json!({"status": "pending"})));
    assert_eq!(odd.state, RequestState::NoConnect);
  }

  #[test]
  fn test_unparseable_body_is_no_connect() {
    assert_eq!(classify(&standard(), b"<html>").state, RequestState::NoConnect);
    assert_eq!(classify(&standard(), b"").state, RequestState::NoConnect);
    assert_eq!(classify(&standard(), b"[1,2]").state, RequestState::NoConnect);
  }

  #[test]
  fn test_token_document() {
    let good = classify(&token(), &bytes(json!({"access_token": "a", "refresh_token": "r"})));
    assert_eq!(good.state, RequestState::Good);
    assert_eq!(good.string_at(&["refresh_token"]), "r");

    let fail = classify(&token(), &bytes(json!({"error": "invalid_grant"})));
    assert_eq!(fail.state, RequestState::Fail);

    // A standard envelope is not a token document
    let other = classify(&token(), &bytes(json!({"status": "success"})));
    assert_eq!(other.state, RequestState::NoConnect);
  }

  #[test]
  fn test_string_at_nested_and_missing() {
    let env = classify(
      &standard(),
      &bytes(json!({"status": "success", "result": {"consumerKey": "k", "n": 3}})),
    );
    assert_eq!(env.string_at(&["result", "consumerKey"]), "k");
    assert_eq!(env.string_at(&["result", "n"]), "");
    assert_eq!(env.string_at(&["result", "consumerSecret"]), "");
    assert_eq!(Envelope::no_connect().string_at(&["result"]), "");
  }

  #[test]
  fn test_client_check_messages() {
    let env = |message: &str| {
      classify(&standard(), &bytes(json!({"status": "error", "message": message})))
    };
    assert_eq!(
      client_check_failure(&env("Application not found")),
      ClientCheckFailure::NoSuchClient
    );
    assert_eq!(
      client_check_failure(&env(
        "Login failed.Please recheck the username and password and try again."
      )),
      ClientCheckFailure::InvalidCredentials
    );
    assert_eq!(
      client_check_failure(&env("Service unavailable")),
      ClientCheckFailure::Unrecognized
    );
    assert_eq!(
      client_check_failure(&Envelope::no_connect()),
      ClientCheckFailure::Unrecognized
    );
  }
}
