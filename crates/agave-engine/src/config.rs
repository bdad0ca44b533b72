use agave_guide::{AppSpec, CatalogConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TENANT_URL: &str = "https://agave.designsafe-ci.org";
pub const DEFAULT_STORAGE_SYSTEM: &str = "designsafe.storage.default";
pub const DEFAULT_CLIENT_NAME: &str = "agave-client";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Base URL of the Agave tenant.
  pub tenant_url: String,
  /// Storage system all file paths refer to.
  pub storage_system: String,
  /// API client name registered on first login.
  pub client_name: String,
  pub client_description: String,
  /// Job-submission apps available to this client.
  pub apps: Vec<AppSpec>,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      tenant_url: DEFAULT_TENANT_URL.to_string(),
      storage_system: DEFAULT_STORAGE_SYSTEM.to_string(),
      client_name: DEFAULT_CLIENT_NAME.to_string(),
      client_description: format!("Client ID for {DEFAULT_CLIENT_NAME}"),
      apps: Vec::new(),
    }
  }
}

impl ClientConfig {
  pub(crate) fn catalog(&self) -> CatalogConfig {
    CatalogConfig {
      storage_system: self.storage_system.clone(),
      client_name: self.client_name.clone(),
      client_description: self.client_description.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_document_keeps_defaults() {
    let config: ClientConfig = serde_json::from_str(
      r#"{
        "tenant_url": "https://agave.example.org",
        "apps": [
          { "name": "mesh", "app_id": "cwe-mesh-1.0", "parameters": ["stage"] }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(config.tenant_url, "https://agave.example.org");
    assert_eq!(config.storage_system, DEFAULT_STORAGE_SYSTEM);
    assert_eq!(config.client_description, "Client ID for agave-client");
    assert_eq!(config.apps.len(), 1);
    assert!(config.apps[0].inputs.is_empty());
  }
}
