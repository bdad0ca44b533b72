//! Job-submission documents.
//!
//! A submission is a JSON document of the form
//!
//! ```text
//! { "appId": ..., "name": "<appId>-run", "inputs": {...}, "parameters": {...} }
//! ```
//!
//! Each supplied name is routed into `parameters` or `inputs` by the app's
//! declared lists (`parameters` wins when a name is in both). A name that
//! is in neither rejects the whole submission.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::error::GuideError;
use crate::guide::TaskGuide;

/// Multi-valued job parameters keyed by name.
pub type JobParams = BTreeMap<String, Vec<String>>;

/// Build the submission document for an app guide.
///
/// `working_dir` is the already-resolved remote working directory. When the
/// app declares a working-directory parameter it is appended to that
/// parameter's values.
pub fn job_document(
  guide: &TaskGuide,
  mut params: JobParams,
  working_dir: Option<String>,
) -> Result<Value, GuideError> {
  let app = guide.app_spec().ok_or_else(|| GuideError::NotAnApp {
    id: guide.id().to_string(),
  })?;

  if let (Some(param), Some(dir)) = (&app.working_dir_param, working_dir) {
    params.entry(param.clone()).or_default().push(dir);
  }

  let mut inputs = Map::new();
  let mut parameters = Map::new();

  for (name, mut values) in params {
    let target = if app.parameters.contains(&name) {
      &mut parameters
    } else if app.inputs.contains(&name) {
      &mut inputs
    } else {
      return Err(GuideError::UnknownJobParameter {
        app: app.name.clone(),
        name,
      });
    };

    let value = if values.len() == 1 {
      Value::String(values.remove(0))
    } else {
      Value::Array(values.into_iter().map(Value::String).collect())
    };
    target.insert(name, value);
  }

  Ok(json!({
    "appId": app.app_id,
    "name": format!("{}-run", app.app_id),
    "inputs": inputs,
    "parameters": parameters,
  }))
}
