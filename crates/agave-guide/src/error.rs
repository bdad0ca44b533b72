//! Guide errors.

use thiserror::Error;

/// Errors raised while parsing or rendering a positional template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
  /// A `{` was not closed, or the placeholder is not a decimal index.
  #[error("malformed placeholder at byte {offset} in template '{template}'")]
  MalformedPlaceholder { template: String, offset: usize },

  /// The number of supplied arguments differs from the declared arity.
  #[error("template '{template}' expects {expected} argument(s), got {actual}")]
  ArgumentCount {
    template: String,
    expected: usize,
    actual: usize,
  },
}

/// Errors raised by the guide registry.
///
/// Both variants indicate a configuration defect rather than a runtime
/// condition: guide identifiers are chosen by code, not by users.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  /// A guide with the same identifier is already registered.
  #[error("invalid task guide list: duplicate name '{id}'")]
  DuplicateGuide { id: String },

  /// No guide is registered under the identifier.
  #[error("non-existent request requested: '{id}'")]
  UnknownGuide { id: String },
}

/// Errors raised while assembling guides or job documents.
#[derive(Debug, Error)]
pub enum GuideError {
  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Registry(#[from] RegistryError),

  /// A job parameter is in neither the declared inputs nor parameters.
  #[error("job parameter '{name}' is not declared by app '{app}'")]
  UnknownJobParameter { app: String, name: String },

  /// A deployment constant would change the shape of a template.
  #[error("catalog setting '{field}' must not contain braces: '{value}'")]
  InvalidCatalogValue { field: &'static str, value: String },

  /// The guide does not describe a job-submission app.
  #[error("guide '{id}' is not a job-submission app")]
  NotAnApp { id: String },
}
