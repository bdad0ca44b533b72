//! Agave Guide
//!
//! Task guides are immutable templates describing how to build one kind of
//! remote request: HTTP shape, URL suffix, body, and which authorization
//! header it needs. The [`GuideRegistry`] is the catalog the dispatcher
//! consults; [`standard_catalog`] builds the guides an Agave tenant exposes.

mod catalog;
mod error;
mod guide;
mod job;
mod registry;
mod template;

pub use catalog::{CatalogConfig, catalog_with_apps, ids, standard_catalog};
pub use error::{GuideError, RegistryError, TemplateError};
pub use guide::{AppSpec, AuthHeader, RequestKind, TaskGuide};
pub use job::{JobParams, job_document};
pub use registry::GuideRegistry;
pub use template::Template;
