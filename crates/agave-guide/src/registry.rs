use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::guide::TaskGuide;

/// Catalog of task guides keyed by identifier.
///
/// Populated once before the client starts and read-only afterwards.
/// Guides are handed out as `Arc`s so in-flight replies can hold them.
#[derive(Debug, Default, Clone)]
pub struct GuideRegistry {
  guides: HashMap<String, Arc<TaskGuide>>,
}

impl GuideRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a guide. A duplicate identifier is rejected and the existing
  /// guide is left in place.
  pub fn register(&mut self, guide: TaskGuide) -> Result<(), RegistryError> {
    if self.guides.contains_key(guide.id()) {
      return Err(RegistryError::DuplicateGuide {
        id: guide.id().to_string(),
      });
    }
    self.guides.insert(guide.id().to_string(), Arc::new(guide));
    Ok(())
  }

  /// Look up a guide by identifier.
  pub fn lookup(&self, id: &str) -> Result<Arc<TaskGuide>, RegistryError> {
    self
      .guides
      .get(id)
      .cloned()
      .ok_or_else(|| RegistryError::UnknownGuide { id: id.to_string() })
  }

  pub fn contains(&self, id: &str) -> bool {
    self.guides.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.guides.len()
  }

  pub fn is_empty(&self) -> bool {
    self.guides.is_empty()
  }
}
