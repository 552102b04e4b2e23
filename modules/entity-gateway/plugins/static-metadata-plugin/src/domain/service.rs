//! Service implementation for the static metadata plugin.

use std::collections::HashMap;
use std::sync::Arc;

use entity_gateway_sdk::{EntityMetadata, MetadataError, MetadataProvider};

use super::error::LoadError;
use super::loader::load_entities;
use crate::config::StaticMetadataPluginConfig;

/// Read-only Metadata Store built once from configuration.
///
/// Entity names and REST paths are matched exactly.
pub struct Service {
    entities: HashMap<String, Arc<EntityMetadata>>,
    rest_paths: HashMap<String, Arc<EntityMetadata>>,
}

impl Service {
    /// Resolve the configuration into entity metadata.
    ///
    /// # Errors
    ///
    /// [`LoadError`] for any inconsistency between the runtime configuration
    /// and the schema.
    pub fn from_config(cfg: &StaticMetadataPluginConfig) -> Result<Self, LoadError> {
        let loaded = load_entities(cfg)?;

        let mut entities = HashMap::with_capacity(loaded.len());
        let mut rest_paths: HashMap<String, Arc<EntityMetadata>> = HashMap::new();
        for (name, entity) in loaded {
            let entity = Arc::new(entity);
            if entity.rest.enabled {
                if let Some(existing) = rest_paths.get(&entity.rest.path) {
                    return Err(LoadError::DuplicateRestPath {
                        path: entity.rest.path.clone(),
                        first: existing.name.clone(),
                        second: name,
                    });
                }
                rest_paths.insert(entity.rest.path.clone(), Arc::clone(&entity));
            }
            entities.insert(name, entity);
        }

        Ok(Self {
            entities,
            rest_paths,
        })
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl MetadataProvider for Service {
    fn entity(&self, name: &str) -> Result<Arc<EntityMetadata>, MetadataError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| MetadataError::EntityNotFound(name.to_owned()))
    }

    fn entity_for_rest_path(&self, path: &str) -> Result<Arc<EntityMetadata>, MetadataError> {
        self.rest_paths
            .get(path)
            .or_else(|| self.entities.get(path))
            .cloned()
            .ok_or_else(|| MetadataError::EntityNotFound(path.to_owned()))
    }
}
