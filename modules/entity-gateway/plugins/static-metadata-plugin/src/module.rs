use std::sync::{Arc, OnceLock};

use anyhow::Context;
use entity_gateway_sdk::MetadataProvider;
use tracing::info;

use crate::config::StaticMetadataPluginConfig;
use crate::domain::Service;

/// Static metadata plugin.
///
/// Serves entity metadata resolved from a YAML schema snapshot and runtime
/// configuration, for development and testing.
pub struct StaticMetadataPlugin {
    service: OnceLock<Arc<Service>>,
}

impl Default for StaticMetadataPlugin {
    fn default() -> Self {
        Self {
            service: OnceLock::new(),
        }
    }
}

impl StaticMetadataPlugin {
    pub const MODULE_NAME: &'static str = "static-metadata-plugin";

    /// Resolve `cfg` into the Metadata Store and keep it for the lifetime of
    /// the plugin.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not resolve against its schema or the
    /// plugin was already initialized.
    pub fn init(
        &self,
        cfg: &StaticMetadataPluginConfig,
    ) -> anyhow::Result<Arc<dyn MetadataProvider>> {
        info!("Initializing {} module", Self::MODULE_NAME);
        info!(
            table_count = cfg.schema.len(),
            entity_count = cfg.runtime.entities.len(),
            "Loaded plugin configuration"
        );

        let service =
            Arc::new(Service::from_config(cfg).context("failed to resolve entity metadata")?);
        self.service
            .set(Arc::clone(&service))
            .map_err(|_| anyhow::anyhow!("{} module already initialized", Self::MODULE_NAME))?;

        info!(
            entity_count = service.entity_count(),
            "{} module initialized successfully",
            Self::MODULE_NAME
        );
        Ok(service)
    }

    /// Parse a YAML document and initialize from it.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or for any reason [`Self::init`] fails.
    pub fn init_from_yaml(&self, yaml: &str) -> anyhow::Result<Arc<dyn MetadataProvider>> {
        let cfg: StaticMetadataPluginConfig =
            serde_saphyr::from_str(yaml).context("failed to parse static metadata configuration")?;
        self.init(&cfg)
    }

    /// The Metadata Store, once initialized.
    #[must_use]
    pub fn provider(&self) -> Option<Arc<dyn MetadataProvider>> {
        self.service
            .get()
            .map(|service| Arc::clone(service) as Arc<dyn MetadataProvider>)
    }
}
