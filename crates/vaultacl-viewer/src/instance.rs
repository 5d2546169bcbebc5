use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use vaultacl::{AclDocument, AclHandle};

use crate::config::{AclOrigin, InstanceConfig};
use crate::source::{FileSource, load_policies};

/// A configured instance and the ACL most recently loaded for it.
#[derive(Debug)]
pub struct Instance {
    config: InstanceConfig,
    acl: AclHandle,
    error: Option<String>,
}

impl Instance {
    /// Creates the instance and loads its ACL.
    ///
    /// A failed load is recorded rather than returned, so the instance still
    /// shows up (with an empty ACL) next to the ones that loaded.
    pub fn open(config: InstanceConfig) -> Self {
        let mut instance = Self {
            config,
            acl: AclHandle::new(),
            error: None,
        };
        if let Err(err) = instance.refresh() {
            warn!(instance = %instance.config.name, "unable to load ACL: {err:#}");
            instance.error = Some(format!("{err:#}"));
        }
        instance
    }

    /// Reloads the ACL, keeping the previous one if loading fails.
    pub fn refresh(&self) -> Result<u64> {
        let generation = match self.config.origin()? {
            AclOrigin::File(path) => self.acl.refresh(&FileSource::new(path))?,
            AclOrigin::Policies(paths) => self.acl.publish(load_policies(&paths)?),
        };
        info!(instance = %self.config.name, generation, "loaded ACL");
        Ok(generation)
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn acl(&self) -> Arc<AclDocument> {
        self.acl.load()
    }

    /// The reason the ACL could not be loaded, if it could not.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
