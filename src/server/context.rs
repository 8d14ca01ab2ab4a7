//! Shared server context
//!
//! Everything a session needs to serve commands, built once at startup.

use log::{info, warn};
use std::sync::Arc;

use crate::auth::{ConfiguredIdentityProvider, IdentityProvider};
use crate::config::{ServerConfig, SharedRuntimeConfig, StartupConfig};
use crate::error::FileServerError;
use crate::storage::filesystem;
use crate::storage::{FileStore, ProfilePictureStore, ProjectFiles};

pub struct ServerContext {
    pub startup: StartupConfig,
    pub runtime: SharedRuntimeConfig,
    pub identities: Arc<dyn IdentityProvider>,
    pub files: FileStore,
    pub pictures: ProfilePictureStore,
    /// Present only when project file access is enabled
    pub project: Option<ProjectFiles>,
}

impl ServerContext {
    /// Builds the context with the accounts listed in the configuration
    pub fn from_config(config: ServerConfig) -> Result<Self, FileServerError> {
        let (startup, runtime, users) = config.split();
        let identities =
            ConfiguredIdentityProvider::from_records(&users, startup.max_username_length)?;
        Self::new(startup, runtime, Arc::new(identities))
    }

    /// Builds the context around any identity provider
    pub fn new(
        startup: StartupConfig,
        runtime: SharedRuntimeConfig,
        identities: Arc<dyn IdentityProvider>,
    ) -> Result<Self, FileServerError> {
        let storage_root = startup.storage_root_path();
        filesystem::create_directory(&storage_root)?;
        info!("Storage root directory: {}", storage_root.display());

        let project = if startup.project_files_enabled {
            warn!(
                "Project file access enabled for elevated accounts (root {})",
                startup.project_root
            );
            Some(ProjectFiles::new(startup.project_root_path()))
        } else {
            None
        };

        Ok(Self {
            files: FileStore::new(&storage_root),
            pictures: ProfilePictureStore::new(&storage_root, startup.max_profile_picture_bytes),
            project,
            startup,
            runtime,
            identities,
        })
    }
}
