use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_API_BASE_URL;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory of the shared storage domain (the app-group equivalent).
    /// Every execution context of the client family points here.
    pub shared_dir: PathBuf,
    /// Base URL of the remote backend.
    pub api_base_url: String,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(shared_dir: P) -> Self {
        Self {
            shared_dir: shared_dir.as_ref().to_path_buf(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("linksync_data")
    }
}
