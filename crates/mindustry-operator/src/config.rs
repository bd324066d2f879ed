//! Operator configuration

use std::time::Duration;

pub const DEFAULT_RELEASES_URI: &str = "https://github.com/Anuken/Mindustry/releases/download/";
pub const DEFAULT_INSTALLER_IMAGE: &str = "alpine:latest";
pub const DEFAULT_SERVER_IMAGE: &str = "openjdk:17-slim";
pub const DEFAULT_ATTACH_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings shared by every handler invocation. Read-only once built.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Base URI that release tags are appended to. Must end with `/`.
    pub releases_uri: String,
    /// Image for the init container that downloads the server jar.
    pub installer_image: String,
    /// Image for the container running the server jar.
    pub server_image: String,
    /// How long to wait for the attach stream to become ready.
    pub attach_timeout: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            releases_uri: DEFAULT_RELEASES_URI.to_string(),
            installer_image: DEFAULT_INSTALLER_IMAGE.to_string(),
            server_image: DEFAULT_SERVER_IMAGE.to_string(),
            attach_timeout: DEFAULT_ATTACH_TIMEOUT,
        }
    }
}

impl OperatorConfig {
    /// Download URL of the server jar for a release tag.
    pub fn release_url(&self, version: &str) -> String {
        format!("{}{}/server-release.jar", self.releases_uri, version)
    }
}
