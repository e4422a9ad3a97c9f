//! Infrastructure blueprint descriptor.
//!
//! The blueprint body is the template every application stack is created from.
//! Its resource count drives creation and deletion progress, so it is derived from
//! the body itself instead of being maintained by hand.

use crate::error::{HerogateError, Result};
use crate::template::TemplateDocument;
use std::path::Path;
use tracing::debug;

/// Stack tag carrying the blueprint version. Stacks without it are not applications.
pub const PLATFORM_VERSION_TAG: &str = "herogate-platform-version";

/// Stack output holding the git repository URL.
pub const REPOSITORY_OUTPUT: &str = "Repository";

/// Stack output holding the load balancer DNS name.
pub const ENDPOINT_OUTPUT: &str = "Endpoint";

/// Logical id of the pipeline artifact bucket.
pub const ARTIFACT_STORE_RESOURCE: &str = "HerogatePipelineArtifactStore";

/// Logical id of the container image registry.
pub const REGISTRY_RESOURCE: &str = "HerogateRegistry";

/// Capability required because the blueprint creates named IAM resources.
pub const CAPABILITY_NAMED_IAM: &str = "CAPABILITY_NAMED_IAM";

/// Versioned stack blueprint.
#[derive(Debug, Clone)]
pub struct Blueprint {
    version: String,
    body: String,
    expected_resources: usize,
}

impl Blueprint {
    /// Create a blueprint, counting the resources declared in `body`.
    pub fn new(version: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        let expected_resources = count_resources(&body)?;
        let version = version.into();

        debug!(version = %version, expected_resources, "Loaded blueprint");
        Ok(Self { version, body, expected_resources })
    }

    /// Create a blueprint whose resource count is declared up front.
    ///
    /// Fails when the declaration disagrees with the body.
    pub fn with_expected_resources(
        version: impl Into<String>,
        body: impl Into<String>,
        expected_resources: usize,
    ) -> Result<Self> {
        let blueprint = Self::new(version, body)?;
        if blueprint.expected_resources != expected_resources {
            return Err(HerogateError::InvalidBlueprint {
                reason: format!(
                    "blueprint {} declares {} resources but its body defines {}",
                    blueprint.version, expected_resources, blueprint.expected_resources
                ),
            });
        }
        Ok(blueprint)
    }

    /// Load a blueprint body from a file.
    pub fn load(version: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(|e| HerogateError::IoError { path: path.to_path_buf(), source: e })?;
        Self::new(version, body)
    }

    /// Load the blueprint installed for `version` under the configuration directory.
    pub fn installed(version: &str) -> Result<Self> {
        Self::load(version, crate::paths::blueprint_path(version))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of resources a fully created stack contains.
    pub fn expected_resources(&self) -> usize {
        self.expected_resources
    }
}

fn count_resources(body: &str) -> Result<usize> {
    let document = TemplateDocument::parse(body)
        .map_err(|e| HerogateError::InvalidBlueprint { reason: e.to_string() })?;
    let resources = document
        .resources()
        .map_err(|e| HerogateError::InvalidBlueprint { reason: e.to_string() })?;

    if resources.is_empty() {
        return Err(HerogateError::InvalidBlueprint {
            reason: "blueprint defines no resources".to_string(),
        });
    }
    Ok(resources.len())
}
