// ABOUTME: Provider factory resolving configuration to a concrete sandbox backend
// ABOUTME: Fails fast on missing credentials; unimplemented backends are a distinct error

use std::sync::Arc;
use tracing::info;

use crate::config::{Backend, SandboxConfig};
use crate::error::{Result, SandboxError};
use crate::providers::{E2bProvider, SandboxProvider};

/// Create the configured sandbox provider.
///
/// Missing credentials for the selected backend fail here, at construction,
/// not at first use.
pub fn create_provider(config: &SandboxConfig) -> Result<Arc<dyn SandboxProvider>> {
    info!("Creating {} sandbox provider", config.provider);

    match config.provider {
        Backend::E2b => {
            let api_key = config
                .e2b_api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    SandboxError::Configuration(
                        "E2B_API_KEY environment variable is required for the e2b provider"
                            .to_string(),
                    )
                })?;

            let provider = E2bProvider::new(api_key, config.e2b_template_id.clone())?;
            Ok(Arc::new(provider))
        }
        Backend::Docker => Err(SandboxError::NotSupported(
            "Docker sandbox provider is not yet implemented. Use provider \"e2b\"".to_string(),
        )),
    }
}

/// Create the provider described by the process environment.
pub fn provider_from_env() -> Result<Arc<dyn SandboxProvider>> {
    let config = SandboxConfig::from_env()?;
    create_provider(&config)
}
