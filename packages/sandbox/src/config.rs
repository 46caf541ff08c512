// ABOUTME: Sandbox configuration loaded from environment variables
// ABOUTME: Selects the active backend and carries default resource ceilings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SandboxError};

/// Which sandbox backend to use. Exactly one backend is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    E2b,
    Docker,
}

impl FromStr for Backend {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "e2b" => Ok(Backend::E2b),
            "docker" => Ok(Backend::Docker),
            other => Err(SandboxError::Configuration(format!(
                "Unknown sandbox provider: {}. Available providers: e2b, docker",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::E2b => write!(f, "e2b"),
            Backend::Docker => write!(f, "docker"),
        }
    }
}

/// Global sandbox configuration, normally loaded from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub provider: Backend,
    pub e2b_api_key: Option<String>,
    /// Custom backend template with security tools preinstalled
    pub e2b_template_id: Option<String>,
    pub docker_host: String,
    /// CPU cores
    pub cpu_limit: f32,
    /// Memory limit in MB
    pub memory_limit: u32,
    /// Default execution timeout in seconds
    pub timeout: u64,
    /// Network bandwidth ceiling in Mbps
    pub network_limit: u32,
    pub read_only_filesystem: bool,
    pub network_isolated: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            provider: Backend::E2b,
            e2b_api_key: None,
            e2b_template_id: None,
            docker_host: "unix:///var/run/docker.sock".to_string(),
            cpu_limit: 2.0,
            memory_limit: 4096,
            timeout: 3600,
            network_limit: 10,
            read_only_filesystem: true,
            network_isolated: true,
        }
    }
}

impl SandboxConfig {
    /// Load configuration from environment variables.
    ///
    /// An unrecognized `SANDBOX_PROVIDER` is a configuration error;
    /// malformed numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let provider: Backend = std::env::var("SANDBOX_PROVIDER")
            .unwrap_or_else(|_| "e2b".to_string())
            .parse()?;

        Ok(Self {
            provider,
            e2b_api_key: std::env::var("E2B_API_KEY").ok(),
            e2b_template_id: std::env::var("E2B_TEMPLATE_ID").ok(),
            docker_host: std::env::var("DOCKER_HOST")
                .unwrap_or_else(|_| "unix:///var/run/docker.sock".to_string()),
            cpu_limit: env_or("SANDBOX_CPU_LIMIT", 2.0),
            memory_limit: env_or("SANDBOX_MEMORY_LIMIT", 4096),
            timeout: env_or("SANDBOX_TIMEOUT", 3600),
            network_limit: env_or("SANDBOX_NETWORK_LIMIT", 10),
            read_only_filesystem: true,
            network_isolated: true,
        })
    }
}

/// Parse an env var, falling back to the default when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
