// ABOUTME: Sandboxed execution engine for security scanning tools
// ABOUTME: Ephemeral remote environments with enforced timeouts, output capture, and guaranteed teardown

pub mod config;
pub mod error;
pub mod factory;
pub mod providers;
pub mod tools;
pub mod types;

pub use config::{Backend, SandboxConfig};
pub use error::{Result, SandboxError};
pub use factory::{create_provider, provider_from_env};
pub use providers::{E2bProvider, SandboxProvider};
pub use types::{ExecutionResult, SandboxHandle, ToolConfig, ToolConfigBuilder};
