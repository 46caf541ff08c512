// ABOUTME: Provider trait for sandbox execution backends
// ABOUTME: Defines the abstract execute/cleanup/health contract any backend must satisfy

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::error::Result;
use crate::types::{ExecutionResult, ToolConfig};

pub mod e2b;

pub use e2b::E2bProvider;

/// Contract for sandbox execution backends.
#[async_trait]
pub trait SandboxProvider: Send + Sync + Debug {
    /// Run a single tool to completion (or timeout) in a fresh isolated
    /// environment.
    ///
    /// `workspace_dir` is the local directory remote output files are
    /// mirrored into; `scan_id` keys the environment for cleanup. A
    /// non-zero tool exit is not an error: it is encoded in the result.
    async fn execute(
        &self,
        config: &ToolConfig,
        workspace_dir: &Path,
        scan_id: &str,
    ) -> Result<ExecutionResult>;

    /// Release any environment still tracked for `scan_id`.
    ///
    /// Idempotent: unknown scan ids are a silent no-op.
    async fn cleanup(&self, scan_id: &str) -> Result<()>;

    /// Whether the backend can currently create and run environments.
    ///
    /// Never errors; any internal failure is reported as `false`.
    async fn health_check(&self) -> bool;
}
