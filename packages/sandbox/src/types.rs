// ABOUTME: Execution request and outcome types for sandboxed tool runs
// ABOUTME: ToolConfig describes what to run and under what limits; ExecutionResult is the terminal outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a single security tool invocation.
///
/// Immutable once built. The engine does not second-guess the caller: a
/// zero timeout or empty command is a caller contract violation, not
/// something this type corrects or rejects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name (e.g. "subfinder", "nmap")
    pub name: String,
    /// Container image or backend template hint, if the tool needs one
    pub image: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    /// Wall-clock limit for the run step, in seconds
    pub timeout: u64,
    /// CPU cores (e.g. 2.0)
    pub cpu_limit: f32,
    /// Memory limit in MB
    pub memory_limit: u32,
    pub network_isolated: bool,
    pub read_only_filesystem: bool,
}

impl ToolConfig {
    /// Start building a config for `command` with the default limits
    /// (1 hour timeout, 2 cores, 4GB, fully isolated).
    pub fn builder(name: impl Into<String>, command: impl Into<String>) -> ToolConfigBuilder {
        ToolConfigBuilder {
            config: ToolConfig {
                name: name.into(),
                image: None,
                command: command.into(),
                args: Vec::new(),
                timeout: 3600,
                cpu_limit: 2.0,
                memory_limit: 4096,
                network_isolated: true,
                read_only_filesystem: true,
            },
        }
    }
}

/// Builder for [`ToolConfig`]
pub struct ToolConfigBuilder {
    config: ToolConfig,
}

impl ToolConfigBuilder {
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.config.image = Some(image.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.timeout = seconds;
        self
    }

    pub fn cpu_limit(mut self, cores: f32) -> Self {
        self.config.cpu_limit = cores;
        self
    }

    pub fn memory_limit(mut self, mb: u32) -> Self {
        self.config.memory_limit = mb;
        self
    }

    pub fn network_isolated(mut self, isolated: bool) -> Self {
        self.config.network_isolated = isolated;
        self
    }

    pub fn read_only_filesystem(mut self, read_only: bool) -> Self {
        self.config.read_only_filesystem = read_only;
        self
    }

    pub fn build(self) -> ToolConfig {
        self.config
    }
}

/// Terminal outcome of one `execute()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True iff the tool exited 0 and the backend reported no error
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock duration in seconds
    pub duration: f64,
    /// Remote workspace files present at end of run, keyed by remote path
    pub output_files: HashMap<String, String>,
    /// Backend-level error message, if any
    pub error: Option<String>,
}

/// Bookkeeping entry for a live remote environment.
#[derive(Debug, Clone)]
pub struct SandboxHandle {
    /// Opaque id assigned by the backend
    pub sandbox_id: String,
    /// Scan this environment belongs to
    pub scan_id: String,
    pub created_at: DateTime<Utc>,
}

impl SandboxHandle {
    pub fn new(sandbox_id: impl Into<String>, scan_id: impl Into<String>) -> Self {
        Self {
            sandbox_id: sandbox_id.into(),
            scan_id: scan_id.into(),
            created_at: Utc::now(),
        }
    }
}
