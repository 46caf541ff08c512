// ABOUTME: E2B cloud sandbox provider for isolated security tool execution
// ABOUTME: One ephemeral sandbox per run: create, sync, execute under deadline, always tear down

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::SandboxProvider;
use crate::error::{Result, SandboxError};
use crate::types::{ExecutionResult, SandboxHandle, ToolConfig};

const DEFAULT_API_ENDPOINT: &str = "https://api.e2b.dev";

/// Remote directory tools read inputs from and write results to
pub const WORKSPACE_ROOT: &str = "/workspace";

/// Marker the generated script appends to stderr to carry the exit code out
/// of a backend that has no native exit-code channel
const EXIT_CODE_MARKER: &str = "__E2B_EXIT_CODE__=";

/// Bounded connect only: the run step is deadlined per call, and teardown
/// must be allowed to finish
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CreateSandboxRequest<'a> {
    #[serde(rename = "templateID", skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreateSandboxResponse {
    #[serde(rename = "sandboxID")]
    sandbox_id: String,
}

#[derive(Serialize)]
struct RunCodeRequest<'a> {
    code: &'a str,
}

/// Output of one backend code execution. The backend streams stdout/stderr
/// as chunk lists; `error` is a backend-level failure, not a tool exit code.
#[derive(Debug, Deserialize)]
struct RunCodeResponse {
    #[serde(default)]
    stdout: Vec<String>,
    #[serde(default)]
    stderr: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// E2B cloud sandbox provider.
///
/// Creates one ephemeral sandbox per `execute()` call and tears it down on
/// every exit path, including timeouts. The active-sandbox registry maps
/// scan ids to live environments so `cleanup()` can release them explicitly.
#[derive(Debug)]
pub struct E2bProvider {
    client: reqwest::Client,
    api_endpoint: String,
    api_key: String,
    template_id: Option<String>,
    active_sandboxes: Arc<RwLock<HashMap<String, SandboxHandle>>>,
}

impl E2bProvider {
    /// Create a provider against the public E2B API.
    pub fn new(api_key: String, template_id: Option<String>) -> Result<Self> {
        Self::with_endpoint(api_key, template_id, DEFAULT_API_ENDPOINT)
    }

    /// Create a provider against a custom endpoint (self-hosted or test).
    pub fn with_endpoint(
        api_key: String,
        template_id: Option<String>,
        api_endpoint: impl Into<String>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(SandboxError::Configuration(
                "E2B API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SandboxError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_endpoint: api_endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            template_id,
            active_sandboxes: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Whether a live environment is still tracked for `scan_id`.
    pub async fn has_active_sandbox(&self, scan_id: &str) -> bool {
        self.active_sandboxes.read().await.contains_key(scan_id)
    }

    async fn create_sandbox(&self) -> Result<String> {
        let url = format!("{}/sandboxes", self.api_endpoint);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&CreateSandboxRequest {
                template_id: self.template_id.as_deref(),
            })
            .send()
            .await
            .map_err(|e| SandboxError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SandboxError::Api(format!(
                "sandbox creation failed with status {}",
                response.status()
            )));
        }

        let created: CreateSandboxResponse = response
            .json()
            .await
            .map_err(|e| SandboxError::Api(e.to_string()))?;

        Ok(created.sandbox_id)
    }

    async fn run_code(&self, sandbox_id: &str, code: &str) -> Result<RunCodeResponse> {
        let url = format!("{}/sandboxes/{}/code", self.api_endpoint, sandbox_id);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(&RunCodeRequest { code })
            .send()
            .await
            .map_err(|e| SandboxError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SandboxError::Api(format!(
                "code execution failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SandboxError::Api(e.to_string()))
    }

    async fn kill_sandbox(&self, sandbox_id: &str) -> Result<()> {
        let url = format!("{}/sandboxes/{}", self.api_endpoint, sandbox_id);
        let response = self
            .client
            .delete(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| SandboxError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SandboxError::Api(format!(
                "sandbox kill failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Sync-in, run under deadline, sync-out. Teardown is the caller's job
    /// so it also happens on the error paths.
    async fn run_in_sandbox(
        &self,
        sandbox_id: &str,
        config: &ToolConfig,
        workspace_dir: &Path,
        started: Instant,
    ) -> Result<ExecutionResult> {
        self.ensure_workspace(sandbox_id).await?;

        let script = build_command_script(config);
        debug!(
            "Executing command: {} {}",
            config.command,
            config.args.join(" ")
        );

        let deadline = Duration::from_secs(config.timeout);
        let execution =
            match tokio::time::timeout(deadline, self.run_code(sandbox_id, &script)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(SandboxError::Timeout {
                        seconds: config.timeout,
                    })
                }
            };

        let output_files = self.download_workspace(sandbox_id, workspace_dir).await;

        let duration = started.elapsed().as_secs_f64();
        let stdout = execution.stdout.concat();
        let mut stderr = execution.stderr.concat();

        if let Some(backend_error) = &execution.error {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(backend_error);
        }

        let (parsed_exit, stderr) = parse_exit_code(&stderr);
        let exit_code = parsed_exit.unwrap_or(0);
        let success = execution.error.is_none() && exit_code == 0;

        info!(
            "{} completed in {:.2}s (exit_code: {})",
            config.name, duration, exit_code
        );

        Ok(ExecutionResult {
            success,
            exit_code,
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            duration,
            output_files,
            error: execution.error,
        })
    }

    /// Make sure the remote workspace root exists before the tool runs.
    ///
    /// Bulk upload is intentionally not implemented here: callers stage
    /// input files with their own file-write calls beforehand.
    async fn ensure_workspace(&self, sandbox_id: &str) -> Result<()> {
        let code = format!(
            "import os\nos.makedirs('{}', exist_ok=True)\n",
            WORKSPACE_ROOT
        );
        self.run_code(sandbox_id, &code).await?;
        debug!("Workspace directory created in sandbox {}", sandbox_id);
        Ok(())
    }

    /// Download every regular file under the remote workspace root.
    ///
    /// Best-effort per file: a failed remote read or local write is logged
    /// and skipped, never aborting the rest of the sync.
    async fn download_workspace(
        &self,
        sandbox_id: &str,
        workspace_dir: &Path,
    ) -> HashMap<String, String> {
        let mut output_files = HashMap::new();

        let list_code = format!(
            "import os\nif os.path.exists('{root}'):\n    for f in sorted(os.listdir('{root}')):\n        if os.path.isfile(os.path.join('{root}', f)):\n            print(f)\n",
            root = WORKSPACE_ROOT
        );

        let listing = match self.run_code(sandbox_id, &list_code).await {
            Ok(execution) => execution.stdout.concat(),
            Err(e) => {
                warn!("Failed to list workspace files: {}", e);
                return output_files;
            }
        };

        for filename in listing.lines().map(str::trim).filter(|f| !f.is_empty()) {
            let remote_path = format!("{}/{}", WORKSPACE_ROOT, filename);
            let read_code = format!(
                "with open('{}', 'r') as f:\n    print(f.read(), end='')\n",
                remote_path
            );

            let content = match self.run_code(sandbox_id, &read_code).await {
                Ok(execution) => execution.stdout.concat(),
                Err(e) => {
                    warn!("Failed to download {}: {}", remote_path, e);
                    continue;
                }
            };

            let local_path = workspace_dir.join(filename);
            if let Err(e) = tokio::fs::write(&local_path, &content).await {
                warn!(
                    "Failed to write local copy {}: {}",
                    local_path.display(),
                    e
                );
            }

            debug!("Downloaded {} ({} bytes)", remote_path, content.len());
            output_files.insert(remote_path, content);
        }

        output_files
    }

    /// Tear the environment down and drop its registry entry. Failures are
    /// logged, never propagated: they must not mask the run's real outcome.
    async fn teardown(&self, sandbox_id: &str, scan_id: &str) {
        match self.kill_sandbox(sandbox_id).await {
            Ok(()) => info!("E2B sandbox killed: {}", sandbox_id),
            Err(e) => warn!("Failed to kill sandbox {}: {}", sandbox_id, e),
        }

        self.active_sandboxes.write().await.remove(scan_id);
    }

    async fn probe(&self) -> Result<bool> {
        let sandbox_id = self.create_sandbox().await?;
        let execution = self.run_code(&sandbox_id, "print('health check OK')").await;

        if let Err(e) = self.kill_sandbox(&sandbox_id).await {
            warn!("Failed to kill probe sandbox {}: {}", sandbox_id, e);
        }

        Ok(execution?.error.is_none())
    }
}

#[async_trait]
impl SandboxProvider for E2bProvider {
    async fn execute(
        &self,
        config: &ToolConfig,
        workspace_dir: &Path,
        scan_id: &str,
    ) -> Result<ExecutionResult> {
        info!("Executing {} in E2B sandbox (scan: {})", config.name, scan_id);
        let started = Instant::now();

        let sandbox_id = match self.create_sandbox().await {
            Ok(id) => id,
            Err(e) => return Err(execution_error(&config.name, started, e)),
        };

        {
            let mut active = self.active_sandboxes.write().await;
            active.insert(
                scan_id.to_string(),
                SandboxHandle::new(sandbox_id.as_str(), scan_id),
            );
        }

        info!("E2B sandbox created: {}", sandbox_id);

        let outcome = self
            .run_in_sandbox(&sandbox_id, config, workspace_dir, started)
            .await;

        // Runs on every exit path once the sandbox exists
        self.teardown(&sandbox_id, scan_id).await;

        match outcome {
            Ok(result) => Ok(result),
            Err(SandboxError::Timeout { seconds }) => {
                error!(
                    "{} timed out after {:.2}s (limit: {}s)",
                    config.name,
                    started.elapsed().as_secs_f64(),
                    seconds
                );
                Err(SandboxError::Timeout { seconds })
            }
            Err(e) => Err(execution_error(&config.name, started, e)),
        }
    }

    async fn cleanup(&self, scan_id: &str) -> Result<()> {
        let handle = self.active_sandboxes.write().await.remove(scan_id);

        if let Some(handle) = handle {
            match self.kill_sandbox(&handle.sandbox_id).await {
                Ok(()) => info!("Cleaned up E2B sandbox for scan {}", scan_id),
                Err(e) => warn!("Failed to cleanup sandbox for scan {}: {}", scan_id, e),
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self.probe().await {
            Ok(healthy) => healthy,
            Err(e) => {
                error!("E2B health check failed: {}", e);
                false
            }
        }
    }
}

/// Wrap an infrastructure failure with tool name and elapsed time.
/// Timeouts pass through unwrapped so callers can branch on them.
fn execution_error(tool: &str, started: Instant, err: SandboxError) -> SandboxError {
    match err {
        SandboxError::Timeout { .. } => err,
        other => {
            let duration_secs = started.elapsed().as_secs_f64();
            error!("{} failed after {:.2}s: {}", tool, duration_secs, other);
            SandboxError::Execution {
                message: other.to_string(),
                duration_secs,
            }
        }
    }
}

/// Generate the Python wrapper the backend runs.
///
/// The backend executes interpreted code rather than a raw shell and exposes
/// no native exit-code channel, so the wrapper runs the tool as a
/// subprocess, re-prints its output verbatim, and appends the exit code to
/// stderr as a sentinel line the provider strips back out.
fn build_command_script(config: &ToolConfig) -> String {
    let mut argv = Vec::with_capacity(config.args.len() + 1);
    argv.push(config.command.clone());
    argv.extend(config.args.iter().cloned());

    // A JSON string array is also a valid Python list literal, which
    // handles quoting for arbitrary arguments
    let argv_literal = serde_json::Value::from(argv).to_string();

    format!(
        r#"import subprocess
import sys

result = subprocess.run(
    {argv_literal},
    capture_output=True,
    text=True,
    timeout={timeout},
)

if result.stdout:
    print(result.stdout, end="")
if result.stderr:
    print(result.stderr, end="", file=sys.stderr)

print(f"{marker}{{result.returncode}}", file=sys.stderr)
"#,
        argv_literal = argv_literal,
        timeout = config.timeout,
        marker = EXIT_CODE_MARKER,
    )
}

/// Pull the sentinel exit code out of stderr and strip the marker so it is
/// never visible to callers. Returns `None` when no sentinel is present.
fn parse_exit_code(stderr: &str) -> (Option<i32>, String) {
    let Some(start) = stderr.find(EXIT_CODE_MARKER) else {
        return (None, stderr.to_string());
    };

    let digits_start = start + EXIT_CODE_MARKER.len();
    let digits: String = stderr[digits_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return (None, stderr.to_string());
    }

    let mut cleaned = String::with_capacity(stderr.len());
    cleaned.push_str(&stderr[..start]);
    cleaned.push_str(&stderr[digits_start + digits.len()..]);

    (digits.parse().ok(), cleaned)
}
