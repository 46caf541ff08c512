// ABOUTME: Error taxonomy for sandboxed tool execution
// ABOUTME: Distinguishes configuration, timeout, and infrastructure failures so callers can branch

use thiserror::Error;

/// Main error type for sandbox operations.
///
/// A non-zero tool exit is deliberately absent here: it is not an error and
/// surfaces as `ExecutionResult { success: false, .. }` instead.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Invalid or missing provider configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Recognized but unimplemented backend
    #[error("Provider not supported: {0}")]
    NotSupported(String),

    /// The bounded run step exceeded its deadline
    #[error("Execution exceeded timeout of {seconds}s")]
    Timeout { seconds: u64 },

    /// Any other failure during create/sync/run/sync-out
    #[error("Execution failed after {duration_secs:.2}s: {message}")]
    Execution { message: String, duration_secs: f64 },

    /// Transport-level failure talking to the sandbox backend
    #[error("Sandbox API error: {0}")]
    Api(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
