mod mock;
mod remote;

use async_trait::async_trait;
use std::time::Duration;

pub use mock::MockJudge;
pub use remote::RemoteJudge;

/// Result type for execution backend operations
pub type JudgeResult<T> = Result<T, JudgeError>;

/// Errors that can occur while talking to an execution backend.
///
/// These cover the transport only. A program that compiles badly or crashes
/// is a successful judge call and comes back as a [`RunOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(String),

    #[error("judge did not answer within {0:?}")]
    Timeout(Duration),

    #[error("invalid judge configuration: {0}")]
    Config(String),

    #[error("judge response could not be parsed: {0}")]
    Parse(String),
}

/// A single run of submitted code
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    pub stdin: Option<String>,
    /// Overdue runs are cut off and reported as [`JudgeError::Timeout`]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    CompilationError,
    RuntimeError,
}

/// What the backend observed for one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub output: String,
    pub execution_time_ms: u64,
    pub memory_kb: u64,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Trait that all execution backends must implement
#[async_trait]
pub trait ExecutionBackend: Send + Sync + std::fmt::Debug {
    /// Compile and run the submitted code, feeding `stdin` if present
    async fn run(&self, request: RunRequest) -> JudgeResult<RunOutcome>;

    /// Get the name of this backend
    fn name(&self) -> &str;
}

/// Languages accepted for code submissions, mirroring the remote judge's table
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "javascript",
    "python",
    "java",
    "cpp",
    "c",
    "csharp",
    "go",
    "rust",
    "kotlin",
    "swift",
];

pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language)
}

/// Configuration for execution backends
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Which backend to build: "remote" or "mock"
    pub provider: String,
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Per-run timeout, clamped to 1..=30 seconds
    pub run_timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: "remote".to_string(),
            base_url: "https://api.jdoodle.com/v1".to_string(),
            client_id: None,
            client_secret: None,
            run_timeout: Duration::from_secs(5),
        }
    }
}

impl JudgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider = std::env::var("JUDGE_PROVIDER")
            .ok()
            .and_then(|v| {
                let trimmed = v.trim().to_lowercase();
                (!trimmed.is_empty()).then_some(trimmed)
            })
            .unwrap_or(defaults.provider);

        let base_url = std::env::var("JUDGE_BASE_URL")
            .ok()
            .and_then(|v| {
                let trimmed = v.trim();
                (!trimmed.is_empty()).then(|| trimmed.trim_end_matches('/').to_string())
            })
            .unwrap_or(defaults.base_url);

        let client_id = std::env::var("JUDGE_CLIENT_ID").ok().and_then(|v| {
            let trimmed = v.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let client_secret = std::env::var("JUDGE_CLIENT_SECRET").ok().and_then(|v| {
            let trimmed = v.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let run_timeout = std::env::var("JUDGE_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.clamp(1, 30)))
            .unwrap_or(defaults.run_timeout);

        Self {
            provider,
            base_url,
            client_id,
            client_secret,
            run_timeout,
        }
    }

    /// Build the configured backend
    pub fn build_backend(&self) -> JudgeResult<Box<dyn ExecutionBackend>> {
        match self.provider.as_str() {
            "mock" => Ok(Box::new(MockJudge)),
            "remote" => {
                let client_id = self.client_id.clone().ok_or_else(|| {
                    JudgeError::Config("JUDGE_CLIENT_ID is required for the remote judge".into())
                })?;
                let client_secret = self.client_secret.clone().ok_or_else(|| {
                    JudgeError::Config("JUDGE_CLIENT_SECRET is required for the remote judge".into())
                })?;
                Ok(Box::new(RemoteJudge::new(
                    self.base_url.clone(),
                    client_id,
                    client_secret,
                )))
            }
            other => Err(JudgeError::Config(format!(
                "unknown judge provider '{other}', expected 'remote' or 'mock'"
            ))),
        }
    }
}
