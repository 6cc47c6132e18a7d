use super::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Language table for the remote execute API: (api language name, version index)
const LANGUAGE_VERSIONS: &[(&str, &str, &str)] = &[
    ("javascript", "nodejs", "4"),
    ("python", "python3", "4"),
    ("java", "java", "4"),
    ("cpp", "cpp17", "1"),
    ("c", "c", "5"),
    ("csharp", "csharp", "4"),
    ("go", "go", "4"),
    ("rust", "rust", "4"),
    ("kotlin", "kotlin", "2"),
    ("swift", "swift", "4"),
];

/// Remote judge provider, speaking a JDoodle-style execute API
#[derive(Debug)]
pub struct RemoteJudge {
    base_url: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
}

impl RemoteJudge {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        Self {
            base_url,
            client_id,
            client_secret,
            client,
        }
    }

    fn language_config(language: &str) -> Option<(&'static str, &'static str)> {
        LANGUAGE_VERSIONS
            .iter()
            .find(|(name, _, _)| *name == language)
            .map(|(_, api_name, version)| (*api_name, *version))
    }

    /// The API reports cpu time as fractional seconds, e.g. "0.12"
    fn parse_cpu_time_ms(cpu_time: Option<&str>, fallback_ms: u64) -> u64 {
        cpu_time
            .and_then(|t| t.trim().parse::<f64>().ok())
            .map(|secs| (secs * 1000.0) as u64)
            .unwrap_or(fallback_ms)
    }

    fn parse_memory_kb(memory: Option<&str>) -> u64 {
        memory
            .and_then(|m| m.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    script: &'a str,
    language: &'a str,
    version_index: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    #[serde(default)]
    output: String,
    status_code: i32,
    #[serde(default)]
    memory: Option<String>,
    #[serde(default)]
    cpu_time: Option<String>,
    #[serde(default)]
    compilation_status: Option<i32>,
}

#[async_trait]
impl ExecutionBackend for RemoteJudge {
    async fn run(&self, request: RunRequest) -> JudgeResult<RunOutcome> {
        let start = Instant::now();

        let (language, version_index) =
            Self::language_config(&request.language).ok_or_else(|| {
                JudgeError::Config(format!(
                    "language '{}' is not in the judge's table",
                    request.language
                ))
            })?;

        let execute_request = ExecuteRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            script: &request.code,
            language,
            version_index,
            stdin: request.stdin.as_deref(),
        };

        let url = format!("{}/execute", self.base_url);

        let response = tokio::time::timeout(
            request.timeout,
            self.client.post(&url).json(&execute_request).send(),
        )
        .await
        .map_err(|_| JudgeError::Timeout(request.timeout))?
        .map_err(|e| JudgeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JudgeError::Transport(format!(
                "judge API returned status: {}",
                response.status()
            )));
        }

        let execute_response: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::Parse(e.to_string()))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        // 200 is a clean run. Anything else is the program's fault: the API
        // flags compile failures via compilationStatus, the rest crashed.
        let status = if execute_response.status_code == 200 {
            RunStatus::Completed
        } else if execute_response.compilation_status.is_some_and(|s| s != 0) {
            RunStatus::CompilationError
        } else {
            RunStatus::RuntimeError
        };

        Ok(RunOutcome {
            status,
            output: execute_response.output,
            execution_time_ms: Self::parse_cpu_time_ms(
                execute_response.cpu_time.as_deref(),
                elapsed_ms,
            ),
            memory_kb: Self::parse_memory_kb(execute_response.memory.as_deref()),
        })
    }

    fn name(&self) -> &str {
        "remote"
    }
}
