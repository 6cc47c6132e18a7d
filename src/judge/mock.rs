use super::*;

/// Deterministic in-process judge, used as the test double and as the
/// grader's degraded fallback when the remote judge is unreachable.
///
/// It "executes" a tiny directive language instead of real code:
///
/// - `fail:compile` anywhere in the code fails compilation
/// - `fail:runtime` crashes at runtime
/// - `map:<stdin>=><stdout>` lines answer a matching trimmed stdin
/// - `out:<text>` is the output when no mapping matches
///
/// Anything else echoes its stdin. The same code and input always produce
/// the same outcome.
#[derive(Debug)]
pub struct MockJudge;

impl MockJudge {
    fn evaluate(code: &str, stdin: Option<&str>) -> (RunStatus, String) {
        if code.contains("fail:compile") {
            return (
                RunStatus::CompilationError,
                "mock judge: syntax error near directive".to_string(),
            );
        }
        if code.contains("fail:runtime") {
            return (
                RunStatus::RuntimeError,
                "mock judge: panic during execution".to_string(),
            );
        }

        let stdin = stdin.unwrap_or("").trim();

        for line in code.lines() {
            let line = line.trim();
            if let Some(mapping) = line.strip_prefix("map:") {
                if let Some((input, output)) = mapping.split_once("=>") {
                    if input.trim() == stdin {
                        return (RunStatus::Completed, output.trim().to_string());
                    }
                }
            }
        }

        if let Some(fixed) = code
            .lines()
            .find_map(|line| line.trim().strip_prefix("out:"))
        {
            return (RunStatus::Completed, fixed.trim().to_string());
        }

        (RunStatus::Completed, stdin.to_string())
    }
}

#[async_trait]
impl ExecutionBackend for MockJudge {
    async fn run(&self, request: RunRequest) -> JudgeResult<RunOutcome> {
        let (status, output) = Self::evaluate(&request.code, request.stdin.as_deref());

        // Deterministic pseudo-metrics so callers can still display something
        let execution_time_ms = 10 + (request.code.len() as u64 % 90);
        let memory_kb = 512 + (request.code.len() as u64 % 2048);

        Ok(RunOutcome {
            status,
            output,
            execution_time_ms,
            memory_kb,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
