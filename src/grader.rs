use crate::error::{GameError, GameResult};
use crate::judge::{
    is_supported_language, ExecutionBackend, JudgeError, MockJudge, RunOutcome, RunRequest,
    RunStatus,
};
use crate::types::*;
use std::time::Duration;

/// A code submission from a hacker-role player
#[derive(Debug, Clone)]
pub struct CodeSubmission {
    pub id: SubmissionId,
    pub player_id: PlayerId,
    pub code: String,
    pub language: String,
}

/// A free-text answer from a detective-role player
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub id: SubmissionId,
    pub player_id: PlayerId,
    pub answer: String,
}

/// Turns raw submissions into scored pass/fail results.
///
/// Compile errors, crashes and wrong output are expected outcomes and come
/// back inside the `SubmissionResult`; only bad input (empty, oversized,
/// unknown language) is an `Err`. When the backend's transport fails the run
/// is retried once and then graded by the deterministic fallback, with the
/// result flagged `degraded`.
pub struct Grader {
    backend: Box<dyn ExecutionBackend>,
    fallback: MockJudge,
    run_timeout: Duration,
}

impl Grader {
    pub fn new(backend: Box<dyn ExecutionBackend>, run_timeout: Duration) -> Self {
        Self {
            backend,
            fallback: MockJudge,
            run_timeout,
        }
    }

    /// Validate a code submission before any backend call
    pub fn validate_code(&self, code: &str, language: &str) -> GameResult<()> {
        if code.trim().is_empty() {
            return Err(GameError::Validation("code cannot be empty".to_string()));
        }
        if code.len() > MAX_CODE_CHARS {
            return Err(GameError::Validation(format!(
                "code is too long (max {MAX_CODE_CHARS} characters)"
            )));
        }
        if !is_supported_language(language) {
            return Err(GameError::Validation(format!(
                "language '{language}' is not supported"
            )));
        }
        Ok(())
    }

    pub async fn grade_code(
        &self,
        submission: &CodeSubmission,
        task: &Task,
    ) -> GameResult<SubmissionResult> {
        self.validate_code(&submission.code, &submission.language)?;

        if !task.allowed_languages.is_empty()
            && !task
                .allowed_languages
                .iter()
                .any(|l| l == &submission.language)
        {
            return Err(GameError::Validation(format!(
                "this task does not accept '{}' submissions",
                submission.language
            )));
        }

        if task.test_cases.is_empty() {
            self.grade_single_run(submission).await
        } else {
            self.grade_against_test_cases(submission, task).await
        }
    }

    /// No test cases: one run, success iff it completes cleanly
    async fn grade_single_run(&self, submission: &CodeSubmission) -> GameResult<SubmissionResult> {
        let (outcome, degraded) = self
            .run_with_fallback(self.run_request(submission, None))
            .await;

        let mut result = base_result(submission, degraded);
        match outcome.status {
            RunStatus::Completed => {
                result.success = true;
                result.score = 100;
                result.message = "Code executed successfully".to_string();
                result.output = Some(outcome.output);
            }
            RunStatus::CompilationError => {
                result.message = "Compilation Error".to_string();
                result.compilation_error = Some(outcome.output);
            }
            RunStatus::RuntimeError => {
                result.message = "Runtime Error".to_string();
                result.runtime_error = Some(outcome.output);
            }
        }
        Ok(result)
    }

    /// One run per test case, trimmed exact output comparison
    async fn grade_against_test_cases(
        &self,
        submission: &CodeSubmission,
        task: &Task,
    ) -> GameResult<SubmissionResult> {
        let mut result = base_result(submission, false);

        for case in &task.test_cases {
            let (outcome, degraded) = self
                .run_with_fallback(self.run_request(submission, Some(case.input.clone())))
                .await;
            result.degraded |= degraded;

            let actual = outcome.output.trim().to_string();
            let passed = outcome.is_clean() && actual == case.expected_output.trim();

            match outcome.status {
                RunStatus::CompilationError if result.compilation_error.is_none() => {
                    result.compilation_error = Some(outcome.output.clone());
                }
                RunStatus::RuntimeError if result.runtime_error.is_none() => {
                    result.runtime_error = Some(outcome.output.clone());
                }
                _ => {}
            }

            result.test_results.push(TestCaseResult {
                passed,
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                actual_output: actual,
                execution_time_ms: outcome.execution_time_ms,
            });
        }

        let total = result.test_results.len();
        let passed = result.test_results.iter().filter(|r| r.passed).count();

        result.success = passed == total;
        result.score = (100.0 * passed as f64 / total as f64).round() as u32;
        result.message = if result.success {
            format!("All tests passed! ({passed}/{total})")
        } else {
            format!("{passed}/{total} tests passed")
        };

        Ok(result)
    }

    /// Grade a detective puzzle answer: case-insensitive trimmed equality
    pub fn grade_answer(
        &self,
        submission: &AnswerSubmission,
        puzzle: &Puzzle,
    ) -> GameResult<SubmissionResult> {
        let answer = submission.answer.trim();
        if answer.is_empty() {
            return Err(GameError::Validation("answer cannot be empty".to_string()));
        }

        let correct = answer.eq_ignore_ascii_case(puzzle.correct_answer.trim());

        let mut result = SubmissionResult {
            submission_id: submission.id.clone(),
            player_id: submission.player_id.clone(),
            success: correct,
            score: if correct { 100 } else { 0 },
            message: String::new(),
            output: None,
            compilation_error: None,
            runtime_error: None,
            degraded: false,
            test_results: Vec::new(),
        };
        result.message = if correct {
            "Correct answer!".to_string()
        } else {
            "Incorrect. Think it over and try again.".to_string()
        };
        Ok(result)
    }

    fn run_request(&self, submission: &CodeSubmission, stdin: Option<String>) -> RunRequest {
        RunRequest {
            code: submission.code.clone(),
            language: submission.language.clone(),
            stdin,
            timeout: self.run_timeout,
        }
    }

    /// A timed-out run is graded as a runtime error. Transport failures get
    /// one retry, then the run is handed to the deterministic fallback.
    async fn run_with_fallback(&self, request: RunRequest) -> (RunOutcome, bool) {
        let first = self.backend.run(request.clone()).await;
        let retry_err = match first {
            Ok(outcome) => return (outcome, false),
            Err(JudgeError::Timeout(limit)) => return (timeout_outcome(limit), false),
            Err(e) => e,
        };

        tracing::warn!(
            "judge backend '{}' failed ({}), retrying once",
            self.backend.name(),
            retry_err
        );

        match self.backend.run(request.clone()).await {
            Ok(outcome) => (outcome, false),
            Err(JudgeError::Timeout(limit)) => (timeout_outcome(limit), false),
            Err(e) => {
                tracing::warn!("judge backend unavailable ({e}), grading via degraded fallback");
                match self.fallback.run(request).await {
                    Ok(outcome) => (outcome, true),
                    Err(e) => {
                        // The in-process fallback has no transport to fail,
                        // but don't let a surprise take the session down.
                        tracing::error!("fallback judge failed: {e}");
                        (
                            RunOutcome {
                                status: RunStatus::RuntimeError,
                                output: "execution service unavailable".to_string(),
                                execution_time_ms: 0,
                                memory_kb: 0,
                            },
                            true,
                        )
                    }
                }
            }
        }
    }
}

fn base_result(submission: &CodeSubmission, degraded: bool) -> SubmissionResult {
    SubmissionResult {
        submission_id: submission.id.clone(),
        player_id: submission.player_id.clone(),
        success: false,
        score: 0,
        message: String::new(),
        output: None,
        compilation_error: None,
        runtime_error: None,
        degraded,
        test_results: Vec::new(),
    }
}

fn timeout_outcome(limit: Duration) -> RunOutcome {
    RunOutcome {
        status: RunStatus::RuntimeError,
        output: format!("execution timed out after {}s", limit.as_secs()),
        execution_time_ms: limit.as_millis() as u64,
        memory_kb: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Backend whose transport always fails, for exercising the fallback
    #[derive(Debug)]
    struct DownBackend;

    #[async_trait]
    impl ExecutionBackend for DownBackend {
        async fn run(&self, _request: RunRequest) -> JudgeResult<RunOutcome> {
            Err(JudgeError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    /// Backend that always times out
    #[derive(Debug)]
    struct SlowBackend;

    #[async_trait]
    impl ExecutionBackend for SlowBackend {
        async fn run(&self, request: RunRequest) -> JudgeResult<RunOutcome> {
            Err(JudgeError::Timeout(request.timeout))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn mock_grader() -> Grader {
        Grader::new(Box::new(MockJudge), Duration::from_secs(5))
    }

    fn code_submission(code: &str) -> CodeSubmission {
        CodeSubmission {
            id: "s1".to_string(),
            player_id: "p1".to_string(),
            code: code.to_string(),
            language: "python".to_string(),
        }
    }

    fn task_with_cases(cases: &[(&str, &str)]) -> Task {
        Task {
            id: "t1".to_string(),
            title: "Sum".to_string(),
            prompt: "add the two numbers".to_string(),
            boilerplate: None,
            difficulty: Difficulty::Medium,
            level: None,
            hints: Vec::new(),
            test_cases: cases
                .iter()
                .map(|(input, expected)| TestCase {
                    input: input.to_string(),
                    expected_output: expected.to_string(),
                })
                .collect(),
            allowed_languages: Vec::new(),
        }
    }

    fn puzzle(answer: &str) -> Puzzle {
        Puzzle {
            id: "pz1".to_string(),
            title: "The Breach".to_string(),
            question: "what attack was used?".to_string(),
            correct_answer: answer.to_string(),
            difficulty: Difficulty::Medium,
            hints: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_all_cases_pass_scores_100() {
        let grader = mock_grader();
        let task = task_with_cases(&[("2,3", "5"), ("10,1", "11")]);
        let submission = code_submission("map:2,3=>5\nmap:10,1=>11");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(result.success);
        assert_eq!(result.score, 100);
        assert_eq!(result.message, "All tests passed! (2/2)");
        assert!(result.test_results.iter().all(|r| r.passed));
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_one_failing_case_rounds_score() {
        let grader = mock_grader();
        let task = task_with_cases(&[("1", "1"), ("2", "2"), ("3", "wrong")]);
        // Echoes stdin, so the third expectation cannot match
        let submission = code_submission("def solution(): pass");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.score, 67); // round(100 * 2/3)
        assert_eq!(result.message, "2/3 tests passed");
        assert_eq!(result.test_results[2].actual_output, "3");
    }

    #[tokio::test]
    async fn test_compilation_error_fails_all_cases() {
        let grader = mock_grader();
        let task = task_with_cases(&[("1", "1")]);
        let submission = code_submission("fail:compile");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.score, 0);
        assert!(result.compilation_error.is_some());
    }

    #[tokio::test]
    async fn test_no_test_cases_clean_run_succeeds() {
        let grader = mock_grader();
        let task = task_with_cases(&[]);
        let submission = code_submission("out:done");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(result.success);
        assert_eq!(result.score, 100);
        assert_eq!(result.output.as_deref(), Some("done"));
        assert!(result.test_results.is_empty());
    }

    #[tokio::test]
    async fn test_no_test_cases_runtime_error_fails() {
        let grader = mock_grader();
        let task = task_with_cases(&[]);
        let submission = code_submission("fail:runtime");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(!result.success);
        assert!(result.runtime_error.is_some());
        assert_eq!(result.message, "Runtime Error");
    }

    #[tokio::test]
    async fn test_empty_code_is_rejected() {
        let grader = mock_grader();
        let task = task_with_cases(&[]);
        let submission = code_submission("   \n  ");

        let err = grader.grade_code(&submission, &task).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_oversized_code_is_rejected() {
        let grader = mock_grader();
        let task = task_with_cases(&[]);
        let submission = code_submission(&"x".repeat(MAX_CODE_CHARS + 1));

        let err = grader.grade_code(&submission, &task).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_unsupported_language_is_rejected() {
        let grader = mock_grader();
        let task = task_with_cases(&[]);
        let mut submission = code_submission("out:fine");
        submission.language = "brainfuck".to_string();

        let err = grader.grade_code(&submission, &task).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_task_language_allowlist() {
        let grader = mock_grader();
        let mut task = task_with_cases(&[]);
        task.allowed_languages = vec!["rust".to_string()];
        let submission = code_submission("out:fine"); // python

        let err = grader.grade_code(&submission, &task).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_transport_failure_retries_then_degrades() {
        let grader = Grader::new(Box::new(DownBackend), Duration::from_secs(5));
        let task = task_with_cases(&[("2,3", "5")]);
        let submission = code_submission("map:2,3=>5");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        // The fallback understands the directive, so grading still works,
        // but the result must be labeled as degraded.
        assert!(result.degraded);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_transport_failure_retries_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));

        #[derive(Debug)]
        struct CountingBackend(Arc<AtomicU32>);

        #[async_trait]
        impl ExecutionBackend for CountingBackend {
            async fn run(&self, _request: RunRequest) -> JudgeResult<RunOutcome> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(JudgeError::Transport("connection refused".to_string()))
            }

            fn name(&self) -> &str {
                "counting"
            }
        }

        let grader = Grader::new(
            Box::new(CountingBackend(calls.clone())),
            Duration::from_secs(5),
        );
        let task = task_with_cases(&[]);
        let submission = code_submission("out:ok");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(result.degraded);
        assert_eq!(calls.load(Ordering::SeqCst), 2); // initial attempt + one retry
    }

    #[tokio::test]
    async fn test_timeout_becomes_runtime_error_not_degraded() {
        let grader = Grader::new(Box::new(SlowBackend), Duration::from_secs(5));
        let task = task_with_cases(&[]);
        let submission = code_submission("out:never");

        let result = grader.grade_code(&submission, &task).await.unwrap();
        assert!(!result.success);
        assert!(!result.degraded);
        assert!(result
            .runtime_error
            .as_deref()
            .is_some_and(|e| e.contains("timed out")));
    }

    #[tokio::test]
    async fn test_puzzle_answer_case_insensitive_trimmed() {
        let grader = mock_grader();
        let pz = puzzle("SQL Injection");

        let right = AnswerSubmission {
            id: "s1".to_string(),
            player_id: "p1".to_string(),
            answer: "  sql injection  ".to_string(),
        };
        let result = grader.grade_answer(&right, &pz).unwrap();
        assert!(result.success);
        assert_eq!(result.score, 100);

        let wrong = AnswerSubmission {
            id: "s2".to_string(),
            player_id: "p1".to_string(),
            answer: "xss".to_string(),
        };
        let result = grader.grade_answer(&wrong, &pz).unwrap();
        assert!(!result.success);
        assert_eq!(result.score, 0);
    }

    #[tokio::test]
    async fn test_empty_answer_is_rejected() {
        let grader = mock_grader();
        let pz = puzzle("anything");
        let submission = AnswerSubmission {
            id: "s1".to_string(),
            player_id: "p1".to_string(),
            answer: "   ".to_string(),
        };

        let err = grader.grade_answer(&submission, &pz).unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }
}
