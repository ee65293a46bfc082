//! Judge panel execution
//!
//! One exercise at a time, all judges concurrently. Each judge gets its own
//! fresh presentation order, a bounded retry budget, and a failure scope of
//! exactly one (exercise, judge) pair: a dead judge never cancels its
//! siblings or later exercises.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;

use crate::config::EvaluationConfig;
use crate::exercises::{Exercise, Language};
use crate::judges::{CompletionRequest, JudgeBackend, JudgeError, Message};
use crate::ranking::{build_ranking_prompt, Presentation, RawVerdict};

/// Configuration for the panel
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Attempts per judge call before giving up
    pub retry_budget: u32,
    /// Base delay; attempt N waits N times this
    pub retry_delay_ms: u64,
    /// Pause between exercises
    pub inter_call_delay_ms: u64,
    pub timeout_ms: u64,
    pub max_output_tokens: u32,
    pub temperature: Option<f32>,
}

impl PanelConfig {
    pub fn from_evaluation(eval: &EvaluationConfig) -> Self {
        Self {
            retry_budget: eval.retry_budget.max(1),
            retry_delay_ms: eval.retry_delay_ms,
            inter_call_delay_ms: eval.inter_call_delay_ms,
            timeout_ms: eval.timeout_ms,
            max_output_tokens: eval.max_output_tokens,
            temperature: eval.temperature,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::from_evaluation(&EvaluationConfig::default())
    }
}

/// Terminal status of one judge call
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Error,
    Timeout,
    RateLimited,
}

/// Result of one judge call for one exercise, before verdict parsing
#[derive(Debug, Clone)]
pub struct JudgeCallResult {
    pub judge: String,
    pub presentation: Presentation,
    pub status: CallStatus,
    pub verdict: Option<RawVerdict>,
    pub error_message: Option<String>,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

impl JudgeCallResult {
    fn success(
        judge: String,
        presentation: Presentation,
        verdict: RawVerdict,
        attempts: u32,
    ) -> Self {
        Self {
            judge,
            presentation,
            status: CallStatus::Success,
            verdict: Some(verdict),
            error_message: None,
            attempts,
            timestamp: Utc::now(),
        }
    }

    fn failure(
        judge: String,
        presentation: Presentation,
        status: CallStatus,
        error: String,
        attempts: u32,
    ) -> Self {
        Self {
            judge,
            presentation,
            status,
            verdict: None,
            error_message: Some(error),
            attempts,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }
}

/// Panel of judges ranking candidate solutions
pub struct JudgePanel {
    judges: Vec<Arc<dyn JudgeBackend + Send + Sync>>,
    config: PanelConfig,
}

impl JudgePanel {
    pub fn new(judges: Vec<Arc<dyn JudgeBackend + Send + Sync>>, config: PanelConfig) -> Self {
        Self { judges, config }
    }

    pub fn judge_names(&self) -> Vec<String> {
        self.judges.iter().map(|j| j.name().to_string()).collect()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Run every judge on one exercise concurrently. A fresh presentation is
    /// drawn per judge so positional bias cancels across repeated trials.
    pub async fn run_exercise(&self, exercise: &Exercise, languages: &[Language]) -> Vec<JudgeCallResult> {
        let mut handles = Vec::new();

        for judge in &self.judges {
            let judge = judge.clone();
            let config = self.config.clone();
            let presentation = Presentation::shuffled(&mut rand::thread_rng(), languages);
            let prompt = build_ranking_prompt(exercise, &presentation);
            let exercise_index = exercise.index;

            handles.push(tokio::spawn(async move {
                call_judge_with_retry(judge, config, exercise_index, presentation, prompt).await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Judge call panicked: {}", e);
                }
            }
        }

        results
    }

    /// Pause between exercises
    pub async fn inter_exercise_delay(&self) {
        if self.config.inter_call_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.inter_call_delay_ms)).await;
        }
    }
}

/// One judge, one exercise: bounded retries, then a permanent failure
async fn call_judge_with_retry(
    judge: Arc<dyn JudgeBackend + Send + Sync>,
    config: PanelConfig,
    exercise_index: usize,
    presentation: Presentation,
    prompt: String,
) -> JudgeCallResult {
    let judge_name = judge.name().to_string();

    let mut request =
        CompletionRequest::new(vec![Message::user(prompt)], config.max_output_tokens);
    if let Some(temp) = config.temperature {
        request = request.with_temperature(temp);
    }

    let timeout = Duration::from_millis(config.timeout_ms);
    let mut last_error: Option<JudgeError> = None;

    for attempt in 1..=config.retry_budget {
        if attempt > 1 {
            let delay = config.retry_delay_ms * (attempt as u64 - 1);
            tracing::info!(
                "Retry {} for exercise {} on {} in {}ms",
                attempt,
                exercise_index,
                judge_name,
                delay
            );
            sleep(Duration::from_millis(delay)).await;
        }

        let outcome = match tokio::time::timeout(timeout, judge.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(JudgeError::Timeout {
                timeout_ms: config.timeout_ms,
            }),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    "{} answered exercise {} in {}ms ({} in / {} out tokens)",
                    judge_name,
                    exercise_index,
                    response.latency_ms,
                    response.input_tokens,
                    response.output_tokens
                );
                let verdict = RawVerdict {
                    judge: judge_name.clone(),
                    exercise_index,
                    text: response.content.trim().to_string(),
                };
                return JudgeCallResult::success(judge_name, presentation, verdict, attempt);
            }
            Err(JudgeError::RateLimited { retry_after_ms }) => {
                tracing::warn!(
                    "Rate limited on {} for exercise {}, waiting {}ms",
                    judge_name,
                    exercise_index,
                    retry_after_ms
                );
                sleep(Duration::from_millis(retry_after_ms)).await;
                last_error = Some(JudgeError::RateLimited { retry_after_ms });
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    "Transient error on {} for exercise {}: {}",
                    judge_name,
                    exercise_index,
                    e
                );
                last_error = Some(e);
            }
            Err(e) => {
                // Permanent: skip this judge for this exercise, keep the rest
                tracing::error!(
                    "Error on {} for exercise {}: {}",
                    judge_name,
                    exercise_index,
                    e
                );
                return JudgeCallResult::failure(
                    judge_name,
                    presentation,
                    CallStatus::Error,
                    e.to_string(),
                    attempt,
                );
            }
        }
    }

    let status = match &last_error {
        Some(JudgeError::RateLimited { .. }) => CallStatus::RateLimited,
        Some(JudgeError::Timeout { .. }) => CallStatus::Timeout,
        _ => CallStatus::Error,
    };
    JudgeCallResult::failure(
        judge_name,
        presentation,
        status,
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string()),
        config.retry_budget,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judges::{CompletionResponse, JudgeResult};
    use crate::runner::rate_limiter::RateLimiter;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedJudge {
        name: String,
        rate_limiter: Arc<RateLimiter>,
        calls: AtomicU32,
        /// Rate-limit errors to emit before the first success
        fail_times: u32,
        reply: String,
    }

    impl ScriptedJudge {
        fn new(name: &str, fail_times: u32, reply: &str) -> Self {
            Self {
                name: name.to_string(),
                rate_limiter: Arc::new(RateLimiter::new(1000)),
                calls: AtomicU32::new(0),
                fail_times,
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl JudgeBackend for ScriptedJudge {
        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: &CompletionRequest) -> JudgeResult<CompletionResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                return Err(JudgeError::RateLimited { retry_after_ms: 1 });
            }
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                input_tokens: 10,
                output_tokens: 10,
                latency_ms: 1,
            })
        }

        fn rate_limiter(&self) -> &Arc<RateLimiter> {
            &self.rate_limiter
        }
    }

    fn quick_config() -> PanelConfig {
        PanelConfig {
            retry_budget: 3,
            retry_delay_ms: 1,
            inter_call_delay_ms: 0,
            timeout_ms: 5_000,
            max_output_tokens: 256,
            temperature: None,
        }
    }

    fn sample_exercise() -> Exercise {
        let mut solutions = IndexMap::new();
        for lang in Language::all() {
            solutions.insert(lang, format!("solution in {}", lang));
        }
        Exercise {
            index: 0,
            topic_area: "Arithmetic".to_string(),
            topic: "Addition".to_string(),
            progress_level: crate::exercises::ProgressLevel::B,
            text: "1 + 1".to_string(),
            solutions,
            technical_terms: IndexMap::new(),
        }
    }

    #[tokio::test]
    async fn test_all_judges_report_independently() {
        let judges: Vec<Arc<dyn JudgeBackend + Send + Sync>> = vec![
            Arc::new(ScriptedJudge::new("alpha", 0, "**Ranking:** [en: 1, de: 2, ar: 3]\n**Justification:** [ok]")),
            Arc::new(ScriptedJudge::new("beta", 0, "**Ranking:** [en: 1, de: 2, ar: 3]\n**Justification:** [ok]")),
        ];
        let panel = JudgePanel::new(judges, quick_config());

        let results = panel.run_exercise(&sample_exercise(), &Language::all()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let judges: Vec<Arc<dyn JudgeBackend + Send + Sync>> = vec![Arc::new(
            ScriptedJudge::new("flaky", 2, "**Ranking:** [en: 1, de: 2, ar: 3]\n**Justification:** [ok]"),
        )];
        let panel = JudgePanel::new(judges, quick_config());

        let results = panel.run_exercise(&sample_exercise(), &Language::all()).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
        assert_eq!(results[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_scoped() {
        let judges: Vec<Arc<dyn JudgeBackend + Send + Sync>> = vec![
            Arc::new(ScriptedJudge::new("dead", 99, "")),
            Arc::new(ScriptedJudge::new("alive", 0, "**Ranking:** [en: 1, de: 2, ar: 3]\n**Justification:** [ok]")),
        ];
        let panel = JudgePanel::new(judges, quick_config());

        let results = panel.run_exercise(&sample_exercise(), &Language::all()).await;
        assert_eq!(results.len(), 2);

        let dead = results.iter().find(|r| r.judge == "dead").unwrap();
        assert_eq!(dead.status, CallStatus::RateLimited);
        assert!(dead.verdict.is_none());

        let alive = results.iter().find(|r| r.judge == "alive").unwrap();
        assert!(alive.is_success());
    }
}
