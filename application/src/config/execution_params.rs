//! Execution parameters: per-call deadlines, retries and buffering.
//!
//! [`ExecutionParams`] groups the static parameters that control how the
//! [`StageDispatcher`](crate::use_cases::dispatch::StageDispatcher) and
//! [`RunTurnUseCase`](crate::use_cases::run_turn::RunTurnUseCase) run a turn.
//! These are application-layer concerns, not domain policy.

use council_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turn execution control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Deadline for each individual model call.
    pub call_timeout: Duration,
    /// Extra attempts after a failed or timed-out call.
    pub max_retries: usize,
    /// Pause between attempts.
    pub retry_backoff: Duration,
    /// Capacity of the event channel between orchestrator and consumer.
    pub event_buffer: usize,
    /// Fast model used for conversation titles.
    pub title_model: Model,
    /// Deadline for title generation.
    pub title_timeout: Duration,
    /// Deadline for the pre-Stage 1 web search.
    pub search_timeout: Duration,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(120),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
            event_buffer: 32,
            title_model: Model::default_title_model(),
            title_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(30),
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer.max(1);
        self
    }

    pub fn with_title_model(mut self, model: Model) -> Self {
        self.title_model = model;
        self
    }

    pub fn with_title_timeout(mut self, timeout: Duration) -> Self {
        self.title_timeout = timeout;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.call_timeout, Duration::from_secs(120));
        assert_eq!(params.max_retries, 0);
        assert_eq!(params.title_model, Model::Gemini25Flash);
        assert_eq!(params.title_timeout, Duration::from_secs(30));
        assert_eq!(params.search_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_call_timeout(Duration::from_secs(5))
            .with_max_retries(2)
            .with_event_buffer(0);

        assert_eq!(params.call_timeout, Duration::from_secs(5));
        assert_eq!(params.max_retries, 2);
        assert_eq!(params.event_buffer, 1);
    }
}
