//! Stage dispatcher
//!
//! Fans one prompt out to a roster of models and joins on all of them.
//! Every call runs under the turn's cancellation token and its own deadline;
//! a failed call never aborts its siblings.

use crate::config::ExecutionParams;
use crate::ports::model_gateway::{GatewayError, InvokeOptions, ModelGateway, ModelReply};
use crate::ports::progress::ProgressNotifier;
use council_domain::{ChatMessage, Model, ModelResponse, Stage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stage-level dispatch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No models to dispatch")]
    NoModels,

    #[error("All {0} model calls failed")]
    AllFailed(usize),

    #[error("Dispatch cancelled")]
    Cancelled,
}

/// Result of a settled stage
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Successful answers, in roster order
    pub successes: Vec<ModelResponse>,
    /// Failed models, for logging only
    pub failures: Vec<(Model, GatewayError)>,
}

type CallResult = Result<(ModelReply, Duration), GatewayError>;

/// Deadline and retry policy applied to every call
#[derive(Debug, Clone, Copy)]
struct CallPolicy {
    timeout: Duration,
    max_retries: usize,
    backoff: Duration,
}

impl From<&ExecutionParams> for CallPolicy {
    fn from(params: &ExecutionParams) -> Self {
        Self {
            timeout: params.call_timeout,
            max_retries: params.max_retries,
            backoff: params.retry_backoff,
        }
    }
}

/// Runs the model calls of one stage concurrently
pub struct StageDispatcher<G: ModelGateway + 'static> {
    gateway: Arc<G>,
    policy: CallPolicy,
}

impl<G: ModelGateway + 'static> StageDispatcher<G> {
    pub fn new(gateway: Arc<G>, params: &ExecutionParams) -> Self {
        Self {
            gateway,
            policy: CallPolicy::from(params),
        }
    }

    /// Send `messages` to every model in `models` and wait for all calls to settle
    ///
    /// Duplicate models are called once. Returns [`DispatchError::AllFailed`]
    /// when no call succeeded.
    pub async fn dispatch(
        &self,
        stage: Stage,
        models: &[Model],
        messages: Arc<[ChatMessage]>,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_with(stage, models, messages, InvokeOptions::default(), cancel, progress)
            .await
    }

    /// [`dispatch`](Self::dispatch) with per-call options
    pub async fn dispatch_with(
        &self,
        stage: Stage,
        models: &[Model],
        messages: Arc<[ChatMessage]>,
        options: InvokeOptions,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<DispatchOutcome, DispatchError> {
        let roster = dedupe(models);
        if roster.is_empty() {
            return Err(DispatchError::NoModels);
        }
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        info!("{}: dispatching to {} models", stage, roster.len());
        progress.on_stage_start(stage, roster.len());

        let mut join_set = JoinSet::new();
        for (index, model) in roster.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let model = model.clone();
            let messages = Arc::clone(&messages);
            let cancel = cancel.clone();
            let policy = self.policy;

            join_set.spawn(async move {
                let result =
                    Self::call_model(gateway.as_ref(), &model, &messages, options, &cancel, policy)
                        .await;
                (index, result)
            });
        }

        // One write-once slot per roster position
        let mut slots: Vec<Option<CallResult>> = (0..roster.len()).map(|_| None).collect();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    info!("{}: cancelled", stage);
                    return Err(DispatchError::Cancelled);
                }
                joined = join_set.join_next() => match joined {
                    None => break,
                    Some(Ok((index, result))) => {
                        let model = &roster[index];
                        match &result {
                            Ok(_) => debug!("Model {} responded successfully", model),
                            Err(e) => warn!("Model {} failed: {}", model, e),
                        }
                        progress.on_call_complete(stage, model, result.is_ok());
                        if slots[index].is_none() {
                            slots[index] = Some(result);
                        }
                    }
                    Some(Err(e)) => warn!("Task join error: {}", e),
                },
            }
        }

        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for (model, slot) in roster.into_iter().zip(slots) {
            match slot {
                Some(Ok((reply, latency))) => successes.push(
                    ModelResponse::success(model, reply.content, latency).with_images(reply.images),
                ),
                Some(Err(e)) => failures.push((model, e)),
                None => failures.push((model, GatewayError::Other("task aborted".to_string()))),
            }
        }

        progress.on_stage_complete(stage);
        info!(
            "{}: {} succeeded, {} failed",
            stage,
            successes.len(),
            failures.len()
        );

        if successes.is_empty() {
            return Err(DispatchError::AllFailed(failures.len()));
        }
        Ok(DispatchOutcome {
            successes,
            failures,
        })
    }

    /// Single call under the same deadline and retry policy
    pub async fn invoke_one(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        options: InvokeOptions,
        cancel: &CancellationToken,
    ) -> CallResult {
        Self::call_model(self.gateway.as_ref(), model, messages, options, cancel, self.policy).await
    }

    async fn call_model(
        gateway: &G,
        model: &Model,
        messages: &[ChatMessage],
        options: InvokeOptions,
        cancel: &CancellationToken,
        policy: CallPolicy,
    ) -> CallResult {
        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                outcome = tokio::time::timeout(
                    policy.timeout,
                    gateway.invoke_with(model, messages, options),
                ) => {
                    outcome.unwrap_or(Err(GatewayError::Timeout))
                }
            };

            match result {
                Ok(reply) => return Ok((reply, started.elapsed())),
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    attempt += 1;
                    warn!(
                        "Model {} attempt {} failed: {}, retrying",
                        model, attempt, e
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(policy.backoff) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn dedupe(models: &[Model]) -> Vec<Model> {
    let mut roster: Vec<Model> = Vec::with_capacity(models.len());
    for model in models {
        if !roster.contains(model) {
            roster.push(model.clone());
        }
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Reply(&'static str),
        Fail,
        Hang,
        /// Fail this many times, then reply
        Flaky(usize),
    }

    struct MockGateway {
        behaviors: HashMap<Model, Behavior>,
        calls: AtomicUsize,
        flaky_attempts: Mutex<HashMap<Model, usize>>,
    }

    impl MockGateway {
        fn new(behaviors: Vec<(Model, Behavior)>) -> Self {
            Self {
                behaviors: behaviors.into_iter().collect(),
                calls: AtomicUsize::new(0),
                flaky_attempts: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl ModelGateway for MockGateway {
        async fn invoke(
            &self,
            model: &Model,
            _messages: &[ChatMessage],
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviors.get(model) {
                Some(Behavior::Reply(text)) => Ok(text.to_string()),
                Some(Behavior::Fail) | None => {
                    Err(GatewayError::RequestFailed("boom".to_string()))
                }
                Some(Behavior::Hang) => std::future::pending().await,
                Some(Behavior::Flaky(failures)) => {
                    let mut attempts = self.flaky_attempts.lock().unwrap();
                    let seen = attempts.entry(model.clone()).or_insert(0);
                    *seen += 1;
                    if *seen <= *failures {
                        Err(GatewayError::ConnectionError("reset".to_string()))
                    } else {
                        Ok("recovered".to_string())
                    }
                }
            }
        }
    }

    fn messages() -> Arc<[ChatMessage]> {
        vec![ChatMessage::user("What is Rust?")].into()
    }

    fn params() -> ExecutionParams {
        ExecutionParams::default().with_call_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_dispatch_keeps_roster_order() {
        let gateway = Arc::new(MockGateway::new(vec![
            (Model::Gpt51, Behavior::Reply("one")),
            (Model::Grok4, Behavior::Reply("two")),
            (Model::ClaudeSonnet45, Behavior::Reply("three")),
        ]));
        let dispatcher = StageDispatcher::new(gateway, &params());
        let roster = [Model::Grok4, Model::Gpt51, Model::ClaudeSonnet45];

        let outcome = dispatcher
            .dispatch(
                Stage::Responses,
                &roster,
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        let models: Vec<_> = outcome.successes.iter().map(|r| r.model.clone()).collect();
        assert_eq!(models, roster.to_vec());
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let gateway = Arc::new(MockGateway::new(vec![
            (Model::Gpt51, Behavior::Reply("one")),
            (Model::Grok4, Behavior::Fail),
        ]));
        let dispatcher = StageDispatcher::new(gateway, &params());

        let outcome = dispatcher
            .dispatch(
                Stage::Responses,
                &[Model::Gpt51, Model::Grok4],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.successes.len(), 1);
        assert_eq!(outcome.successes[0].response, "one");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, Model::Grok4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let gateway = Arc::new(MockGateway::new(vec![
            (Model::Gpt51, Behavior::Reply("one")),
            (Model::Grok4, Behavior::Hang),
        ]));
        let dispatcher = StageDispatcher::new(gateway, &params());

        let outcome = dispatcher
            .dispatch(
                Stage::Responses,
                &[Model::Gpt51, Model::Grok4],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.successes.len(), 1);
        assert_eq!(outcome.failures, vec![(Model::Grok4, GatewayError::Timeout)]);
    }

    #[tokio::test]
    async fn test_all_failed() {
        let gateway = Arc::new(MockGateway::new(vec![
            (Model::Gpt51, Behavior::Fail),
            (Model::Grok4, Behavior::Fail),
        ]));
        let dispatcher = StageDispatcher::new(gateway, &params());

        let result = dispatcher
            .dispatch(
                Stage::Responses,
                &[Model::Gpt51, Model::Grok4],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::AllFailed(2));
    }

    #[tokio::test]
    async fn test_empty_roster() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let dispatcher = StageDispatcher::new(gateway, &params());

        let result = dispatcher
            .dispatch(
                Stage::Responses,
                &[],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::NoModels);
    }

    #[tokio::test]
    async fn test_duplicates_called_once() {
        let gateway = Arc::new(MockGateway::new(vec![(Model::Gpt51, Behavior::Reply("one"))]));
        let dispatcher = StageDispatcher::new(Arc::clone(&gateway), &params());

        let outcome = dispatcher
            .dispatch(
                Stage::Responses,
                &[Model::Gpt51, Model::Gpt51],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.successes.len(), 1);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_in_flight_calls() {
        let gateway = Arc::new(MockGateway::new(vec![
            (Model::Gpt51, Behavior::Hang),
            (Model::Grok4, Behavior::Hang),
        ]));
        let dispatcher = StageDispatcher::new(gateway, &params());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let result = dispatcher
            .dispatch(
                Stage::Responses,
                &[Model::Gpt51, Model::Grok4],
                messages(),
                &cancel,
                &NoProgress,
            )
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_precancelled_issues_no_calls() {
        let gateway = Arc::new(MockGateway::new(vec![(Model::Gpt51, Behavior::Reply("one"))]));
        let dispatcher = StageDispatcher::new(Arc::clone(&gateway), &params());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = dispatcher
            .dispatch(Stage::Rankings, &[Model::Gpt51], messages(), &cancel, &NoProgress)
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::Cancelled);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let gateway = Arc::new(MockGateway::new(vec![(Model::Gpt51, Behavior::Flaky(2))]));
        let dispatcher = StageDispatcher::new(
            Arc::clone(&gateway),
            &params().with_max_retries(2),
        );

        let (reply, _) = dispatcher
            .invoke_one(
                &Model::Gpt51,
                &messages(),
                InvokeOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(reply.content, "recovered");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    struct PaintingGateway;

    #[async_trait]
    impl ModelGateway for PaintingGateway {
        async fn invoke(&self, _: &Model, _: &[ChatMessage]) -> Result<String, GatewayError> {
            Ok("text only".to_string())
        }

        async fn invoke_with(
            &self,
            _: &Model,
            _: &[ChatMessage],
            options: InvokeOptions,
        ) -> Result<ModelReply, GatewayError> {
            let mut reply = ModelReply::text("a fox");
            if options.generate_images {
                reply.images.push("data:image/png;base64,AAAA".to_string());
            }
            Ok(reply)
        }
    }

    #[tokio::test]
    async fn test_images_attached_when_requested() {
        let dispatcher = StageDispatcher::new(Arc::new(PaintingGateway), &params());

        let outcome = dispatcher
            .dispatch_with(
                Stage::Responses,
                &[Model::Gpt5Image],
                messages(),
                InvokeOptions::images(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();
        assert_eq!(outcome.successes[0].images, vec!["data:image/png;base64,AAAA"]);

        let outcome = dispatcher
            .dispatch(
                Stage::Rankings,
                &[Model::Gpt5Image],
                messages(),
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();
        assert!(outcome.successes[0].images.is_empty());
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let gateway = Arc::new(MockGateway::new(vec![(Model::Gpt51, Behavior::Flaky(1))]));
        let dispatcher = StageDispatcher::new(Arc::clone(&gateway), &params());

        let result = dispatcher
            .invoke_one(
                &Model::Gpt51,
                &messages(),
                InvokeOptions::default(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(GatewayError::ConnectionError(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }
}
