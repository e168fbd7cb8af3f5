//! Run Turn use case
//!
//! Orchestrates one council turn: Stage 1 answers, Stage 2 anonymized peer
//! rankings, Stage 3 chairman synthesis. Progress is delivered as an ordered
//! stream of [`CouncilEvent`]s ending in exactly one `complete` or `error`.

use crate::config::ExecutionParams;
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::council_config::CouncilConfigPort;
use crate::ports::model_gateway::{GatewayError, InvokeOptions, ModelGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::search_provider::{SearchError, SearchProvider};
use crate::use_cases::dispatch::{DispatchError, StageDispatcher};
use crate::use_cases::stream::{EventSink, StreamClosed, TurnStream, event_channel};
use crate::use_cases::title::GenerateTitleUseCase;
use council_domain::{
    ChatMessage, CouncilEvent, CouncilMode, CouncilPrompt, DomainError, FinalResponse, LabelMap,
    Message, Model, ModelResponse, Question, RankingSubmission, Stage, Stage2Metadata,
    TitlePayload, TurnState, aggregate_rankings, needs_web_search,
};
use futures::StreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a turn
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("No council models configured")]
    NoModels,

    #[error("All council models failed to respond")]
    AllModelsFailed,

    #[error("Chairman {model} failed: {source}")]
    ChairmanFailed { model: Model, source: GatewayError },

    #[error("Turn cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Conversation store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DispatchError> for RunTurnError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NoModels => RunTurnError::NoModels,
            DispatchError::AllFailed(_) => RunTurnError::AllModelsFailed,
            DispatchError::Cancelled => RunTurnError::Cancelled,
        }
    }
}

impl From<StreamClosed> for RunTurnError {
    fn from(_: StreamClosed) -> Self {
        RunTurnError::Cancelled
    }
}

/// Input for the RunTurn use case
#[derive(Debug, Clone)]
pub struct RunTurnInput {
    pub question: Question,
    pub mode: CouncilMode,
    /// Replaces the mode's council roster for this turn
    pub custom_models: Option<Vec<Model>>,
    /// Replaces the mode's chairman for this turn
    pub chairman_model: Option<Model>,
    /// Stored conversation this turn belongs to
    pub conversation_id: Option<String>,
}

impl RunTurnInput {
    pub fn new(question: Question, mode: CouncilMode) -> Self {
        Self {
            question,
            mode,
            custom_models: None,
            chairman_model: None,
            conversation_id: None,
        }
    }

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.custom_models = Some(models);
        self
    }

    pub fn with_chairman(mut self, model: Model) -> Self {
        self.chairman_model = Some(model);
        self
    }

    pub fn in_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }
}

/// Everything a completed turn produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub stage1: Vec<ModelResponse>,
    pub stage2: Vec<RankingSubmission>,
    pub stage3: FinalResponse,
    pub metadata: Stage2Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Use case for running one council turn
pub struct RunTurnUseCase<G: ModelGateway + 'static> {
    dispatcher: StageDispatcher<G>,
    title: GenerateTitleUseCase<G>,
    gateway: Arc<G>,
    config: Arc<dyn CouncilConfigPort>,
    store: Option<Arc<dyn ConversationStore>>,
    search: Option<Arc<dyn SearchProvider>>,
    params: ExecutionParams,
    seed: Option<u64>,
}

impl<G: ModelGateway + 'static> RunTurnUseCase<G> {
    pub fn new(gateway: Arc<G>, config: Arc<dyn CouncilConfigPort>) -> Self {
        let params = ExecutionParams::default();
        Self {
            dispatcher: StageDispatcher::new(Arc::clone(&gateway), &params),
            title: GenerateTitleUseCase::new(Arc::clone(&gateway), &params),
            gateway,
            config,
            store: None,
            search: None,
            params,
            seed: None,
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.dispatcher = StageDispatcher::new(Arc::clone(&self.gateway), &params);
        self.title = GenerateTitleUseCase::new(Arc::clone(&self.gateway), &params);
        self.params = params;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable web search for time-sensitive chat questions
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Fix the anonymizer permutation for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &Arc<dyn CouncilConfigPort> {
        &self.config
    }

    /// Start a turn in the background and return its event stream
    ///
    /// Dropping or cancelling the stream cancels the turn.
    pub fn start(self: &Arc<Self>, input: RunTurnInput) -> TurnStream {
        self.start_with_progress(input, Arc::new(NoProgress))
    }

    pub fn start_with_progress(
        self: &Arc<Self>,
        input: RunTurnInput,
        progress: Arc<dyn ProgressNotifier>,
    ) -> TurnStream {
        let (sink, stream) = event_channel(self.params.event_buffer, CancellationToken::new());
        let this = Arc::clone(self);
        tokio::spawn(async move {
            // Failures are already reported on the stream
            let _ = this.execute(input, &sink, progress.as_ref()).await;
        });
        stream
    }

    /// Run a turn without a consumer and return its outcome
    ///
    /// Events are produced and discarded as usual, so ordering and
    /// persistence behave exactly as for a streamed turn.
    pub async fn run_to_completion(
        &self,
        input: RunTurnInput,
    ) -> Result<TurnOutcome, RunTurnError> {
        let (sink, stream) = event_channel(self.params.event_buffer, CancellationToken::new());
        let produce = async move {
            let result = self.execute(input, &sink, &NoProgress).await;
            drop(sink);
            result
        };
        let (result, ()) = tokio::join!(produce, stream.for_each(|_| async {}));
        result
    }

    /// Run the turn to completion, writing events into `sink`
    ///
    /// On failure a single `error` event is emitted, unless the turn was
    /// cancelled, in which case nothing more is emitted.
    pub async fn execute(
        &self,
        input: RunTurnInput,
        sink: &EventSink,
        progress: &dyn ProgressNotifier,
    ) -> Result<TurnOutcome, RunTurnError> {
        let mut state = TurnState::Idle;
        match self.run_stages(input, sink, progress, &mut state).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Ok(failed) = state.fail() {
                    debug!("Turn state: {} -> {}", state, failed);
                }
                match e {
                    RunTurnError::Cancelled => info!("Turn cancelled"),
                    ref other => {
                        warn!("Turn failed: {}", other);
                        let _ = sink.emit(CouncilEvent::error(other.to_string())).await;
                    }
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        input: RunTurnInput,
        sink: &EventSink,
        progress: &dyn ProgressNotifier,
        state: &mut TurnState,
    ) -> Result<TurnOutcome, RunTurnError> {
        let cancel = sink.cancellation();
        let (roster, chairman) = self.resolve_roster(&input);
        if roster.is_empty() {
            return Err(RunTurnError::NoModels);
        }
        let question = input.question.content();
        info!(
            "Starting {} turn with {} council models, chairman {}",
            input.mode,
            roster.len(),
            chairman
        );

        // The title task is cancelled when this guard drops with the turn
        let title_cancel = cancel.child_token();
        let _title_guard = title_cancel.clone().drop_guard();
        let title_task = self
            .record_question(&input, question, &title_cancel)
            .await?;

        // Images are requested from answering models and the chairman, never evaluators
        let options = match input.mode {
            CouncilMode::Image => InvokeOptions::images(),
            _ => InvokeOptions::default(),
        };

        // Stage 1: independent answers
        advance(state)?;
        sink.emit(CouncilEvent::Stage1Start).await?;
        let search_context = self.web_context(&input, cancel).await?;
        let stage1 = self
            .dispatcher
            .dispatch_with(
                Stage::Responses,
                &roster,
                CouncilPrompt::stage1_messages(input.mode, question, search_context.as_deref())
                    .into(),
                options,
                cancel,
                progress,
            )
            .await?
            .successes;
        advance(state)?;
        sink.emit(CouncilEvent::Stage1Complete {
            data: stage1.clone(),
        })
        .await?;

        // Stage 2: anonymized peer ranking
        advance(state)?;
        sink.emit(CouncilEvent::Stage2Start).await?;
        let labels = self.anonymize(&stage1)?;
        let ranking_prompt =
            CouncilPrompt::ranking_prompt(input.mode, question, &labels.bundle(&stage1));
        let evaluators: Vec<Model> = stage1.iter().map(|r| r.model.clone()).collect();
        let rankings = match self
            .dispatcher
            .dispatch(
                Stage::Rankings,
                &evaluators,
                vec![ChatMessage::user(ranking_prompt)].into(),
                cancel,
                progress,
            )
            .await
        {
            Ok(outcome) => outcome.successes,
            Err(DispatchError::AllFailed(n)) => {
                warn!("All {} evaluators failed, continuing without rankings", n);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        let stage2: Vec<RankingSubmission> = rankings
            .into_iter()
            .map(|r| RankingSubmission::parse(r.model, r.response, &labels))
            .collect();
        for submission in stage2.iter().filter(|s| s.is_unparsed()) {
            warn!("No ranking labels found in {}'s evaluation", submission.model);
        }
        let aggregate = aggregate_rankings(&stage2, &labels);
        let metadata = Stage2Metadata::new(labels, aggregate).with_search_context(search_context);
        advance(state)?;
        sink.emit(CouncilEvent::Stage2Complete {
            data: stage2.clone(),
            metadata: metadata.clone(),
        })
        .await?;

        // Stage 3: chairman synthesis
        advance(state)?;
        sink.emit(CouncilEvent::Stage3Start).await?;
        let stage3 = self
            .synthesize(&input, &chairman, &stage1, &stage2, &metadata, options, cancel, progress)
            .await?;
        sink.emit(CouncilEvent::Stage3Complete {
            data: stage3.clone(),
        })
        .await?;

        let mut outcome = TurnOutcome {
            stage1,
            stage2,
            stage3,
            metadata,
            title: None,
        };

        if let (Some(store), Some(id)) = (&self.store, &input.conversation_id) {
            store
                .append_message(
                    id,
                    Message::Assistant {
                        stage1: outcome.stage1.clone(),
                        stage2: outcome.stage2.clone(),
                        stage3: outcome.stage3.clone(),
                        metadata: Some(outcome.metadata.clone()),
                    },
                )
                .await?;
        }

        if let Some(task) = title_task {
            outcome.title = self.finish_title(task, &input).await;
            if let Some(title) = &outcome.title {
                sink.emit(CouncilEvent::TitleComplete {
                    data: TitlePayload {
                        title: title.clone(),
                    },
                })
                .await?;
            }
        }

        advance(state)?;
        sink.emit(CouncilEvent::Complete).await?;
        info!("Turn complete");
        Ok(outcome)
    }

    /// Council roster and chairman after applying per-turn overrides
    pub fn resolve_roster(&self, input: &RunTurnInput) -> (Vec<Model>, Model) {
        let preset = self.config.mode_config(input.mode);
        let roster = match &input.custom_models {
            Some(models) if !models.is_empty() => models.clone(),
            _ => preset.council_models,
        };
        let chairman = input
            .chairman_model
            .clone()
            .unwrap_or(preset.chairman_model);
        (roster, chairman)
    }

    /// Store the user message and, for a fresh conversation, start titling it
    async fn record_question(
        &self,
        input: &RunTurnInput,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<JoinHandle<Result<String, GatewayError>>>, RunTurnError> {
        let (Some(store), Some(id)) = (&self.store, &input.conversation_id) else {
            return Ok(None);
        };
        let conversation = store
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let is_first = conversation.is_empty();
        store.append_message(id, Message::user(question)).await?;

        if !is_first {
            return Ok(None);
        }
        let title = self.title.clone();
        let question = question.to_string();
        let cancel = cancel.clone();
        Ok(Some(tokio::spawn(async move {
            title.execute(&question, &cancel).await
        })))
    }

    async fn finish_title(
        &self,
        task: JoinHandle<Result<String, GatewayError>>,
        input: &RunTurnInput,
    ) -> Option<String> {
        let title = match task.await {
            Ok(Ok(title)) => title,
            Ok(Err(e)) => {
                warn!("Title generation failed: {}", e);
                return None;
            }
            Err(e) => {
                warn!("Title task join error: {}", e);
                return None;
            }
        };
        if let (Some(store), Some(id)) = (&self.store, &input.conversation_id)
            && let Err(e) = store.update_title(id, &title).await
        {
            warn!("Failed to store title for {}: {}", id, e);
            return None;
        }
        Some(title)
    }

    /// Search results for a time-sensitive chat question, if search is enabled
    ///
    /// Search failures are logged and the turn continues without context.
    async fn web_context(
        &self,
        input: &RunTurnInput,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, RunTurnError> {
        let Some(search) = &self.search else {
            return Ok(None);
        };
        let question = input.question.content();
        if input.mode != CouncilMode::Chat || !needs_web_search(question) {
            return Ok(None);
        }

        info!("Searching the web before Stage 1");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RunTurnError::Cancelled),
            result = tokio::time::timeout(self.params.search_timeout, search.search(question)) => {
                result.unwrap_or(Err(SearchError::Timeout))
            }
        };
        match result {
            Ok(context) if !context.trim().is_empty() => Ok(Some(context)),
            Ok(_) => {
                debug!("Web search returned no results");
                Ok(None)
            }
            Err(e) => {
                warn!("Web search failed, continuing without it: {}", e);
                Ok(None)
            }
        }
    }

    fn anonymize(&self, stage1: &[ModelResponse]) -> Result<LabelMap, DomainError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        LabelMap::anonymize(stage1, &mut rng)
    }

    #[allow(clippy::too_many_arguments)]
    async fn synthesize(
        &self,
        input: &RunTurnInput,
        chairman: &Model,
        stage1: &[ModelResponse],
        stage2: &[RankingSubmission],
        metadata: &Stage2Metadata,
        options: InvokeOptions,
        cancel: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Result<FinalResponse, RunTurnError> {
        info!("{}: chairman {}", Stage::Synthesis, chairman);
        progress.on_stage_start(Stage::Synthesis, 1);

        let prompt = CouncilPrompt::chairman_prompt(
            input.mode,
            input.question.content(),
            stage1,
            stage2,
            &metadata.aggregate_rankings,
        );
        let result = self
            .dispatcher
            .invoke_one(chairman, &[ChatMessage::user(prompt)], options, cancel)
            .await;
        progress.on_call_complete(Stage::Synthesis, chairman, result.is_ok());

        let (reply, latency) = result.map_err(|e| match e {
            GatewayError::Cancelled => RunTurnError::Cancelled,
            source => RunTurnError::ChairmanFailed {
                model: chairman.clone(),
                source,
            },
        })?;
        progress.on_stage_complete(Stage::Synthesis);
        debug!("Chairman answered in {:?}", latency);
        Ok(FinalResponse::new(chairman.clone(), reply.content).with_images(reply.images))
    }
}

fn advance(state: &mut TurnState) -> Result<(), DomainError> {
    let next = state.advance()?;
    debug!("Turn state: {} -> {}", state, next);
    *state = next;
    Ok(())
}
