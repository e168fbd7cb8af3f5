//! Collects a turn's event stream into a finished result

use council_application::TurnOutcome;
use council_domain::{CouncilEvent, FinalResponse, ModelResponse, RankingSubmission, Stage2Metadata};

/// Accumulates [`CouncilEvent`]s as they arrive
#[derive(Debug, Default)]
pub struct TurnTranscript {
    stage1: Vec<ModelResponse>,
    stage2: Vec<RankingSubmission>,
    metadata: Option<Stage2Metadata>,
    stage3: Option<FinalResponse>,
    title: Option<String>,
    error: Option<String>,
    completed: bool,
}

impl TurnTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &CouncilEvent) {
        match event {
            CouncilEvent::Stage1Complete { data } => self.stage1 = data.clone(),
            CouncilEvent::Stage2Complete { data, metadata } => {
                self.stage2 = data.clone();
                self.metadata = Some(metadata.clone());
            }
            CouncilEvent::Stage3Complete { data } => self.stage3 = Some(data.clone()),
            CouncilEvent::TitleComplete { data } => self.title = Some(data.title.clone()),
            CouncilEvent::Complete => self.completed = true,
            CouncilEvent::Error { message } => self.error = Some(message.clone()),
            CouncilEvent::Stage1Start | CouncilEvent::Stage2Start | CouncilEvent::Stage3Start => {}
        }
    }

    /// The error message if the turn ended with an `error` event
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The assembled result, once every stage has reported
    pub fn into_outcome(self) -> Option<TurnOutcome> {
        if !self.completed {
            return None;
        }
        Some(TurnOutcome {
            stage1: self.stage1,
            stage2: self.stage2,
            stage3: self.stage3?,
            metadata: self.metadata?,
            title: self.title,
        })
    }
}
