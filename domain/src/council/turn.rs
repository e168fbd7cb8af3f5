//! Turn lifecycle: the three stages and the state machine that sequences them.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Stage of a council turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Stage 1 - every council model answers the question
    Responses,
    /// Stage 2 - models rank the anonymized answers
    Rankings,
    /// Stage 3 - the chairman synthesizes a final answer
    Synthesis,
}

impl Stage {
    pub fn number(&self) -> u8 {
        match self {
            Stage::Responses => 1,
            Stage::Rankings => 2,
            Stage::Synthesis => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Responses => "Individual Responses",
            Stage::Rankings => "Peer Rankings",
            Stage::Synthesis => "Final Synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stage {}: {}", self.number(), self.display_name())
    }
}

/// State of one council turn
///
/// ```text
/// Idle -> Stage1Running -> Stage1Done -> Stage2Running -> Stage2Done -> Stage3Running -> Complete
///   \__________\_______________\______________\_______________\______________\_______-> Failed
/// ```
///
/// There is no way back to an earlier state; `Complete` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    Idle,
    Stage1Running,
    Stage1Done,
    Stage2Running,
    Stage2Done,
    Stage3Running,
    Complete,
    Failed,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Stage1Running => "stage1_running",
            TurnState::Stage1Done => "stage1_done",
            TurnState::Stage2Running => "stage2_running",
            TurnState::Stage2Done => "stage2_done",
            TurnState::Stage3Running => "stage3_running",
            TurnState::Complete => "complete",
            TurnState::Failed => "failed",
        }
    }

    /// Successor on the success path
    pub fn successor(&self) -> Option<TurnState> {
        match self {
            TurnState::Idle => Some(TurnState::Stage1Running),
            TurnState::Stage1Running => Some(TurnState::Stage1Done),
            TurnState::Stage1Done => Some(TurnState::Stage2Running),
            TurnState::Stage2Running => Some(TurnState::Stage2Done),
            TurnState::Stage2Done => Some(TurnState::Stage3Running),
            TurnState::Stage3Running => Some(TurnState::Complete),
            TurnState::Complete | TurnState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Complete | TurnState::Failed)
    }

    /// The stage currently executing, if any
    pub fn running_stage(&self) -> Option<Stage> {
        match self {
            TurnState::Stage1Running => Some(Stage::Responses),
            TurnState::Stage2Running => Some(Stage::Rankings),
            TurnState::Stage3Running => Some(Stage::Synthesis),
            _ => None,
        }
    }

    /// Move one step along the success path
    pub fn advance(self) -> Result<TurnState, DomainError> {
        self.successor()
            .ok_or_else(|| DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: "next".to_string(),
            })
    }

    /// Enter `Failed` from any non-terminal state
    pub fn fail(self) -> Result<TurnState, DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: TurnState::Failed.as_str().to_string(),
            });
        }
        Ok(TurnState::Failed)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
