//! Council configuration port
//!
//! Supplies the per-mode roster (council models and chairman).

use council_domain::{CouncilMode, Model};
use serde::{Deserialize, Serialize};

/// Roster preset for one council mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub council_models: Vec<Model>,
    pub chairman_model: Model,
}

impl ModeConfig {
    pub fn new(council_models: Vec<Model>, chairman_model: Model) -> Self {
        Self {
            council_models,
            chairman_model,
        }
    }
}

/// Read-only access to council presets
pub trait CouncilConfigPort: Send + Sync {
    /// Preset for the given mode
    fn mode_config(&self, mode: CouncilMode) -> ModeConfig;

    /// Mode used when a request does not name one
    fn default_mode(&self) -> CouncilMode {
        CouncilMode::default()
    }
}
