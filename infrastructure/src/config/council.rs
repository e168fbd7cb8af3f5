//! Static per-mode council configuration

use super::file_config::{FileConfig, builtin_preset};
use council_application::{CouncilConfigPort, ModeConfig};
use council_domain::CouncilMode;
use std::collections::HashMap;

/// [`CouncilConfigPort`] backed by the loaded `[modes]` table
///
/// Modes missing from the file fall back to the built-in presets.
#[derive(Debug, Clone)]
pub struct StaticCouncilConfig {
    modes: HashMap<CouncilMode, ModeConfig>,
}

impl StaticCouncilConfig {
    pub fn from_file(config: &FileConfig) -> Self {
        let modes = CouncilMode::ALL
            .iter()
            .map(|mode| {
                let preset = config
                    .modes
                    .get(*mode)
                    .map(ModeConfig::from)
                    .unwrap_or_else(|| ModeConfig::from(&builtin_preset(*mode)));
                (*mode, preset)
            })
            .collect();
        Self { modes }
    }

    /// Every mode with its roster, in display order
    pub fn all(&self) -> Vec<(CouncilMode, ModeConfig)> {
        CouncilMode::ALL
            .iter()
            .map(|mode| (*mode, self.mode_config(*mode)))
            .collect()
    }
}

impl Default for StaticCouncilConfig {
    fn default() -> Self {
        Self::from_file(&FileConfig::default())
    }
}

impl CouncilConfigPort for StaticCouncilConfig {
    fn mode_config(&self, mode: CouncilMode) -> ModeConfig {
        self.modes
            .get(&mode)
            .cloned()
            .unwrap_or_else(|| ModeConfig::from(&builtin_preset(mode)))
    }
}
