//! Council mode: selects the roster preset and prompt flavour for a turn.

use serde::{Deserialize, Serialize};

/// Preset selector for a council turn
///
/// | Mode | Stage 1 framing | Evaluation criteria |
/// |------|-----------------|---------------------|
/// | `chat` | bare question, or web results + question | accuracy, depth, clarity |
/// | `code` | "Code Task" + engineer system prompt | correctness, security, performance |
/// | `image` | "Image Generation Request" + artist prompt | quality, adherence, composition |
///
/// Image mode also asks answering models and the chairman for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilMode {
    #[default]
    Chat,
    Code,
    Image,
}

impl CouncilMode {
    pub const ALL: [CouncilMode; 3] = [CouncilMode::Chat, CouncilMode::Code, CouncilMode::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            CouncilMode::Chat => "chat",
            CouncilMode::Code => "code",
            CouncilMode::Image => "image",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CouncilMode::Chat => "Chat",
            CouncilMode::Code => "Code",
            CouncilMode::Image => "Image",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CouncilMode::Chat => "General purpose conversation",
            CouncilMode::Code => "Programming and development",
            CouncilMode::Image => "Image generation and analysis",
        }
    }

    /// Parse a mode name case-insensitively, falling back to `chat`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "code" => CouncilMode::Code,
            "image" => CouncilMode::Image,
            _ => CouncilMode::Chat,
        }
    }
}

impl std::fmt::Display for CouncilMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(CouncilMode::from_name("CODE"), CouncilMode::Code);
        assert_eq!(CouncilMode::from_name(" Image "), CouncilMode::Image);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_chat() {
        assert_eq!(CouncilMode::from_name("poetry"), CouncilMode::Chat);
        assert_eq!(CouncilMode::from_name(""), CouncilMode::Chat);
    }
}
