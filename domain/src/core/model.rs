//! Model value object representing an OpenRouter model identifier

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LLM models that can sit on the council (Value Object)
///
/// Identifiers follow OpenRouter's `vendor/name` convention. Anything not
/// listed here is carried verbatim as [`Model::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // OpenAI
    Gpt51,
    Gpt5Image,
    // Google
    Gemini3Pro,
    Gemini3ProImage,
    Gemini25Flash,
    Gemini25FlashImage,
    // Anthropic
    ClaudeSonnet45,
    // xAI
    Grok4,
    // Qwen / DeepSeek
    Qwen3Coder,
    QwenVlMax,
    DeepSeekR1DistillQwen32b,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt51 => "openai/gpt-5.1",
            Model::Gpt5Image => "openai/gpt-5-image",
            Model::Gemini3Pro => "google/gemini-3-pro-preview",
            Model::Gemini3ProImage => "google/gemini-3-pro-image-preview",
            Model::Gemini25Flash => "google/gemini-2.5-flash",
            Model::Gemini25FlashImage => "google/gemini-2.5-flash-image",
            Model::ClaudeSonnet45 => "anthropic/claude-sonnet-4.5",
            Model::Grok4 => "x-ai/grok-4",
            Model::Qwen3Coder => "qwen/qwen3-coder",
            Model::QwenVlMax => "qwen/qwen-vl-max",
            Model::DeepSeekR1DistillQwen32b => "deepseek/deepseek-r1-distill-qwen-32b",
            Model::Custom(s) => s,
        }
    }

    /// Vendor prefix of the identifier (`"openai"` for `openai/gpt-5.1`)
    pub fn vendor(&self) -> Option<&str> {
        self.as_str().split_once('/').map(|(vendor, _)| vendor)
    }

    /// Default model for conversation-title generation (fast and cheap)
    pub fn default_title_model() -> Model {
        Model::Gemini25Flash
    }
}

/// Models order by their identifier string.
impl Ord for Model {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Model {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "openai/gpt-5.1" => Model::Gpt51,
            "openai/gpt-5-image" => Model::Gpt5Image,
            "google/gemini-3-pro-preview" => Model::Gemini3Pro,
            "google/gemini-3-pro-image-preview" => Model::Gemini3ProImage,
            "google/gemini-2.5-flash" => Model::Gemini25Flash,
            "google/gemini-2.5-flash-image" => Model::Gemini25FlashImage,
            "anthropic/claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "x-ai/grok-4" => Model::Grok4,
            "qwen/qwen3-coder" => Model::Qwen3Coder,
            "qwen/qwen-vl-max" => Model::QwenVlMax,
            "deepseek/deepseek-r1-distill-qwen-32b" => Model::DeepSeekR1DistillQwen32b,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_roundtrip() {
        for model in [Model::Gpt51, Model::Gemini3Pro, Model::ClaudeSonnet45, Model::Grok4] {
            let parsed: Model = model.to_string().parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model = Model::from("meta-llama/llama-4-maverick");
        assert_eq!(model, Model::Custom("meta-llama/llama-4-maverick".to_string()));
        assert_eq!(model.to_string(), "meta-llama/llama-4-maverick");
    }

    #[test]
    fn test_vendor() {
        assert_eq!(Model::Gpt51.vendor(), Some("openai"));
        assert_eq!(Model::Custom("local".to_string()).vendor(), None);
    }

    #[test]
    fn test_ordering_is_lexicographic_by_identifier() {
        // "anthropic/..." < "openai/..." < "x-ai/..." regardless of variant order
        assert!(Model::ClaudeSonnet45 < Model::Gpt51);
        assert!(Model::Gpt51 < Model::Grok4);
        assert!(Model::Custom("aaa/model".to_string()) < Model::ClaudeSonnet45);
    }
}
