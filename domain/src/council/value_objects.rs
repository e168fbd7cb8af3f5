//! Council value objects - immutable per-stage results.
//!
//! - [`ModelResponse`] - one council model's Stage 1 answer
//! - [`FinalResponse`] - the chairman's Stage 3 synthesis

use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stage 1 answer from a single council model
///
/// Serializes to the wire shape `{model, response}`; outcome and latency
/// are kept for logging and ordering only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The model that generated this response
    pub model: Model,
    /// The response text
    pub response: String,
    /// Generated images as `data:image/...` URLs (image mode only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Error message if the call failed
    #[serde(skip)]
    pub error: Option<String>,
    /// Wall-clock time of the successful attempt
    #[serde(skip)]
    pub latency: Duration,
}

impl ModelResponse {
    /// Creates a successful response from a model.
    pub fn success(model: Model, response: impl Into<String>, latency: Duration) -> Self {
        Self {
            model,
            response: response.into(),
            images: Vec::new(),
            error: None,
            latency,
        }
    }

    /// Creates a failed response indicating the model could not answer.
    pub fn failure(model: Model, error: impl Into<String>) -> Self {
        Self {
            model,
            response: String::new(),
            images: Vec::new(),
            error: Some(error.into()),
            latency: Duration::ZERO,
        }
    }

    /// Attach generated images
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Returns `true` if this response was generated successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The chairman's synthesized answer (Stage 3)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// The chairman model
    pub model: Model,
    /// The synthesized answer
    pub response: String,
    /// Images generated by the chairman (image mode only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl FinalResponse {
    pub fn new(model: Model, response: impl Into<String>) -> Self {
        Self {
            model,
            response: response.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// Prompt annotation for responses that carried images
pub fn image_note(images: &[String]) -> Option<String> {
    if images.is_empty() {
        None
    } else {
        Some(format!("[Generated {} image(s)]", images.len()))
    }
}
