//! Wire types for the chat completions endpoint

use council_domain::ChatMessage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

const IMAGE_MODALITIES: [&str; 2] = ["text", "image"];

static EMBEDDED_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/[^;]+;base64,[A-Za-z0-9+/=]+").expect("valid data URL regex")
});

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<&'a [&'a str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
pub struct ImageConfig {
    pub aspect_ratio: &'static str,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [ChatMessage]) -> Self {
        Self {
            model,
            messages,
            modalities: None,
            image_config: None,
        }
    }

    /// Ask for square images alongside the text answer
    pub fn with_images(mut self) -> Self {
        self.modalities = Some(&IMAGE_MODALITIES);
        self.image_config = Some(ImageConfig { aspect_ratio: "1:1" });
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// `content` is a string for text answers and may be a list of blocks
/// when the model produced images
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<Value>,
}

/// Text and images of the first choice
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChatContent {
    pub text: String,
    pub images: Vec<String>,
}

impl ChatResponse {
    /// Content of the first choice, if any
    pub fn into_content(self) -> Option<ChatContent> {
        let content = self.choices.into_iter().next()?.message.content?;
        match content {
            Value::String(text) => {
                let images = EMBEDDED_IMAGE
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string())
                    .collect();
                Some(ChatContent { text, images })
            }
            Value::Array(blocks) => {
                let mut parsed = ChatContent::default();
                for block in &blocks {
                    read_block(block, &mut parsed);
                }
                Some(parsed)
            }
            _ => None,
        }
    }
}

fn read_block(block: &Value, into: &mut ChatContent) {
    match block.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = block.get("text").and_then(Value::as_str) {
                if !into.text.is_empty() {
                    into.text.push('\n');
                }
                into.text.push_str(text);
            }
        }
        Some("image_url") => {
            if let Some(url) = block.pointer("/image_url/url").and_then(Value::as_str)
                && url.starts_with("data:image")
            {
                into.images.push(url.to_string());
            }
        }
        Some("image") => {
            if let Some(data) = block.get("data").and_then(Value::as_str) {
                into.images.push(format!("data:image/png;base64,{}", data));
            }
        }
        _ => {}
    }
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<ChatContent> {
        serde_json::from_str::<ChatResponse>(body).unwrap().into_content()
    }

    #[test]
    fn test_request_shape() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request = ChatRequest::new("openai/gpt-5.1", &messages);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "openai/gpt-5.1",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_image_request_shape() {
        let messages = [ChatMessage::user("a fox")];
        let request = ChatRequest::new("openai/gpt-5-image", &messages).with_images();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["modalities"], serde_json::json!(["text", "image"]));
        assert_eq!(json["image_config"], serde_json::json!({"aspect_ratio": "1:1"}));
    }

    #[test]
    fn test_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse(body), None);
    }

    #[test]
    fn test_string_content_with_embedded_image() {
        let body = concat!(
            r#"{"choices":[{"message":{"content":"#,
            r#""Here: ![fox](data:image/png;base64,iVBOR+w/0=) done"}}]}"#
        );
        let content = parse(body).unwrap();
        assert_eq!(content.images, vec!["data:image/png;base64,iVBOR+w/0="]);
        assert!(content.text.starts_with("Here:"));
    }

    #[test]
    fn test_block_content() {
        let body = r#"{"choices":[{"message":{"content":[
            {"type":"text","text":"A red fox"},
            {"type":"image_url","image_url":{"url":"data:image/jpeg;base64,AAAA"}},
            {"type":"image_url","image_url":{"url":"https://example.com/fox.png"}},
            {"type":"image","data":"BBBB"}
        ]}}]}"#;
        let content = parse(body).unwrap();
        assert_eq!(content.text, "A red fox");
        assert_eq!(
            content.images,
            vec!["data:image/jpeg;base64,AAAA", "data:image/png;base64,BBBB"]
        );
    }
}
