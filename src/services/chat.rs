use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config;
use crate::email::providers::{build_http_client, ProviderError};

const PROVIDER: &str = "chat";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatAnswer {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Non-streaming glue onto an OpenAI-compatible completion API.
pub struct ChatService {
    client: reqwest::Client,
}

impl ChatService {
    pub fn new() -> Result<Self, ProviderError> {
        let client = build_http_client(config::config().chat.timeout_secs)?;
        Ok(Self { client })
    }

    pub fn is_configured(&self) -> bool {
        config::config().chat.api_key.is_some()
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatAnswer, ProviderError> {
        let chat = &config::config().chat;
        let api_key = chat
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(PROVIDER.to_string()))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", chat.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&json!({ "model": chat.model, "messages": messages }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let completion: Completion = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER.to_string(),
                message: "completion carried no choices".to_string(),
            })?;

        Ok(ChatAnswer {
            reply,
            model: completion.model.unwrap_or_else(|| chat.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_decodes() {
        let body = json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        });
        let completion: Completion = serde_json::from_value(body).unwrap();
        assert_eq!(completion.choices[0].message.content, "hello");
        assert_eq!(completion.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_chat_request_decodes() {
        let body = json!({
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        });
        let request: ChatRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, "user");
    }
}
