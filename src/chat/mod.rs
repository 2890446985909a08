
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ChatConfig, OllamaConfig};
use crate::store::ScoredChunk;
use crate::{RagError, Result};

const CHAT_TIMEOUT_SECONDS: u64 = 600;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
}

/// Chat client against a local Ollama server's `/api/chat` endpoint
#[derive(Debug, Clone)]
pub struct OllamaChatEngine {
    base_url: Url,
    model: String,
    temperature: f32,
    system_prompt: String,
    agent: ureq::Agent,
}

impl OllamaChatEngine {
    #[inline]
    pub fn new(ollama: &OllamaConfig, chat: &ChatConfig) -> Result<Self> {
        let base_url = ollama
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(CHAT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: chat.model.clone(),
            temperature: chat.temperature,
            system_prompt: chat.system_prompt.clone(),
            agent,
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the message list: system prompt first, then prior history,
    /// then the new user message.
    fn build_messages(&self, user_message: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);

        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::system(self.system_prompt.clone()));
        }
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(user_message));

        messages
    }

    /// Send a message and wait for the complete reply.
    #[inline]
    pub fn chat(&self, user_message: &str, history: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(user_message, history),
            options: ChatOptions {
                temperature: self.temperature,
            },
            stream: false,
        };

        debug!(
            "Sending chat request with {} messages to model {}",
            request.messages.len(),
            self.model
        );

        let response_text = self.post_chat(&request)?;
        let response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| RagError::Chat(format!("Failed to parse chat response: {}", e)))?;

        Ok(response.message.content)
    }

    /// Send a message and stream the reply as content fragments.
    ///
    /// Ollama streams newline-delimited JSON objects; malformed lines are
    /// skipped, and the iterator ends at the final `done` marker.
    #[inline]
    pub fn chat_stream(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<impl Iterator<Item = Result<String>>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(user_message, history),
            options: ChatOptions {
                temperature: self.temperature,
            },
            stream: true,
        };

        let url = self.chat_url()?;
        let request_json = serde_json::to_string(&request)
            .map_err(|e| RagError::Chat(format!("Failed to serialize chat request: {}", e)))?;

        let response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .map_err(|e| RagError::Chat(format!("Chat request failed: {}", e)))?;

        let reader = BufReader::new(response.into_body().into_reader());
        let mut done = false;

        Ok(reader.lines().filter_map(move |line| {
            if done {
                return None;
            }
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(RagError::Chat(format!(
                        "Failed to read chat stream: {}",
                        e
                    ))));
                }
            };
            if line.is_empty() {
                return None;
            }
            let chunk: StreamChunk = match serde_json::from_str(&line) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("Skipping malformed stream line: {}", e);
                    return None;
                }
            };
            if chunk.done {
                done = true;
            }
            chunk
                .message
                .filter(|m| !m.content.is_empty())
                .map(|m| Ok(m.content))
        }))
    }

    fn chat_url(&self) -> Result<Url> {
        self.base_url
            .join("/api/chat")
            .map_err(|e| RagError::Chat(format!("Failed to build chat URL: {}", e)))
    }

    fn post_chat(&self, request: &ChatRequest) -> Result<String> {
        let url = self.chat_url()?;
        let request_json = serde_json::to_string(request)
            .map_err(|e| RagError::Chat(format!("Failed to serialize chat request: {}", e)))?;

        self.agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| RagError::Chat(format!("Chat request failed: {}", e)))
    }
}

/// Wrap a question in the retrieved context, producing the prompt sent to
/// the chat model when retrieval is enabled.
#[inline]
pub fn augment_with_context(question: &str, context: &[ScoredChunk]) -> String {
    if context.is_empty() {
        return question.to_string();
    }

    let joined = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following context, please answer the question.\n\n\
         Context:\n{joined}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}
