//! Chat-completions client for OpenAI-compatible providers.
//!
//! Groq, OpenAI and Cerebras all expose the same `/chat/completions` wire
//! format, so one client covers them; only the endpoint and API key differ.
//! The provider is picked from the model name.

use crate::config::Config;
use crate::llm::sse::{SseDecoder, SseEvent};
use crate::otel::{llm_span, LlmOperation};
use crate::types::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, Instrument};

/// Incremental text fragments from a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Fragments buffered between the HTTP reader task and the consumer.
const STREAM_BUFFER: usize = 32;

/// A remote text-completion model.
///
/// The pipeline only talks to this trait, so tests can substitute a scripted
/// model for the network client.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model identifier (for logs).
    fn model_name(&self) -> &str;

    /// Send `prompt` and wait for the complete response text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Send `prompt` and receive the response as it is generated.
    ///
    /// The stream is finite and cannot be restarted; each call is a new request.
    async fn stream(&self, prompt: &str) -> Result<TextStream, LlmError>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenAI,
    Cerebras,
}

impl LlmProvider {
    /// Infer the provider from a model identifier.
    ///
    /// - `gpt-*`, `o1*`, `o3*`, `o4*` → OpenAI
    /// - `cerebras:*` → Cerebras
    /// - anything else (e.g. `llama-3.1-8b-instant`) → Groq
    pub fn from_model(model: &str) -> Self {
        if model.starts_with("gpt-")
            || model.starts_with("o1")
            || model.starts_with("o3")
            || model.starts_with("o4")
        {
            LlmProvider::OpenAI
        } else if model.starts_with("cerebras:") {
            LlmProvider::Cerebras
        } else {
            LlmProvider::Groq
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAI => "openai",
            Self::Cerebras => "cerebras",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::OpenAI => "https://api.openai.com/v1/chat/completions",
            Self::Cerebras => "https://api.cerebras.ai/v1/chat/completions",
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Cerebras => "CEREBRAS_API_KEY",
        }
    }

    /// Model name as sent on the wire (routing prefix removed).
    fn wire_model<'a>(&self, model: &'a str) -> &'a str {
        match self {
            Self::Cerebras => model.strip_prefix("cerebras:").unwrap_or(model),
            _ => model,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

/// HTTP client for a chat-completions endpoint.
pub struct ChatClient {
    api_key: String,
    model: String,
    provider: LlmProvider,
    endpoint: String,
    temperature: f32,
    client: Client,
}

impl ChatClient {
    /// Create new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for the provider implied by `model`
    /// * `model` - Model identifier (e.g. "llama-3.1-8b-instant", "gpt-4o-mini")
    pub fn new(api_key: String, model: String) -> Self {
        let provider = LlmProvider::from_model(&model);
        Self {
            api_key,
            endpoint: provider.endpoint().to_string(),
            model,
            provider,
            temperature: 0.0,
            client: Client::new(),
        }
    }

    /// Create from configuration, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if the provider's key variable is unset.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = LlmProvider::from_model(&config.model);
        let var = provider.api_key_var();
        let api_key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey(var))?;

        let mut client = Self::new(api_key, config.model.clone()).with_temperature(config.temperature);
        if let Some(url) = &config.base_url {
            client = client.with_endpoint(url.clone());
        }
        Ok(client)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, prompt: &'a str, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: self.provider.wire_model(&self.model),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stream,
        }
    }

    async fn complete_inner(&self, prompt: &str) -> Result<String, LlmError> {
        let body = self.send(prompt, false).await?.text().await?;
        debug!(bytes = body.len(), "Completion received");

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text)
    }

    /// POST the prompt and return the response once the status is known good.
    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, stream))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionModel for ChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let span = llm_span(LlmOperation::Complete, &self.model, self.provider.as_str());
        self.complete_inner(prompt).instrument(span).await
    }

    async fn stream(&self, prompt: &str) -> Result<TextStream, LlmError> {
        let span = llm_span(LlmOperation::Stream, &self.model, self.provider.as_str());
        let response = self.send(prompt, true).instrument(span.clone()).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let body = Box::pin(response.bytes_stream());
        tokio::spawn(pump_events(body, tx).instrument(span));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Decode an SSE body into text fragments, forwarding them to `tx`.
///
/// Stops at `[DONE]`, at the end of the body, on the first error (which is
/// forwarded), or when the receiver is dropped.
pub(crate) async fn pump_events<S, B, E>(mut body: S, tx: mpsc::Sender<Result<String, LlmError>>)
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
{
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let events = match chunk {
            Ok(bytes) => decoder.push(bytes.as_ref()),
            Err(e) => {
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        };
        if !forward(events, &tx).await {
            return;
        }
    }

    forward(decoder.finish(), &tx).await;
}

/// Returns `false` once the stream should stop.
async fn forward(events: Vec<SseEvent>, tx: &mpsc::Sender<Result<String, LlmError>>) -> bool {
    for event in events {
        let item = match event {
            SseEvent::Done => return false,
            SseEvent::Data(data) => match parse_chunk(&data) {
                Ok(Some(text)) => Ok(text),
                Ok(None) => continue,
                Err(e) => Err(e),
            },
        };

        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            return false;
        }
    }
    true
}

/// Extract the text delta from one chunk, if it carries any.
fn parse_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: StreamChunk =
        serde_json::from_str(data).map_err(|e| LlmError::Decode(format!("{}: {}", e, data)))?;

    if let Some(err) = chunk.error {
        return Err(LlmError::Api {
            status: 200,
            body: err.message,
        });
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty()))
}
