use super::config::OpenAiCompatibleConfig;
use super::convert::{self, ChatCompletionRequest, ChatCompletionResponse, StreamAccumulator};
use async_stream::try_stream;
use async_trait::async_trait;
use concierge_core::{ConciergeError, Llm, LlmRequest, LlmResponseStream};
use concierge_telemetry::Instrument;
use futures::StreamExt;
use reqwest::Client;
use serde_json::json;

/// Chat-completions client for any provider speaking the OpenAI wire format.
///
/// # Example
///
/// ```rust,ignore
/// use concierge_model::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
///
/// let groq = OpenAiCompatibleClient::new(OpenAiCompatibleConfig::groq(
///     std::env::var("GROQ_API_KEY")?,
///     "openai/gpt-oss-20b",
/// ))?;
/// let local = OpenAiCompatibleClient::new(OpenAiCompatibleConfig::ollama("deepseek-r1:7b"))?;
/// ```
pub struct OpenAiCompatibleClient {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleClient {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ConciergeError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ConciergeError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> ChatCompletionRequest {
        let messages = request.contents.iter().map(convert::content_to_message).collect();
        let tools =
            (!request.tools.is_empty()).then(|| convert::convert_tools(&request.tools));
        let config = request.config.as_ref();

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: config.and_then(|c| c.temperature),
            top_p: config.and_then(|c| c.top_p),
            max_tokens: config
                .and_then(|c| c.max_output_tokens)
                .map(|t| t as u32)
                .or(self.config.max_tokens),
            stream,
            stream_options: stream.then(|| json!({"include_usage": true})),
            tools,
            response_format: config
                .and_then(|c| c.response_schema.as_ref())
                .map(convert::response_format),
        }
    }
}

#[async_trait]
impl Llm for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream, ConciergeError> {
        let url = self.config.chat_completions_url();
        let api_key = self.config.api_key.clone();
        let provider = self.config.provider_name.clone();
        let chat_request = self.build_request(&request, stream);
        let client = self.client.clone();
        let span = concierge_telemetry::model_call_span(&provider, &self.config.model);

        tracing::debug!(
            provider = %provider,
            model = %self.config.model,
            messages = chat_request.messages.len(),
            stream,
            "Sending chat completion request"
        );

        let response_stream = try_stream! {
            // One attempt per call: any failure aborts the request.
            let response = async {
                let mut builder = client.post(&url).json(&chat_request);
                if !api_key.is_empty() {
                    builder = builder.bearer_auth(&api_key);
                }
                builder.send().await
            }
            .instrument(span)
            .await
            .map_err(|e| ConciergeError::Model(format!("{} API request failed: {}", provider, e)))?;
            let response = ensure_success(&provider, response).await?;

            if stream {
                let mut byte_stream = response.bytes_stream();
                let mut buffer = String::new();
                let mut accumulator = StreamAccumulator::default();

                'sse: while let Some(chunk) = byte_stream.next().await {
                    let chunk = chunk
                        .map_err(|e| ConciergeError::Model(format!("Stream read error: {}", e)))?;
                    buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(line_end) = buffer.find('\n') {
                        let line: String = buffer.drain(..=line_end).collect();
                        let Some(data) = line.trim().strip_prefix("data:") else { continue };
                        let data = data.trim();
                        if data == "[DONE]" {
                            break 'sse;
                        }
                        match serde_json::from_str::<ChatCompletionResponse>(data) {
                            Ok(chunk) => {
                                if let Some(partial) = accumulator.push(&chunk) {
                                    yield partial;
                                }
                            }
                            Err(e) => tracing::warn!("Failed to parse stream chunk: {} - {}", e, data),
                        }
                    }
                }

                yield accumulator.finish();
            } else {
                let body = response.text().await.map_err(|e| {
                    ConciergeError::Model(format!("Failed to read response: {}", e))
                })?;
                let chat_response: ChatCompletionResponse = serde_json::from_str(&body)
                    .map_err(|e| {
                        ConciergeError::Model(format!("Failed to parse response: {} - {}", e, body))
                    })?;

                yield convert::from_response(&chat_response);
            }
        };

        Ok(Box::pin(response_stream))
    }
}

async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ConciergeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(ConciergeError::Model(format!("{} API error ({}): {}", provider, status, error_text)))
}
