use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

use super::generator::{GenerationRequest, TextGenerator};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_URL: &str = "https://api.openai.com/v1";
const STRUCTURED_TOOL: &str = "submit_json";

/// Which remote generation service to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
}

impl Provider {
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Default writer model for the provider
    pub fn default_writer_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Default judge model for the provider
    pub fn default_judge_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::OpenAi => "o3-mini",
        }
    }
}

/// Connection settings for a generation client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub provider: Provider,
    /// API key (from ANTHROPIC_API_KEY / OPENAI_API_KEY)
    pub api_key: String,
    /// Override the API base URL (OpenAI-compatible endpoints)
    pub base_url: Option<String>,
    /// Maximum tokens in a response when the request does not say
    pub max_tokens: u32,
}

impl ClientConfig {
    /// Create config from environment variables
    pub fn from_env(provider: Provider) -> PipelineResult<Self> {
        let api_key = std::env::var(provider.api_key_var()).map_err(|_| {
            PipelineError::Transport(format!(
                "{} environment variable not set",
                provider.api_key_var()
            ))
        })?;

        Ok(Self::new(provider, api_key))
    }

    pub fn new(provider: Provider, api_key: String) -> Self {
        Self {
            provider,
            api_key,
            base_url: None,
            max_tokens: 4096,
        }
    }

    /// Build the client matching the configured provider
    pub fn into_generator(self) -> Box<dyn TextGenerator> {
        match self.provider {
            Provider::Anthropic => Box::new(AnthropicClient::new(self)),
            Provider::OpenAi => Box::new(OpenAiClient::new(self)),
        }
    }
}

async fn post_json<T: Serialize>(
    request: reqwest::RequestBuilder,
    body: &T,
    service: &str,
) -> PipelineResult<reqwest::Response> {
    let response = request
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| PipelineError::Transport(format!("failed to send request to {service}: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::Transport(format!(
            "{service} API error: {status} - {body}"
        )));
    }

    Ok(response)
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    config: ClientConfig,
}

impl AnthropicClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self) -> String {
        match &self.config.base_url {
            Some(base) => format!("{}/v1/messages", base.trim_end_matches('/')),
            None => ANTHROPIC_URL.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> PipelineResult<String> {
        // Structured output is a forced call to a single tool taking any object
        let (tools, tool_choice) = if request.structured {
            (
                vec![Tool {
                    name: STRUCTURED_TOOL.to_string(),
                    description: "Submit the requested JSON object".to_string(),
                    input_schema: serde_json::json!({"type": "object"}),
                }],
                Some(ToolChoice {
                    choice_type: "tool".to_string(),
                    name: STRUCTURED_TOOL.to_string(),
                }),
            )
        } else {
            (vec![], None)
        };

        let body = AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.sampling.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.sampling.temperature,
            system: Some(request.system.clone()),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user.clone(),
            }],
            tools,
            tool_choice,
        };

        debug!(model = %request.model, structured = request.structured, "sending Anthropic request");

        let http = self
            .client
            .post(self.url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01");
        let response: AnthropicResponse = post_json(http, &body, "Anthropic")
            .await?
            .json()
            .await?;

        // Prefer the tool input; fall back to text for models that answer in prose
        for block in &response.content {
            if block.content_type == "tool_use" && block.name.as_deref() == Some(STRUCTURED_TOOL) {
                if let Some(input) = &block.input {
                    return Ok(input.to_string());
                }
            }
        }

        let text: String = response
            .content
            .iter()
            .filter(|b| b.content_type == "text")
            .map(|b| b.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(PipelineError::Transport(
                "no text content in Anthropic response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

/// OpenAI (or compatible) Chat Completions client
pub struct OpenAiClient {
    client: Client,
    config: ClientConfig,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(OPENAI_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

/// Reasoning models reject a temperature parameter
pub fn is_reasoning_model(model: &str) -> bool {
    let model = model.to_lowercase();
    ["o1", "o3", "o4-mini"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

fn chat_request(request: &GenerationRequest, default_max_tokens: u32) -> ChatRequest {
    let reasoning = is_reasoning_model(&request.model);
    // Hidden reasoning tokens count against the cap; only send one if asked
    let max_tokens = if reasoning {
        request.sampling.max_tokens
    } else {
        Some(request.sampling.max_tokens.unwrap_or(default_max_tokens))
    };
    ChatRequest {
        model: request.model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: request.system.clone(),
            },
            Message {
                role: "user".to_string(),
                content: request.user.clone(),
            },
        ],
        temperature: if reasoning {
            None
        } else {
            request.sampling.temperature
        },
        max_completion_tokens: max_tokens,
        response_format: request.structured.then(|| ResponseFormat {
            format_type: "json_object".to_string(),
        }),
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> PipelineResult<String> {
        let body = chat_request(request, self.config.max_tokens);

        debug!(model = %request.model, structured = request.structured, "sending chat completion request");

        let http = self.client.post(self.url()).bearer_auth(&self.config.api_key);
        let response: ChatResponse = post_json(http, &body, "OpenAI").await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                PipelineError::Transport("no message content in chat completion".to_string())
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Sampling;

    fn request(model: &str, structured: bool) -> GenerationRequest {
        GenerationRequest {
            model: model.to_string(),
            system: "sys".to_string(),
            user: "usr".to_string(),
            sampling: Sampling::with_temperature(0.35),
            structured,
        }
    }

    #[test]
    fn test_reasoning_models_detected() {
        assert!(is_reasoning_model("o3-mini"));
        assert!(is_reasoning_model("O1-preview"));
        assert!(is_reasoning_model("o4-mini-2025"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
    }

    #[test]
    fn test_chat_request_omits_temperature_for_reasoning_models() {
        let body = serde_json::to_value(chat_request(&request("o3-mini", true), 4096)).unwrap();
        assert!(body.get("temperature").is_none());
        assert_eq!(body["response_format"]["type"], "json_object");

        let body = serde_json::to_value(chat_request(&request("gpt-4o-mini", false), 4096)).unwrap();
        assert_eq!(body["temperature"], 0.35);
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
    }

    #[test]
    fn test_reasoning_models_get_no_default_token_cap() {
        let body = serde_json::to_value(chat_request(&request("o3-mini", true), 4096)).unwrap();
        assert!(body.get("max_completion_tokens").is_none());

        let mut capped = request("o3-mini", true);
        capped.sampling.max_tokens = Some(8000);
        let body = serde_json::to_value(chat_request(&capped, 4096)).unwrap();
        assert_eq!(body["max_completion_tokens"], 8000);

        let body = serde_json::to_value(chat_request(&request("gpt-4o-mini", true), 4096)).unwrap();
        assert_eq!(body["max_completion_tokens"], 4096);
    }

    #[test]
    fn test_parse_anthropic_tool_response() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "name": "submit_json", "input": {"decision": "auto_ok"}}
            ]
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].name.as_deref(), Some(STRUCTURED_TOOL));
        assert_eq!(
            response.content[0].input.as_ref().unwrap()["decision"],
            "auto_ok"
        );
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new(Provider::OpenAi, "key".to_string());
        assert_eq!(config.max_tokens, 4096);
        assert!(config.base_url.is_none());
        assert_eq!(Provider::OpenAi.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(Provider::OpenAi.default_judge_model(), "o3-mini");
    }
}
