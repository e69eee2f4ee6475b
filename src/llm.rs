use crate::config::AppConfig;
use crate::models::{Message, Role};
use crate::session;
use crate::tokens::TokenBudget;
use anyhow::{bail, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

pub const AZURE_API_VERSION: &str = "2023-05-15";

/// Which provider/request-style combination a client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    OpenAiCompletion,
    OpenAiChat,
    AzureCompletion,
    AzureChat,
}

/// One turn against the model: send `prompt`, get the reply text back.
#[async_trait::async_trait]
pub trait AiClient: Send {
    async fn query(&mut self, prompt: &str) -> Result<String>;
    fn kind(&self) -> ClientKind;
}

#[derive(Debug, Clone)]
enum Target {
    OpenAi { api_base: String },
    Azure { endpoint: String, deployment: String },
}

/// Where and how requests are sent; shared by the completion and chat clients.
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    api_key: String,
    target: Target,
}

impl Transport {
    pub fn from_config(cfg: &AppConfig, http: Client) -> Self {
        let target = match &cfg.azure_endpoint {
            Some(endpoint) => Target::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment: cfg.deployment.to_string(),
            },
            None => Target::OpenAi { api_base: cfg.api_base.trim_end_matches('/').to_string() },
        };
        Self { http, api_key: cfg.api_key.clone(), target }
    }

    fn is_azure(&self) -> bool {
        matches!(self.target, Target::Azure { .. })
    }

    fn url(&self, operation: &str) -> String {
        match &self.target {
            Target::OpenAi { api_base } => format!("{}/{}", api_base, operation),
            Target::Azure { endpoint, deployment } => format!(
                "{}/openai/deployments/{}/{}?api-version={}",
                endpoint, deployment, operation, AZURE_API_VERSION
            ),
        }
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.target {
            Target::OpenAi { .. } => rb.bearer_auth(&self.api_key),
            Target::Azure { .. } => rb.header("api-key", &self.api_key),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, operation: &str, body: &B) -> Result<R> {
        let url = self.url(operation);
        tracing::debug!(%url, "sending request");
        let res = self.authorize(self.http.post(&url).json(body)).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            bail!("openai error {}: {}", status, text);
        }
        Ok(res.json().await?)
    }
}

fn single_choice<T>(mut choices: Vec<T>) -> Result<T> {
    tracing::debug!(choices = choices.len(), "response received");
    if choices.len() != 1 {
        bail!("expected choices to be 1 but received: {}", choices.len());
    }
    Ok(choices.remove(0))
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    n: u8,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// Plain text completion: the whole prompt history is resent every turn.
pub struct CompletionClient {
    transport: Transport,
    budget: TokenBudget,
    model: String,
    temperature: f32,
    choices: u8,
    prompts: Vec<String>,
}

impl CompletionClient {
    pub fn new(cfg: &AppConfig, transport: Transport) -> Result<Self> {
        Ok(Self {
            transport,
            budget: TokenBudget::new(cfg.deployment, cfg.max_tokens)?,
            model: cfg.deployment.to_string(),
            temperature: cfg.temperature,
            choices: cfg.choices,
            prompts: session::initial_prompts(&cfg.chat_context),
        })
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[async_trait::async_trait]
impl AiClient for CompletionClient {
    async fn query(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        let joined = self.prompts.join("\n");
        let max_tokens = self.budget.remaining(&joined)?;

        let body = CompletionRequest {
            model: (!self.transport.is_azure()).then_some(self.model.as_str()),
            prompt: &joined,
            max_tokens,
            temperature: self.temperature,
            n: self.choices,
        };
        let res: CompletionResponse = self.transport.post("completions", &body).await?;
        Ok(single_choice(res.choices)?.text)
    }

    fn kind(&self) -> ClientKind {
        if self.transport.is_azure() { ClientKind::AzureCompletion } else { ClientKind::OpenAiCompletion }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    n: u8,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Role-tagged chat: the transcript grows by a user and an assistant turn per call.
pub struct ChatClient {
    transport: Transport,
    budget: TokenBudget,
    model: String,
    temperature: f32,
    choices: u8,
    messages: Vec<Message>,
}

impl ChatClient {
    pub fn new(cfg: &AppConfig, transport: Transport) -> Result<Self> {
        Ok(Self {
            transport,
            budget: TokenBudget::new(cfg.deployment, cfg.max_tokens)?,
            model: cfg.deployment.to_string(),
            temperature: cfg.temperature,
            choices: cfg.choices,
            messages: session::initial_messages(&cfg.chat_context),
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[async_trait::async_trait]
impl AiClient for ChatClient {
    async fn query(&mut self, prompt: &str) -> Result<String> {
        self.messages.push(Message::new(Role::User, prompt));
        let serialized = serde_json::to_string(&self.messages)?;
        let max_tokens = self.budget.remaining(&serialized)?;

        let body = ChatRequest {
            model: (!self.transport.is_azure()).then_some(self.model.as_str()),
            messages: &self.messages,
            max_tokens,
            temperature: self.temperature,
            n: self.choices,
        };
        let res: ChatResponse = self.transport.post("chat/completions", &body).await?;
        let content = single_choice(res.choices)?.message.content.unwrap_or_default();
        self.messages.push(Message::new(Role::Assistant, content.clone()));
        Ok(content)
    }

    fn kind(&self) -> ClientKind {
        if self.transport.is_azure() { ClientKind::AzureChat } else { ClientKind::OpenAiChat }
    }
}

pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Pick the client variant from (Azure endpoint set?) x (chat deployment?).
pub fn new_ai_client(cfg: &AppConfig) -> Result<Box<dyn AiClient>> {
    let http = http_client(Duration::from_secs(cfg.timeout_secs))?;
    new_ai_client_with_http(cfg, http)
}

pub fn new_ai_client_with_http(cfg: &AppConfig, http: Client) -> Result<Box<dyn AiClient>> {
    let transport = Transport::from_config(cfg, http);
    let client: Box<dyn AiClient> = if cfg.deployment.is_chat() {
        Box::new(ChatClient::new(cfg, transport)?)
    } else {
        Box::new(CompletionClient::new(cfg, transport)?)
    };
    tracing::info!(kind = ?client.kind(), deployment = %cfg.deployment, "client selected");
    Ok(client)
}
