// services/reply.rs - Elf reply generation via a chat-completion API
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ReplyConfig;
use crate::database::models::Elf;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API key is not configured")]
    MissingApiKey,

    #[error("invalid completion endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned status {0}")]
    Status(u16),

    #[error("completion API returned no text")]
    Empty,
}

/// Anything that can turn a prompt into reply text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/v1/chat/completions` client
pub struct OpenAiClient {
    http: Client,
    config: ReplyConfig,
}

impl OpenAiClient {
    pub fn new(config: ReplyConfig, timeout: Duration) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> Result<url::Url, CompletionError> {
        let base = url::Url::parse(&format!("{}/", self.config.api_base.trim_end_matches('/')))?;
        Ok(base.join("v1/chat/completions")?)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(self.endpoint()?)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::Status(response.status().as_u16()));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::Empty)
    }
}

pub fn build_prompt(letter: &str, elf: &Elf) -> String {
    format!(
        "You are {name}, a friendly elf at the North Pole. Your job is {job} and your personality is: {personality}.\n\n\
         A child has written you this letter:\n\"{letter}\"\n\n\
         Write a warm, magical, age-appropriate response (2-3 paragraphs max). \
         Be encouraging, mention life at the North Pole, and sign off as {name}. Use some emojis sparingly.",
        name = elf.name,
        job = elf.job,
        personality = elf.personality,
        letter = letter,
    )
}

/// The canned replies used whenever the completion call fails
pub fn fallback_replies(elf_name: &str) -> [String; 3] {
    [
        format!(
            "Oh my jingle bells! Thank you so much for your wonderful letter! Life at the North Pole is so magical - \
             we're busy making toys and singing carols! Keep being amazing! 🎄 Love, {elf_name}"
        ),
        format!(
            "Your letter made all the elves do a happy dance! We love hearing from you! The reindeer say hi too! ⭐ \
             Warmly, {elf_name}"
        ),
        format!(
            "What a lovely letter! Santa showed it to all of us and we're so happy! Keep spreading joy and kindness! ❄️ \
             Your friend, {elf_name}"
        ),
    ]
}

/// Produces reply text for a letter; never fails
#[derive(Clone)]
pub struct ReplyGenerator {
    client: Arc<dyn CompletionClient>,
}

impl ReplyGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn generate(&self, letter: &str, elf: &Elf) -> String {
        let prompt = build_prompt(letter, elf);
        match self.client.complete(&prompt).await {
            Ok(text) => {
                debug!("Generated reply from elf {}", elf.id);
                text
            }
            Err(e) => {
                warn!("Reply generation failed for elf {}, using fallback: {}", elf.id, e);
                let [a, b, c] = fallback_replies(&elf.name);
                match rand::thread_rng().gen_range(0..3) {
                    0 => a,
                    1 => b,
                    _ => c,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jingle() -> Elf {
        Elf {
            id: 1,
            name: "Jingle".to_string(),
            job: "Toy Workshop Lead".to_string(),
            personality: "cheerful".to_string(),
            emoji: None,
        }
    }

    struct Failing;

    #[async_trait]
    impl CompletionClient for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Status(500))
        }
    }

    struct Echo;

    #[async_trait]
    impl CompletionClient for Echo {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            Ok(format!("echo: {}", prompt.len()))
        }
    }

    #[test]
    fn test_prompt_embeds_elf_and_letter() {
        let prompt = build_prompt("I want a sled", &jingle());
        assert!(prompt.starts_with("You are Jingle, a friendly elf"));
        assert!(prompt.contains("Your job is Toy Workshop Lead"));
        assert!(prompt.contains("your personality is: cheerful"));
        assert!(prompt.contains("\"I want a sled\""));
        assert!(prompt.contains("sign off as Jingle"));
    }

    #[test]
    fn test_fallbacks_are_signed_by_elf() {
        for reply in fallback_replies("Tinsel") {
            assert!(reply.ends_with("Tinsel"), "fallback should be signed: {reply}");
        }
    }

    #[tokio::test]
    async fn test_generate_uses_client_text() {
        let generator = ReplyGenerator::new(Arc::new(Echo));
        let reply = generator.generate("hi", &jingle()).await;
        assert!(reply.starts_with("echo: "));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_error() {
        let generator = ReplyGenerator::new(Arc::new(Failing));
        let reply = generator.generate("hi", &jingle()).await;
        assert!(fallback_replies("Jingle").contains(&reply));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let mut config = crate::config::AppConfig::development().replies;
        config.api_key = None;
        let client = OpenAiClient::new(config, Duration::from_secs(1)).unwrap();
        assert!(matches!(client.complete("hi").await, Err(CompletionError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_join() {
        let mut config = crate::config::AppConfig::development().replies;
        config.api_base = "http://localhost:8080/".to_string();
        let client = OpenAiClient::new(config, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
