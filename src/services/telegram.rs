// src/services/telegram.rs

//! Telegram delivery.
//!
//! The engine only sees [`ChatTransport`]; [`TelegramTransport`] is the
//! production implementation talking to the Bot API over HTTPS.

use crate::utils::{AlertResult, Logger, SentinelError, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org/";

/// Message bodies are built with HTML markup, so that is the only mode sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
        }
    }
}

/// Formatting options passed with every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    pub parse_mode: ParseMode,
    pub disable_web_page_preview: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::Html,
            disable_web_page_preview: true,
        }
    }
}

/// Outbound chat channel. A returned error means the message was not delivered.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, text: &str, options: &SendOptions) -> AlertResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub is_test_mode: bool,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            is_test_mode: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl TelegramConfig {
    pub fn from_env() -> AlertResult<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| SentinelError::config_error("Missing TELEGRAM_BOT_TOKEN"))?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .map_err(|_| SentinelError::config_error("Missing TELEGRAM_CHAT_ID"))?;

        let config = Self {
            bot_token,
            chat_id,
            is_test_mode: std::env::var("TELEGRAM_TEST_MODE")
                .map(|s| s == "true")
                .unwrap_or(false),
            api_base_url: std::env::var("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AlertResult<()> {
        if self.bot_token.trim().is_empty() {
            return Err(SentinelError::config_error("Telegram bot token cannot be empty"));
        }
        if self.chat_id.trim().is_empty() {
            return Err(SentinelError::config_error("Telegram chat id cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(SentinelError::config_error(
                "Telegram request timeout must be greater than 0",
            ));
        }
        Url::parse(&self.api_base_url)?;
        Ok(())
    }

    /// `{api_base_url}/bot{token}/sendMessage`
    pub fn send_message_url(&self) -> AlertResult<Url> {
        let mut base = self.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)?.join(&format!("bot{}/sendMessage", self.bot_token))?;
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Exponential backoff, capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

pub struct TelegramTransport {
    config: TelegramConfig,
    endpoint: Url,
    http_client: Client,
    retry_config: RetryConfig,
    logger: Logger,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> AlertResult<Self> {
        config.validate()?;
        let endpoint = config.send_message_url()?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SentinelError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            endpoint,
            http_client,
            retry_config: RetryConfig::default(),
            logger: Logger::for_component("telegram"),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    fn build_payload(&self, text: &str, options: &SendOptions) -> Value {
        json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": options.parse_mode.as_str(),
            "disable_web_page_preview": options.disable_web_page_preview,
        })
    }

    async fn send_request(&self, payload: &Value) -> Result<Value, TransportError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = serde_json::from_str(&body)?;
        if !result["ok"].as_bool().unwrap_or(false) {
            let description = result["description"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();
            return Err(TransportError::Rejected(description));
        }

        Ok(result)
    }
}

/// Connection problems, rate limiting and server errors are worth retrying.
fn is_transient(err: &TransportError) -> bool {
    match err {
        TransportError::Http(_) => true,
        TransportError::Api { status, .. } => *status == 429 || *status >= 500,
        TransportError::Rejected(_) | TransportError::Parse(_) => false,
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, text: &str, options: &SendOptions) -> AlertResult<()> {
        let payload = self.build_payload(text, options);

        if self.config.is_test_mode {
            self.logger
                .info_with_meta("Test mode: message not sent to Telegram", Some(&payload));
            return Ok(());
        }

        let mut attempt = 0;
        loop {
            match self.send_request(&payload).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt < self.retry_config.max_retries && is_transient(&e) => {
                    let delay = self.retry_config.delay_for(attempt);
                    self.logger.warn(&format!(
                        "Telegram request failed, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        self.retry_config.max_retries,
                        e
                    ));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
