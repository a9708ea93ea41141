//! HTTP generation client for the chat backend.
//!
//! The backend exposes `POST /v1/chat` and answers either with a plain-text
//! body or with an SSE stream of delta frames. The client retries transient
//! failures with capped exponential backoff, supports cooperative
//! cancellation, treats a stalled stream as its own failure mode, and keeps
//! whatever partial text already arrived when a stream breaks mid-response.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::error::{MaestroError, Result};

pub mod sse;

use sse::SseDecoder;

/// Maximum number of request attempts before the error is surfaced.
pub const MAX_ATTEMPTS: u32 = 3;

/// Default for how long a stream may go without producing a chunk before
/// it is considered stalled.
const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay before retry number `attempt + 1`, given that `attempt` attempts
/// have failed. 1s base, doubling, capped at 5s.
pub fn backoff_delay(failed_attempts: u32) -> Duration {
    let millis = 1000u64.saturating_mul(1u64 << failed_attempts.saturating_sub(1).min(16));
    Duration::from_millis(millis.min(5000))
}

/// Connection settings for the chat backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:3000`
    pub endpoint: String,
    /// Model identifier forwarded to the backend
    pub model: Option<String>,
    /// API key forwarded to the backend (which holds the real provider
    /// credentials; this one is optional and pass-through)
    pub api_key: Option<String>,
    /// Upstream provider URL override, pass-through
    pub api_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// How long a response may go without producing a chunk before the
    /// read is treated as stalled.
    pub chunk_timeout: Duration,
}

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: None,
            api_key: None,
            api_url: None,
            temperature: None,
            max_tokens: None,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
        }
    }

    /// Resolve the API key from the environment, checking the dedicated
    /// variable first and then the common provider variables.
    pub fn api_key_from_env() -> Option<String> {
        Self::api_key_from(|name| std::env::var(name).ok())
    }

    fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        ["MAESTRO_API_KEY", "OPENAI_API_KEY", "DEEPSEEK_API_KEY", "ANTHROPIC_API_KEY"]
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
    }
}

/// Progress callback receiving each content fragment as it arrives.
pub type ProgressFn = Box<dyn FnMut(&str) + Send>;

/// Per-call options for [`TextGenerator::generate`].
#[derive(Default)]
pub struct GenerateOptions {
    pub system_prompt: Option<String>,
    pub on_progress: Option<ProgressFn>,
    pub cancel: Option<CancellationToken>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_progress(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    /// True when the text is a partial stream result or a local fallback
    /// rather than a complete backend response.
    pub degraded: bool,
}

/// Seam for anything that can turn a prompt into text. The plan manager and
/// the mode router depend on this trait rather than on the HTTP client.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<Generated>;
}

/// Request body for `POST /v1/chat`. Field names are part of the backend
/// wire contract.
#[derive(Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(rename = "apiKey", skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
    #[serde(rename = "apiUrl", skip_serializing_if = "Option::is_none")]
    api_url: Option<&'a str>,
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// HTTP client for the chat backend.
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Generate text, retrying transient failures up to [`MAX_ATTEMPTS`]
    /// times. Cancellation is never retried. A stream that broke after
    /// producing fragments returns the partial text as degraded instead of
    /// retrying, so progress fragments are never replayed.
    pub async fn generate(&self, prompt: &str, mut options: GenerateOptions) -> Result<Generated> {
        let mut last_error = MaestroError::backend("no attempts made").after_attempts(0);
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = backoff_delay(attempt - 1);
                debug!("retrying backend request in {delay:?} (attempt {attempt}/{MAX_ATTEMPTS})");
                tokio::time::sleep(delay).await;
            }
            match self.attempt(prompt, &mut options, attempt).await {
                Ok(generated) => return Ok(generated),
                Err(MaestroError::Cancelled) => return Err(MaestroError::Cancelled),
                Err(e) => {
                    warn!("backend attempt {attempt}/{MAX_ATTEMPTS} failed: {e}");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Like [`generate`](Self::generate), but absorbs backend failures into
    /// a locally simulated degraded response. Cancellation still propagates.
    pub async fn generate_or_simulate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<Generated> {
        match self.generate(prompt, options).await {
            Ok(generated) => Ok(generated),
            Err(MaestroError::Cancelled) => Err(MaestroError::Cancelled),
            Err(e) => {
                warn!("backend unavailable, using local fallback: {e}");
                Ok(Generated {
                    text: format!("You said: {prompt}. (local fallback)"),
                    degraded: true,
                })
            }
        }
    }

    /// Probe `GET /health`. Any transport error or non-2xx answer counts as
    /// unhealthy.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.endpoint.trim_end_matches('/'));
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("health check failed: {e}");
                false
            }
        }
    }

    async fn attempt(
        &self,
        prompt: &str,
        options: &mut GenerateOptions,
        attempt: u32,
    ) -> Result<Generated> {
        let url = format!("{}/v1/chat", self.config.endpoint.trim_end_matches('/'));
        let body = ChatRequest {
            prompt,
            model: self.config.model.as_deref(),
            api_key: self.config.api_key.as_deref(),
            api_url: self.config.api_url.as_deref(),
            system_prompt: options.system_prompt.as_deref(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        };

        let send = self.http.post(&url).json(&body).send();
        let response = if let Some(token) = options.cancel.clone() {
            tokio::select! {
                _ = token.cancelled() => return Err(MaestroError::Cancelled),
                response = send => response,
            }
        } else {
            send.await
        }
        .map_err(|e| MaestroError::backend(e.to_string()).after_attempts(attempt))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                MaestroError::backend(format!("backend returned status {status}"))
                    .after_attempts(attempt),
            );
        }

        let is_sse = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/event-stream"));

        if is_sse {
            self.read_stream(response, options, attempt).await
        } else {
            self.read_plain(response, options, attempt).await
        }
    }

    /// Read a non-streaming body in one piece and report it as a single
    /// progress fragment.
    async fn read_plain(
        &self,
        response: reqwest::Response,
        options: &mut GenerateOptions,
        attempt: u32,
    ) -> Result<Generated> {
        let read = timeout(self.config.chunk_timeout, response.text());
        let text = if let Some(token) = options.cancel.clone() {
            tokio::select! {
                _ = token.cancelled() => return Err(MaestroError::Cancelled),
                read = read => read,
            }
        } else {
            read.await
        }
        .map_err(|_| MaestroError::StreamStalled {
            seconds: self.config.chunk_timeout.as_secs(),
        })?
        .map_err(|e| MaestroError::backend(e.to_string()).after_attempts(attempt))?;

        if !text.is_empty() {
            if let Some(on_progress) = options.on_progress.as_mut() {
                on_progress(&text);
            }
        }
        Ok(Generated {
            text,
            degraded: false,
        })
    }

    /// Consume an SSE body chunk by chunk, forwarding fragments in arrival
    /// order. A break mid-stream keeps the accumulated text as a degraded
    /// result rather than discarding it.
    async fn read_stream(
        &self,
        response: reqwest::Response,
        options: &mut GenerateOptions,
        attempt: u32,
    ) -> Result<Generated> {
        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut text = String::new();

        loop {
            let next = timeout(self.config.chunk_timeout, stream.next());
            let chunk = if let Some(token) = options.cancel.clone() {
                tokio::select! {
                    _ = token.cancelled() => return Err(MaestroError::Cancelled),
                    chunk = next => chunk,
                }
            } else {
                next.await
            };

            let bytes = match chunk {
                Err(_elapsed) if text.is_empty() => {
                    return Err(MaestroError::StreamStalled {
                        seconds: self.config.chunk_timeout.as_secs(),
                    });
                }
                Err(_elapsed) => {
                    warn!("stream stalled after partial response, keeping {} bytes", text.len());
                    return Ok(Generated {
                        text,
                        degraded: true,
                    });
                }
                Ok(None) => break,
                Ok(Some(Err(e))) if text.is_empty() => {
                    return Err(MaestroError::backend(e.to_string()).after_attempts(attempt));
                }
                Ok(Some(Err(e))) => {
                    warn!("stream broke after partial response ({e}), keeping {} bytes", text.len());
                    return Ok(Generated {
                        text,
                        degraded: true,
                    });
                }
                Ok(Some(Ok(bytes))) => bytes,
            };

            let on_progress = &mut options.on_progress;
            decoder.push(&bytes, |fragment| {
                text.push_str(fragment);
                if let Some(cb) = on_progress.as_mut() {
                    cb(fragment);
                }
            });
            if decoder.is_done() {
                break;
            }
        }

        let on_progress = &mut options.on_progress;
        decoder.finish(|fragment| {
            text.push_str(fragment);
            if let Some(cb) = on_progress.as_mut() {
                cb(fragment);
            }
        });

        Ok(Generated {
            text,
            degraded: false,
        })
    }
}

#[async_trait]
impl TextGenerator for BackendClient {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<Generated> {
        BackendClient::generate(self, prompt, options).await
    }
}
