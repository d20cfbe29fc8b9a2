//! OpenAI-compatible chat-completions enricher.
//!
//! # Invariants
//! - Every request carries a bounded timeout.
//! - The credential is never logged.
//! - Exactly one request per call; no retry.

use crate::enrich::parse::parse_enrichment;
use crate::enrich::prompt::{build_user_prompt, SYSTEM_PREAMBLE};
use crate::enrich::{EnrichUnavailable, Enricher, EnrichmentResult};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Enricher calling `{base_url}/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct HttpEnricher {
    base_url: String,
    model: String,
    timeout: Duration,
    api_key: Option<String>,
}

impl HttpEnricher {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout,
            api_key,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        let base = if base.is_empty() { DEFAULT_BASE_URL } else { base };
        format!("{base}/v1/chat/completions")
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Enricher for HttpEnricher {
    fn enrich(&self, term: &str, definition: &str) -> Result<EnrichmentResult, EnrichUnavailable> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(EnrichUnavailable::MissingCredential);
        };

        let started_at = Instant::now();
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| EnrichUnavailable::Transport(format!("failed to build http client: {err}")))?;

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PREAMBLE },
                { "role": "user", "content": build_user_prompt(term, definition) }
            ]
        });

        let url = self.endpoint();
        let resp = client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|err| {
                warn!(
                    "event=enrich_http module=enrich status=error error_code=transport timeout={}",
                    err.is_timeout()
                );
                EnrichUnavailable::Transport(err.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            warn!(
                "event=enrich_http module=enrich status=error error_code=http status_code={}",
                status.as_u16()
            );
            return Err(EnrichUnavailable::Http {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|err| EnrichUnavailable::BadEnvelope(err.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(
            "event=enrich_http module=enrich status=ok duration_ms={} reply_chars={}",
            started_at.elapsed().as_millis(),
            content.chars().count()
        );
        Ok(parse_enrichment(&content))
    }
}
