use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config::Settings;

const SPLITTER_SYSTEM_PROMPT: &str = r#"You split scanned exam documents into discrete numbered items.

The input is the raw text extraction of either an answer-key document or a
student's answer paper. Identify every numbered item and return strict JSON:

{
  "items": [
    {"no": <positive integer question number>, "question": "<question text, empty string if the document only contains answers>", "answer": "<the answer text for this number>"}
  ]
}

Rules:
- Preserve the answer text verbatim, including formulas and working.
- Use the question numbering printed in the document; do not renumber.
- Do not invent items for numbers that are not present.
- Return only the JSON object, no commentary.
"#;

/// One item recognized in a document: `question` is populated for answer-key
/// documents and empty for student submissions. Order is not guaranteed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SplitEntry {
    pub(crate) no: u32,
    #[serde(default)]
    pub(crate) question: String,
    pub(crate) answer: String,
}

/// Question-splitter boundary: delegates document segmentation to the Cohere
/// chat API in JSON mode.
#[derive(Debug, Clone)]
pub(crate) struct SplitterService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl SplitterService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.cohere().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.cohere().api_key.clone(),
            base_url: settings.cohere().base_url.trim_end_matches('/').to_string(),
            model: settings.cohere().model.clone(),
            max_tokens: settings.cohere().max_tokens,
        })
    }

    pub(crate) async fn split(&self, raw_text: &str) -> Result<Vec<SplitEntry>> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SPLITTER_SYSTEM_PROMPT},
                {"role": "user", "content": raw_text}
            ],
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"}
        });

        let body = chat_with_retries(&self.client, &self.base_url, &self.api_key, &payload)
            .await
            .context("Question splitter request failed")?;

        let content = extract_chat_text(&body).context("Missing splitter response content")?;
        parse_split_response(content)
    }
}

/// POST a Cohere v2 chat payload with bounded exponential-backoff retries.
pub(super) async fn chat_with_retries(
    client: &Client,
    base_url: &str,
    api_key: &str,
    payload: &Value,
) -> Result<Value> {
    let url = format!("{base_url}/chat");
    let mut last_error = None;
    let mut body = Value::Null;

    for attempt in 0..=3 {
        let response = client.post(&url).bearer_auth(api_key).json(payload).send().await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                body = resp.json().await.unwrap_or(Value::Null);
                if status.is_success() {
                    last_error = None;
                    break;
                }
                let err = anyhow::anyhow!("Cohere API error ({status}): {body}");
                // A bad key or malformed payload will not improve on retry.
                if !is_retryable_status(status) {
                    return Err(err);
                }
                last_error = Some(err);
            }
            Err(err) => {
                last_error = Some(anyhow::anyhow!(err).context("Failed to call Cohere API"));
            }
        }

        if attempt < 3 {
            tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt as u32))).await;
        }
    }

    if let Some(err) = last_error {
        return Err(err);
    }

    Ok(body)
}

/// Only server faults and rate limits are retried.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Pull the text block out of a Cohere v2 chat response.
pub(super) fn extract_chat_text(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.get(0))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
}

pub(super) fn parse_split_response(content: &str) -> Result<Vec<SplitEntry>> {
    let value: Value =
        serde_json::from_str(content).context("Failed to parse splitter JSON")?;

    // Accept either the documented {"items": [...]} envelope or a bare array.
    let items = value.get("items").cloned().unwrap_or(value);
    let entries: Vec<SplitEntry> =
        serde_json::from_value(items).context("Splitter JSON has unexpected shape")?;

    for entry in &entries {
        if entry.no == 0 {
            anyhow::bail!("Splitter produced question number 0");
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_split_response_enveloped() {
        let content = r#"{"items": [
            {"no": 2, "question": "Define osmosis.", "answer": "Movement of water"},
            {"no": 1, "question": "", "answer": "Mitochondria"}
        ]}"#;

        let entries = parse_split_response(content).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].no, 2);
        assert_eq!(entries[1].question, "");
        assert_eq!(entries[1].answer, "Mitochondria");
    }

    #[test]
    fn parse_split_response_bare_array() {
        let content = r#"[{"no": 1, "answer": "x = 4"}]"#;
        let entries = parse_split_response(content).expect("parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "");
    }

    #[test]
    fn parse_split_response_rejects_zero_numbers() {
        let content = r#"{"items": [{"no": 0, "answer": "stray"}]}"#;
        assert!(parse_split_response(content).is_err());
    }

    #[test]
    fn parse_split_response_rejects_non_json() {
        assert!(parse_split_response("Sure! Here are the items:").is_err());
    }

    #[test]
    fn retries_cover_server_faults_and_rate_limits_only() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));

        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn extract_chat_text_reads_first_block() {
        let body = serde_json::json!({
            "message": {"content": [{"type": "text", "text": "{\"items\":[]}"}]}
        });
        assert_eq!(extract_chat_text(&body), Some("{\"items\":[]}"));
        assert_eq!(extract_chat_text(&serde_json::json!({})), None);
    }
}
