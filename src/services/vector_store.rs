use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;

const CHUNK_CLASS: &str = "ReferenceChunk";
const MAX_CHUNK_CHARS: usize = 1200;

/// Weaviate-compatible store for embedded reference corpora. Each context is
/// a set of text chunks tagged with its opaque `context_key`.
#[derive(Debug, Clone)]
pub(crate) struct VectorStoreService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VectorStoreService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.vector_store().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.vector_store().url.trim_end_matches('/').to_string(),
            api_key: settings.vector_store().api_key.clone(),
        })
    }

    /// Chunk the document and batch-insert it under `context_key`.
    pub(crate) async fn embed_and_store(&self, context_key: &str, document: &str) -> Result<()> {
        let chunks = chunk_document(document);
        if chunks.is_empty() {
            anyhow::bail!("Reference document produced no chunks");
        }

        let objects: Vec<Value> = chunks
            .iter()
            .enumerate()
            .map(|(index, text)| {
                json!({
                    "class": CHUNK_CLASS,
                    "properties": {
                        "contextKey": context_key,
                        "chunkIndex": index,
                        "text": text,
                    }
                })
            })
            .collect();

        let url = format!("{}/v1/batch/objects", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({"objects": objects}))
            .send()
            .await
            .context("Failed to call vector store")?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            anyhow::bail!("Vector store batch insert failed ({status}): {body}");
        }

        if let Some(failed) = first_batch_error(&body) {
            anyhow::bail!("Vector store rejected chunk: {failed}");
        }

        tracing::info!(context_key = %context_key, chunks = chunks.len(), "Reference corpus embedded");
        Ok(())
    }

    /// Top-`limit` chunks of the context semantically closest to `query`.
    pub(crate) async fn search(
        &self,
        context_key: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let graphql = format!(
            "{{ Get {{ {CHUNK_CLASS}(limit: {limit}, \
             nearText: {{concepts: [{concepts}]}}, \
             where: {{path: [\"contextKey\"], operator: Equal, valueText: {key}}}) \
             {{ text }} }} }}",
            concepts = json!(query),
            key = json!(context_key),
        );

        let url = format!("{}/v1/graphql", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({"query": graphql}))
            .send()
            .await
            .context("Failed to query vector store")?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            anyhow::bail!("Vector store search failed ({status}): {body}");
        }
        if let Some(errors) = body.get("errors").filter(|errors| !errors.is_null()) {
            anyhow::bail!("Vector store search errors: {errors}");
        }

        let chunks = body
            .get("data")
            .and_then(|data| data.get("Get"))
            .and_then(|get| get.get(CHUNK_CLASS))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(chunks)
    }

    /// Remove every chunk stored under `context_key`.
    pub(crate) async fn delete_context(&self, context_key: &str) -> Result<()> {
        let url = format!("{}/v1/batch/objects", self.base_url);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "match": {
                    "class": CHUNK_CLASS,
                    "where": {
                        "path": ["contextKey"],
                        "operator": "Equal",
                        "valueText": context_key,
                    }
                }
            }))
            .send()
            .await
            .context("Failed to call vector store")?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            anyhow::bail!("Vector store delete failed ({status}): {body}");
        }

        Ok(())
    }
}

fn first_batch_error(body: &Value) -> Option<String> {
    body.as_array()?
        .iter()
        .filter_map(|object| {
            object
                .get("result")
                .and_then(|result| result.get("errors"))
                .filter(|errors| !errors.is_null())
        })
        .next()
        .map(|errors| errors.to_string())
}

/// Split a document into search-sized chunks on paragraph boundaries,
/// falling back to a hard cut for oversized paragraphs.
pub(crate) fn chunk_document(document: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in document.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if !current.is_empty() && current.len() + paragraph.len() + 2 > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }

        if paragraph.len() > MAX_CHUNK_CHARS {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut rest = paragraph;
            while rest.len() > MAX_CHUNK_CHARS {
                let cut = floor_char_boundary(rest, MAX_CHUNK_CHARS);
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                current.push_str(rest);
            }
            continue;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut cut = index.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_document_keeps_small_paragraphs_together() {
        let doc = "First paragraph.\n\nSecond paragraph.";
        let chunks = chunk_document(doc);
        assert_eq!(chunks, vec!["First paragraph.\n\nSecond paragraph.".to_string()]);
    }

    #[test]
    fn chunk_document_splits_on_size() {
        let paragraph = "x".repeat(900);
        let doc = format!("{paragraph}\n\n{paragraph}");
        let chunks = chunk_document(&doc);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|chunk| chunk.len() <= MAX_CHUNK_CHARS));
    }

    #[test]
    fn chunk_document_hard_cuts_oversized_paragraph() {
        let doc = "y".repeat(3 * MAX_CHUNK_CHARS + 10);
        let chunks = chunk_document(&doc);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|chunk| chunk.len() <= MAX_CHUNK_CHARS));
    }

    #[test]
    fn chunk_document_ignores_blank_input() {
        assert!(chunk_document("  \n\n   ").is_empty());
    }

    #[test]
    fn first_batch_error_finds_object_errors() {
        let body = serde_json::json!([
            {"result": {"status": "SUCCESS"}},
            {"result": {"errors": {"error": [{"message": "boom"}]}}}
        ]);
        assert!(first_batch_error(&body).is_some());

        let clean = serde_json::json!([{"result": {"status": "SUCCESS"}}]);
        assert!(first_batch_error(&clean).is_none());
    }
}
