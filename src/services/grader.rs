use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::services::answer_key::{EvaluationDetail, MergedEntry};
use crate::services::splitter::{chat_with_retries, extract_chat_text};
use crate::services::vector_store::VectorStoreService;

/// Fixed marks ceiling per question; the oracle is prompted to stay within it.
pub(crate) const MAX_MARKS_PER_QUESTION: f64 = 5.0;

const PASSAGES_PER_QUESTION: usize = 2;

const GRADER_SYSTEM_PROMPT: &str = r#"You are an experienced examiner grading a student's written answers.

For every question you receive the question text, the reference answer from the
answer key, the student's answer (possibly empty), and retrieved passages from
the course reference material. Award marks for factual correctness and
completeness against the reference answer and passages. An empty student answer
scores 0.

Return strict JSON:

{
  "evaluations": [
    {"no": <question number>, "marks_awarded": <number between 0 and the stated maximum>, "feedback": "<one or two sentences for the student>"}
  ],
  "total_score": <sum of marks_awarded>
}

Produce exactly one evaluation per question, in the same order as the input.
Return only the JSON object, no commentary.
"#;

#[derive(Debug, Clone)]
pub(crate) struct GradeOutcome {
    pub(crate) details: Vec<EvaluationDetail>,
    pub(crate) total_score: f64,
}

#[derive(Debug, Deserialize)]
struct ItemVerdict {
    no: u32,
    marks_awarded: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct GradeResponse {
    evaluations: Vec<ItemVerdict>,
    #[serde(default)]
    total_score: Option<f64>,
}

/// Grading oracle: Cohere chat grounded in passages retrieved from the
/// context's embedded reference corpus.
#[derive(Debug, Clone)]
pub(crate) struct GraderService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    retriever: VectorStoreService,
}

impl GraderService {
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
            retriever: VectorStoreService::from_settings(settings)?,
        })
    }

    /// Grade the merged sequence against the reference corpus behind
    /// `context_key`. Evaluations come back in input order; anything else
    /// from the oracle is treated as an unusable result.
    pub(crate) async fn grade(
        &self,
        context_key: &str,
        entries: &[MergedEntry],
    ) -> Result<GradeOutcome> {
        if entries.is_empty() {
            return Ok(GradeOutcome { details: Vec::new(), total_score: 0.0 });
        }

        let timer = Instant::now();

        let mut questions = Vec::with_capacity(entries.len());
        for entry in entries {
            let passages = self
                .retriever
                .search(context_key, &entry.question, PASSAGES_PER_QUESTION)
                .await
                .context("Reference passage retrieval failed")?;

            questions.push(json!({
                "no": entry.no,
                "question": entry.question,
                "reference_answer": entry.answer_key,
                "student_answer": entry.student_answer,
                "reference_passages": passages,
            }));
        }

        let user_prompt = format!(
            "Maximum marks per question: {MAX_MARKS_PER_QUESTION}\n\nQuestions to grade:\n{}",
            serde_json::to_string_pretty(&Value::Array(questions)).unwrap_or_default()
        );

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": GRADER_SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt}
            ],
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"}
        });

        tracing::info!(context_key = %context_key, questions = entries.len(), "Sending grading request");

        let body = chat_with_retries(&self.client, &self.base_url, &self.api_key, &payload)
            .await
            .context("Grading request failed")?;

        let content = extract_chat_text(&body).context("Missing grader response content")?;
        let outcome = parse_grade_response(content, entries)?;

        tracing::info!(
            context_key = %context_key,
            total_score = outcome.total_score,
            duration_seconds = timer.elapsed().as_secs_f64(),
            "Grading completed"
        );

        Ok(outcome)
    }
}

/// Join the oracle's verdicts back onto the merged entries. The oracle must
/// return exactly one verdict per entry, in input order.
pub(super) fn parse_grade_response(
    content: &str,
    entries: &[MergedEntry],
) -> Result<GradeOutcome> {
    let response: GradeResponse =
        serde_json::from_str(content).context("Failed to parse grader JSON")?;

    if response.evaluations.len() != entries.len() {
        anyhow::bail!(
            "Grader returned {} evaluations for {} questions",
            response.evaluations.len(),
            entries.len()
        );
    }

    let mut details = Vec::with_capacity(entries.len());
    for (entry, verdict) in entries.iter().zip(response.evaluations.iter()) {
        if verdict.no != entry.no {
            anyhow::bail!(
                "Grader evaluation order mismatch: expected question {}, got {}",
                entry.no,
                verdict.no
            );
        }
        let marks = verdict.marks_awarded.clamp(0.0, MAX_MARKS_PER_QUESTION);
        details.push(EvaluationDetail {
            no: entry.no,
            question: entry.question.clone(),
            student_answer: entry.student_answer.clone(),
            answer_key: entry.answer_key.clone(),
            marks_awarded: marks,
            feedback: verdict.feedback.clone(),
        });
    }

    let summed: f64 = details.iter().map(|detail| detail.marks_awarded).sum();
    let total_score = response.total_score.unwrap_or(summed);

    Ok(GradeOutcome { details, total_score })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(no: u32, question: &str, student: &str, key: &str) -> MergedEntry {
        MergedEntry {
            no,
            question: question.to_string(),
            student_answer: student.to_string(),
            answer_key: key.to_string(),
        }
    }

    #[test]
    fn parse_grade_response_joins_verdicts_in_order() {
        let entries = vec![merged(1, "Q1", "ans1", "A1"), merged(2, "Q2", "", "A2")];
        let content = r#"{
            "evaluations": [
                {"no": 1, "marks_awarded": 4.5, "feedback": "Good."},
                {"no": 2, "marks_awarded": 0.0, "feedback": "Not attempted."}
            ],
            "total_score": 4.5
        }"#;

        let outcome = parse_grade_response(content, &entries).expect("parse");
        assert_eq!(outcome.details.len(), 2);
        assert_eq!(outcome.details[0].marks_awarded, 4.5);
        assert_eq!(outcome.details[0].question, "Q1");
        assert_eq!(outcome.details[1].student_answer, "");
        assert_eq!(outcome.total_score, 4.5);
    }

    #[test]
    fn parse_grade_response_sums_when_total_missing() {
        let entries = vec![merged(1, "Q1", "a", "A1"), merged(2, "Q2", "b", "A2")];
        let content = r#"{"evaluations": [
            {"no": 1, "marks_awarded": 2.0, "feedback": ""},
            {"no": 2, "marks_awarded": 3.0, "feedback": ""}
        ]}"#;

        let outcome = parse_grade_response(content, &entries).expect("parse");
        assert_eq!(outcome.total_score, 5.0);
    }

    #[test]
    fn parse_grade_response_clamps_marks_to_range() {
        let entries = vec![merged(1, "Q1", "a", "A1")];
        let content = r#"{"evaluations": [{"no": 1, "marks_awarded": 99.0, "feedback": ""}]}"#;

        let outcome = parse_grade_response(content, &entries).expect("parse");
        assert_eq!(outcome.details[0].marks_awarded, MAX_MARKS_PER_QUESTION);
    }

    #[test]
    fn parse_grade_response_rejects_length_mismatch() {
        let entries = vec![merged(1, "Q1", "a", "A1"), merged(2, "Q2", "b", "A2")];
        let content = r#"{"evaluations": [{"no": 1, "marks_awarded": 1.0, "feedback": ""}]}"#;
        assert!(parse_grade_response(content, &entries).is_err());
    }

    #[test]
    fn parse_grade_response_rejects_reordered_verdicts() {
        let entries = vec![merged(1, "Q1", "a", "A1"), merged(2, "Q2", "b", "A2")];
        let content = r#"{"evaluations": [
            {"no": 2, "marks_awarded": 1.0, "feedback": ""},
            {"no": 1, "marks_awarded": 1.0, "feedback": ""}
        ]}"#;
        assert!(parse_grade_response(content, &entries).is_err());
    }

    #[test]
    fn parse_grade_response_rejects_non_json() {
        let entries = vec![merged(1, "Q1", "a", "A1")];
        assert!(parse_grade_response("The student did well overall.", &entries).is_err());
    }
}
