use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One question of the authoritative answer key, produced once at exam
/// creation by the question splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct KeyEntry {
    pub(crate) no: u32,
    pub(crate) question: String,
    pub(crate) answer: String,
}

/// One extracted answer from a student submission. May reference a question
/// number the key does not know about; the merge rejects those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SubmittedEntry {
    pub(crate) no: u32,
    pub(crate) answer: String,
}

/// Key question joined with the student's answer text, empty when the
/// submission skipped that question. Consumed by the grading oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MergedEntry {
    pub(crate) no: u32,
    pub(crate) question: String,
    pub(crate) student_answer: String,
    pub(crate) answer_key: String,
}

/// Per-question oracle verdict, persisted as part of the answer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EvaluationDetail {
    pub(crate) no: u32,
    pub(crate) question: String,
    pub(crate) student_answer: String,
    pub(crate) answer_key: String,
    pub(crate) marks_awarded: f64,
    pub(crate) feedback: String,
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum AnswerKeyError {
    #[error("question number 0 at position {position} (numbers start at 1)")]
    ZeroQuestionNo { position: usize },
    #[error("duplicate question number {no}")]
    DuplicateQuestionNo { no: u32 },
    #[error("question numbers out of order: {no} after {previous}")]
    OutOfOrder { previous: u32, no: u32 },
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum MergeError {
    #[error("submitted answer references question {no} which is not in the answer key")]
    AnswerKeyMismatch { no: u32 },
}

/// Answer key with a validated shape: strictly increasing question numbers,
/// no duplicates, all positive. Built at exam creation and rebuilt from
/// storage before every grading run, so the merge can rely on the ordering
/// invariant instead of trusting the caller.
#[derive(Debug, Clone)]
pub(crate) struct AnswerKey {
    entries: Vec<KeyEntry>,
}

impl AnswerKey {
    pub(crate) fn new(entries: Vec<KeyEntry>) -> Result<Self, AnswerKeyError> {
        let mut previous: Option<u32> = None;
        for (position, entry) in entries.iter().enumerate() {
            if entry.no == 0 {
                return Err(AnswerKeyError::ZeroQuestionNo { position });
            }
            if let Some(prev) = previous {
                if entry.no == prev {
                    return Err(AnswerKeyError::DuplicateQuestionNo { no: entry.no });
                }
                if entry.no < prev {
                    return Err(AnswerKeyError::OutOfOrder { previous: prev, no: entry.no });
                }
            }
            previous = Some(entry.no);
        }
        Ok(Self { entries })
    }

    pub(crate) fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<KeyEntry> {
        self.entries
    }
}

/// Stable sort by question number; splitter output carries no order guarantee.
pub(crate) fn sort_submitted(entries: &mut [SubmittedEntry]) {
    entries.sort_by_key(|entry| entry.no);
}

/// Reconcile a sorted submission against the answer key.
///
/// Two-cursor merge over both ascending sequences. Every key question yields
/// exactly one output entry, with an empty `student_answer` when the
/// submission has no matching number. A submitted number with no key entry is
/// upstream corruption and aborts the merge. Each iteration advances at least
/// one cursor, so the loop terminates even on malformed (duplicated) input.
pub(crate) fn merge(
    student_answers: &[SubmittedEntry],
    key: &AnswerKey,
) -> Result<Vec<MergedEntry>, MergeError> {
    let key_entries = key.entries();
    let mut merged = Vec::with_capacity(key_entries.len());
    let mut s = 0;
    let mut k = 0;

    while s < student_answers.len() || k < key_entries.len() {
        if s < student_answers.len()
            && k < key_entries.len()
            && student_answers[s].no == key_entries[k].no
        {
            merged.push(MergedEntry {
                no: key_entries[k].no,
                question: key_entries[k].question.clone(),
                student_answer: student_answers[s].answer.clone(),
                answer_key: key_entries[k].answer.clone(),
            });
            s += 1;
            k += 1;
        } else if k < key_entries.len()
            && (s == student_answers.len() || student_answers[s].no > key_entries[k].no)
        {
            // Unanswered key question: graded as blank.
            merged.push(MergedEntry {
                no: key_entries[k].no,
                question: key_entries[k].question.clone(),
                student_answer: String::new(),
                answer_key: key_entries[k].answer.clone(),
            });
            k += 1;
        } else {
            return Err(MergeError::AnswerKeyMismatch { no: student_answers[s].no });
        }
    }

    debug_assert_eq!(merged.len(), key_entries.len());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_entry(no: u32, question: &str, answer: &str) -> KeyEntry {
        KeyEntry { no, question: question.to_string(), answer: answer.to_string() }
    }

    fn submitted(no: u32, answer: &str) -> SubmittedEntry {
        SubmittedEntry { no, answer: answer.to_string() }
    }

    fn three_question_key() -> AnswerKey {
        AnswerKey::new(vec![
            key_entry(1, "Q1", "A1"),
            key_entry(2, "Q2", "A2"),
            key_entry(3, "Q3", "A3"),
        ])
        .expect("valid key")
    }

    #[test]
    fn merge_fills_gaps_with_blank_answers() {
        let key = three_question_key();
        let answers = vec![submitted(1, "ans1"), submitted(3, "ans3")];

        let merged = merge(&answers, &key).expect("merge");

        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged[0],
            MergedEntry {
                no: 1,
                question: "Q1".to_string(),
                student_answer: "ans1".to_string(),
                answer_key: "A1".to_string(),
            }
        );
        assert_eq!(merged[1].no, 2);
        assert_eq!(merged[1].student_answer, "");
        assert_eq!(merged[1].question, "Q2");
        assert_eq!(merged[1].answer_key, "A2");
        assert_eq!(merged[2].student_answer, "ans3");
    }

    #[test]
    fn merge_rejects_unknown_question_number() {
        let key = AnswerKey::new(vec![key_entry(1, "Q1", "A1")]).expect("valid key");
        let answers = vec![submitted(2, "strayAnswer")];

        let err = merge(&answers, &key).expect_err("mismatch");
        assert_eq!(err, MergeError::AnswerKeyMismatch { no: 2 });
    }

    #[test]
    fn merge_rejects_answer_numbered_between_key_questions() {
        let key = AnswerKey::new(vec![key_entry(1, "Q1", "A1"), key_entry(5, "Q5", "A5")])
            .expect("valid key");
        let answers = vec![submitted(1, "a"), submitted(3, "b")];

        let err = merge(&answers, &key).expect_err("mismatch");
        assert_eq!(err, MergeError::AnswerKeyMismatch { no: 3 });
    }

    #[test]
    fn empty_submission_yields_all_blank() {
        let key = three_question_key();

        let merged = merge(&[], &key).expect("merge");

        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|entry| entry.student_answer.is_empty()));
        assert_eq!(merged.iter().map(|entry| entry.no).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_submission_and_empty_key_is_success() {
        let key = AnswerKey::new(Vec::new()).expect("empty key");
        let merged = merge(&[], &key).expect("merge");
        assert!(merged.is_empty());
    }

    #[test]
    fn non_empty_submission_against_empty_key_is_mismatch() {
        let key = AnswerKey::new(Vec::new()).expect("empty key");
        let err = merge(&[submitted(1, "a")], &key).expect_err("mismatch");
        assert_eq!(err, MergeError::AnswerKeyMismatch { no: 1 });
    }

    #[test]
    fn key_with_gaps_is_valid_and_fully_emitted() {
        let key = AnswerKey::new(vec![key_entry(2, "Q2", "A2"), key_entry(7, "Q7", "A7")])
            .expect("gaps are questions, not errors");
        let merged = merge(&[submitted(7, "late")], &key).expect("merge");
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].student_answer, "");
        assert_eq!(merged[1].student_answer, "late");
    }

    #[test]
    fn duplicated_student_numbers_terminate_with_mismatch() {
        let key = AnswerKey::new(vec![key_entry(1, "Q1", "A1")]).expect("valid key");
        let answers = vec![submitted(1, "first"), submitted(1, "second")];

        // The second occurrence finds the key cursor already past question 1.
        let err = merge(&answers, &key).expect_err("mismatch");
        assert_eq!(err, MergeError::AnswerKeyMismatch { no: 1 });
    }

    #[test]
    fn answer_key_rejects_duplicates() {
        let err = AnswerKey::new(vec![key_entry(1, "Q1", "A1"), key_entry(1, "Q1", "A1")])
            .expect_err("duplicate");
        assert_eq!(err, AnswerKeyError::DuplicateQuestionNo { no: 1 });
    }

    #[test]
    fn answer_key_rejects_out_of_order_entries() {
        let err = AnswerKey::new(vec![key_entry(3, "Q3", "A3"), key_entry(2, "Q2", "A2")])
            .expect_err("out of order");
        assert_eq!(err, AnswerKeyError::OutOfOrder { previous: 3, no: 2 });
    }

    #[test]
    fn answer_key_rejects_zero_question_number() {
        let err = AnswerKey::new(vec![key_entry(0, "Q0", "A0")]).expect_err("zero");
        assert_eq!(err, AnswerKeyError::ZeroQuestionNo { position: 0 });
    }

    #[test]
    fn sort_submitted_is_stable_on_question_no() {
        let mut entries = vec![submitted(3, "c"), submitted(1, "a"), submitted(3, "c2")];
        sort_submitted(&mut entries);
        assert_eq!(entries[0].no, 1);
        assert_eq!(entries[1].answer, "c");
        assert_eq!(entries[2].answer, "c2");
    }
}
