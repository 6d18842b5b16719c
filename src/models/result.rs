use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scoring outcome computed by the backend. Correctness is never recomputed
/// on this side; these types only carry what the server returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub score: u32,
    pub total: u32,
    pub results: Vec<QuestionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: Uuid,
    /// Empty when the question was left unanswered.
    #[serde(default)]
    pub user_answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: String,
}

impl ExamResult {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.score) / f64::from(self.total)
        }
    }
}
