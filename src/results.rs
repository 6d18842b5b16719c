use serde::Serialize;
use uuid::Uuid;

use crate::models::exam::Exam;
use crate::models::question::QuestionType;
use crate::models::result::ExamResult;

/// Qualitative banding of a score, derived from `score / total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Perfect,
    Great,
    Practice,
}

impl ScoreBand {
    pub fn from_score(score: u32, total: u32) -> Self {
        if total > 0 && score == total {
            return ScoreBand::Perfect;
        }
        let ratio = if total == 0 {
            0.0
        } else {
            f64::from(score) / f64::from(total)
        };
        if ratio > 0.7 {
            ScoreBand::Great
        } else {
            ScoreBand::Practice
        }
    }

    pub fn banner(&self) -> &'static str {
        match self {
            ScoreBand::Perfect => "Perfect score! Outstanding work!",
            ScoreBand::Great => "Great job! You really know this material.",
            ScoreBand::Practice => "Keep practicing, you'll get there.",
        }
    }
}

/// One line of the review screen: the question next to what the server said
/// about the recorded answer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub user_answer: String,
    pub is_correct: bool,
    pub feedback: String,
}

/// Read model over a server-computed result, matched against the originating
/// exam's questions by id and presented in exam order. Correctness comes from
/// the result alone; nothing is regraded here.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    score: u32,
    total: u32,
    rows: Vec<ReviewRow>,
}

impl ResultsView {
    pub fn new(exam: &Exam, result: &ExamResult) -> Self {
        let rows = exam
            .questions
            .iter()
            .map(|question| {
                let entry = result
                    .results
                    .iter()
                    .find(|r| r.question_id == question.id);
                ReviewRow {
                    question_id: question.id,
                    question_text: question.question_text.clone(),
                    question_type: question.question_type,
                    user_answer: entry.map(|r| r.user_answer.clone()).unwrap_or_default(),
                    is_correct: entry.map(|r| r.is_correct).unwrap_or(false),
                    feedback: entry.map(|r| r.feedback.clone()).unwrap_or_default(),
                }
            })
            .collect();

        Self {
            score: result.score,
            total: result.total,
            rows,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn rows(&self) -> &[ReviewRow] {
        &self.rows
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score, self.total)
    }

    pub fn banner_message(&self) -> &'static str {
        self.band().banner()
    }
}
