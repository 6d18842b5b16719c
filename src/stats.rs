use std::collections::HashMap;

use serde::Serialize;

use crate::models::question::{Question, QuestionType};

/// Counts per question type over the current draft.
pub fn type_histogram(questions: &[Question]) -> HashMap<QuestionType, usize> {
    let mut histogram = HashMap::new();
    for question in questions {
        *histogram.entry(question.question_type).or_insert(0) += 1;
    }
    histogram
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationKind {
    TooFewQuestions,
    NoEssay,
    TooManyMultipleChoice,
    TooManyTrueFalse,
}

/// Advisory hint for the exam author. Never blocks submission.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

const MIN_RECOMMENDED_QUESTIONS: usize = 5;
const MC_SHARE_LIMIT: f64 = 0.6;
const TF_SHARE_LIMIT: f64 = 0.3;
const TF_RULE_MIN_TOTAL: usize = 10;

/// Fixed rule set over the draft's question mix.
pub fn recommendations(questions: &[Question]) -> Vec<Recommendation> {
    let total = questions.len();
    let histogram = type_histogram(questions);
    let count = |t: QuestionType| *histogram.get(&t).unwrap_or(&0);

    let mut hints = Vec::new();

    if total < MIN_RECOMMENDED_QUESTIONS {
        hints.push(Recommendation {
            kind: RecommendationKind::TooFewQuestions,
            message: format!(
                "Only {} question(s) so far; aim for at least {} for a meaningful exam",
                total, MIN_RECOMMENDED_QUESTIONS
            ),
        });
    }

    if total > 0 && count(QuestionType::Essay) == 0 {
        hints.push(Recommendation {
            kind: RecommendationKind::NoEssay,
            message: "No essay question present; consider adding one for depth".to_string(),
        });
    }

    if total > 0 {
        let mc_share = count(QuestionType::MultipleChoice) as f64 / total as f64;
        if mc_share > MC_SHARE_LIMIT {
            hints.push(Recommendation {
                kind: RecommendationKind::TooManyMultipleChoice,
                message: "Multiple-choice questions dominate the exam; mix in other types"
                    .to_string(),
            });
        }
    }

    if total >= TF_RULE_MIN_TOTAL {
        let tf_share = count(QuestionType::TrueFalse) as f64 / total as f64;
        if tf_share > TF_SHARE_LIMIT {
            hints.push(Recommendation {
                kind: RecommendationKind::TooManyTrueFalse,
                message: "A large share of true/false questions makes guessing easy".to_string(),
            });
        }
    }

    hints
}
