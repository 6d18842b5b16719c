use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::question::Question;

/// Body for POST/PATCH `exams`: the full editable surface of an exam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveExamRequest {
    pub title: String,
    pub subject: String,
    pub questions: Vec<Question>,
}

/// Body for POST `exams/{id}/submit`. Keys are question ids; absent keys mean
/// the question was left unanswered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitAnswersRequest {
    pub answers: HashMap<Uuid, String>,
}

/// Body for POST `exams/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateExamRequest {
    pub subject: String,
    pub difficulty: Difficulty,
    pub counts: QuestionCounts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Requested number of questions per type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCounts {
    pub mcq: u32,
    pub true_false: u32,
    pub short: u32,
    pub essay: u32,
}
