use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::exam_dto::SaveExamRequest;
use crate::error::Result;
use crate::models::exam::Exam;
use crate::models::question::{Question, QuestionType, MC_OPTION_COUNT};
use crate::services::events::{ErrorKind, EventSink};
use crate::services::gateway::ExamGateway;

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    title: String,
    subject: String,
    questions: Vec<Question>,
}

impl Snapshot {
    fn of(title: &str, subject: &str, questions: &[Question]) -> Self {
        Self {
            title: title.to_string(),
            subject: subject.to_string(),
            questions: questions.to_vec(),
        }
    }
}

/// In-memory draft of an exam under editing. Holds the working copy plus the
/// origin snapshot it diverged from; `is_dirty` is structural inequality with
/// that snapshot. No operation validates eagerly; validation runs on submit
/// and via `validate()` for continuous inline display.
pub struct ExamEditor {
    exam_id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
    title: String,
    subject: String,
    questions: Vec<Question>,
    origin: Snapshot,
    gateway: Arc<dyn ExamGateway>,
    sink: Arc<dyn EventSink>,
}

impl ExamEditor {
    /// Edit a persisted exam.
    pub fn from_existing(exam: Exam, gateway: Arc<dyn ExamGateway>, sink: Arc<dyn EventSink>) -> Self {
        let origin = Snapshot::of(&exam.title, &exam.subject, &exam.questions);
        Self {
            exam_id: exam.id,
            created_at: exam.created_at,
            title: exam.title,
            subject: exam.subject,
            questions: exam.questions,
            origin,
            gateway,
            sink,
        }
    }

    /// Fresh draft: no id, empty title/subject, zero questions.
    pub fn blank(gateway: Arc<dyn ExamGateway>, sink: Arc<dyn EventSink>) -> Self {
        let origin = Snapshot::of("", "", &[]);
        Self {
            exam_id: None,
            created_at: None,
            title: String::new(),
            subject: String::new(),
            questions: Vec::new(),
            origin,
            gateway,
            sink,
        }
    }

    pub fn exam_id(&self) -> Option<Uuid> {
        self.exam_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_dirty(&self) -> bool {
        self.title != self.origin.title
            || self.subject != self.origin.subject
            || self.questions != self.origin.questions
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    /// Appends a blank short-answer question and returns its id.
    pub fn add_question(&mut self) -> Uuid {
        let question = Question::blank();
        let id = question.id;
        self.questions.push(question);
        id
    }

    /// Deleting down to zero questions is a legal transient state; it only
    /// becomes an error at submit time.
    pub fn remove_question(&mut self, index: usize) {
        if index < self.questions.len() {
            self.questions.remove(index);
        }
    }

    /// Clones the question at `index` under a fresh id and appends the copy
    /// at the end of the list.
    pub fn duplicate_question(&mut self, index: usize) -> Option<Uuid> {
        let copy = self.questions.get(index)?.duplicate();
        let id = copy.id;
        self.questions.push(copy);
        Some(id)
    }

    /// Moves one question to a new position, preserving the relative order of
    /// everything else. Out-of-range indices and `from == to` are no-ops.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from == to || from >= self.questions.len() || to >= self.questions.len() {
            return;
        }
        let question = self.questions.remove(from);
        self.questions.insert(to, question);
    }

    pub fn set_question_text(&mut self, index: usize, text: impl Into<String>) {
        if let Some(q) = self.questions.get_mut(index) {
            q.question_text = text.into();
        }
    }

    /// Switching to multiple-choice seeds the four empty option slots the
    /// form renders; other fields are left as they are.
    pub fn set_question_type(&mut self, index: usize, question_type: QuestionType) {
        if let Some(q) = self.questions.get_mut(index) {
            q.question_type = question_type;
            if question_type == QuestionType::MultipleChoice && q.options.is_empty() {
                q.options = vec![String::new(); MC_OPTION_COUNT];
            }
        }
    }

    pub fn set_option(&mut self, index: usize, option_index: usize, value: impl Into<String>) {
        if let Some(q) = self.questions.get_mut(index) {
            if let Some(slot) = q.options.get_mut(option_index) {
                *slot = value.into();
            }
        }
    }

    pub fn set_options(&mut self, index: usize, options: Vec<String>) {
        if let Some(q) = self.questions.get_mut(index) {
            q.options = options;
        }
    }

    pub fn set_correct_answer(&mut self, index: usize, value: impl Into<String>) {
        if let Some(q) = self.questions.get_mut(index) {
            q.correct_answer = value.into();
        }
    }

    /// The draft as an `Exam` value, e.g. for starting a preview delivery.
    pub fn to_exam(&self) -> Exam {
        Exam {
            id: self.exam_id,
            title: self.title.clone(),
            subject: self.subject.clone(),
            questions: self.questions.clone(),
            created_at: self.created_at,
        }
    }

    /// Aggregate validation of the current draft, field-scoped, for inline
    /// error display. Collects errors for every invalid question at once.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.to_exam().validate()
    }

    /// Restores title, subject, and questions from the origin snapshot.
    pub fn reset(&mut self) {
        self.title = self.origin.title.clone();
        self.subject = self.origin.subject.clone();
        self.questions = self.origin.questions.clone();
    }

    /// Validates and saves the draft: PATCH when the exam already has an id,
    /// POST for a never-saved draft. On success the origin snapshot moves to
    /// the saved state (clearing dirty) and the saved exam is returned so the
    /// caller can close the editor. On a request failure the draft is left
    /// intact and a single error notification is emitted; there is no retry.
    pub async fn submit(&mut self) -> Result<Exam> {
        self.validate()?;

        let payload = SaveExamRequest {
            title: self.title.clone(),
            subject: self.subject.clone(),
            questions: self.questions.clone(),
        };

        let saved = match self.exam_id {
            Some(id) => self.gateway.update_exam(id, payload).await,
            None => self.gateway.create_exam(payload).await,
        };

        match saved {
            Ok(exam) => {
                self.exam_id = exam.id;
                self.created_at = exam.created_at;
                self.origin = Snapshot::of(&self.title, &self.subject, &self.questions);
                info!("Exam {:?} saved", self.exam_id);
                self.sink.notify_success("Exam saved");
                Ok(exam)
            }
            Err(err) => {
                self.sink.notify_error(
                    ErrorKind::RequestFailed,
                    &format!("Failed to save exam: {}", err),
                );
                Err(err)
            }
        }
    }
}
