use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Number of options a multiple-choice question must carry.
pub const MC_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    /// Only meaningful for multiple-choice questions; ignored by validation
    /// for every other type.
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::Essay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::Essay => "essay",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Question {
    /// Editor template: fresh id, short-answer, everything else empty.
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            question_type: QuestionType::ShortAnswer,
            question_text: String::new(),
            options: Vec::new(),
            correct_answer: String::new(),
        }
    }

    /// A copy with a freshly generated id and otherwise identical fields.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

// The options rule depends on the question type, which the derive cannot
// express as a field-scoped error, so Validate is implemented by hand.
impl Validate for Question {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.question_text.is_empty() {
            errors.add("questionText", field_error("required", "questionText is required"));
        }
        if self.correct_answer.is_empty() {
            errors.add(
                "correctAnswer",
                field_error("required", "correctAnswer is required"),
            );
        }

        if self.question_type == QuestionType::MultipleChoice {
            if self.options.len() != MC_OPTION_COUNT {
                errors.add(
                    "options",
                    field_error("options_count", "must have exactly 4 options"),
                );
            } else if self.options.iter().any(|o| o.is_empty()) {
                errors.add(
                    "options",
                    field_error("options_filled", "all options must be filled"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
