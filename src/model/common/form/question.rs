use rocket::FromFormField;
use serde::{Deserialize, Serialize};

use super::{QuestionId, SectionId};

/// The kinds of question an author can add to a form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[field(value = "multiple-choice")]
    MultipleChoice,
    #[field(value = "rating")]
    Rating,
    #[field(value = "text")]
    Text,
    #[field(value = "textarea")]
    Textarea,
    #[field(value = "checkbox")]
    Checkbox,
    #[field(value = "dropdown")]
    Dropdown,
    #[field(value = "linear-scale")]
    LinearScale,
}

impl QuestionType {
    /// Does this type carry an options list?
    /// `options` is meaningless for any other type and must be kept clear.
    pub fn has_options(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Checkbox | Self::Dropdown)
    }

    /// Is this type aggregated as a numeric average?
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Rating | Self::LinearScale)
    }

    /// Is this type aggregated as a frequency distribution?
    pub fn is_categorical(self) -> bool {
        self.has_options()
    }
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question unique ID.
    pub id: QuestionId,
    /// Question type; drives the answer shape and the analytics mode.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Question text. May be empty while editing, never when published.
    pub prompt: String,
    /// Optional helper text shown below the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the respondent must answer.
    pub required: bool,
    /// Possible answers; only meaningful for choice types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Scale lower bound; only meaningful for linear-scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Scale upper bound; only meaningful for linear-scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// The owning section, if any. Absence means the question is standalone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
    /// Position in the interleaved section/question sequence.
    /// Only used for standalone questions; section members follow their
    /// relative order within the question list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl Question {
    /// A blank question of the given type, as created by the composer.
    /// Choice types start with a single placeholder option; linear-scale
    /// starts with the default 1..=10 bounds.
    pub fn blank(question_type: QuestionType) -> Self {
        let options = if question_type.has_options() {
            vec!["Option 1".to_string()]
        } else {
            Vec::new()
        };
        let (min, max) = if question_type == QuestionType::LinearScale {
            (Some(1), Some(10))
        } else {
            (None, None)
        };
        Self {
            id: QuestionId::new(),
            question_type,
            prompt: String::new(),
            description: None,
            required: false,
            options,
            min,
            max,
            section_id: None,
            order: None,
        }
    }

    /// The top of the scale for scalar aggregation: 5 for rating, the
    /// configured `max` (default 10) for linear-scale.
    pub fn max_scale(&self) -> i64 {
        match self.question_type {
            QuestionType::Rating => 5,
            QuestionType::LinearScale => self.max.unwrap_or(10),
            _ => 0,
        }
    }
}

/// The value of a single answer. The shape is keyed by the question's
/// declared type: text-like and single-choice questions answer with a
/// string, rating and linear-scale with an integer, checkbox with a list
/// of selected options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Scalar(i64),
    Text(String),
    MultiSelect(Vec<String>),
}
