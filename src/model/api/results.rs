use serde::{Deserialize, Serialize};

use crate::model::{
    common::form::{Answer, Question, QuestionId, QuestionType},
    db::{form::Form, response::Response},
    mongodb::Id,
};

/// Aggregated results for one form, reported back to the author.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct FormResults {
    pub form_id: Id,
    /// The number of stored responses for the form. Categorical
    /// percentages normalise against this, not against the number of
    /// answers to any particular question, so skipped questions show up
    /// as a gap rather than inflating the rest.
    pub total_responses: usize,
    pub questions: Vec<QuestionResults>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct QuestionResults {
    pub question_id: QuestionId,
    pub prompt: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub analytics: Analytics,
}

/// The analytic mode is keyed by the question type: scalar questions
/// average, choice questions count. Free-text questions do not aggregate
/// at all and are served through the raw response listing instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Analytics {
    Scalar {
        /// Arithmetic mean at full precision; round only for display.
        average: f64,
        count_answered: usize,
        max_scale: i64,
    },
    Frequency { buckets: Vec<Bucket> },
}

impl Analytics {
    /// The mean rounded to two decimal places, as shown to authors.
    pub fn display_average(&self) -> Option<f64> {
        match self {
            Self::Scalar { average, .. } => Some((average * 100.0).round() / 100.0),
            Self::Frequency { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub option: String,
    pub count: usize,
    /// Share of `total_responses`, in percent.
    pub percentage: f64,
}

impl FormResults {
    /// Aggregate every analysable question of the form over its responses.
    /// Questions appear in page order, matching the rendered numbering.
    pub fn compute(form: &Form, responses: &[Response]) -> Self {
        let total_responses = responses.len();
        let questions = form
            .pages()
            .iter()
            .flat_map(|page| page.questions().cloned().collect::<Vec<_>>())
            .filter_map(|question| {
                let analytics = if question.question_type.is_scalar() {
                    Some(scalar_analytics(&question, responses))
                } else if question.question_type.is_categorical() {
                    Some(frequency_analytics(&question, responses, total_responses))
                } else {
                    None
                };
                analytics.map(|analytics| QuestionResults {
                    question_id: question.id,
                    prompt: question.prompt.clone(),
                    question_type: question.question_type,
                    analytics,
                })
            })
            .collect();
        Self {
            form_id: form.id,
            total_responses,
            questions,
        }
    }
}

/// Mean of the numeric answers to one question. Missing, empty, and
/// non-numeric answers are excluded from both numerator and denominator.
fn scalar_analytics(question: &Question, responses: &[Response]) -> Analytics {
    let values: Vec<f64> = responses
        .iter()
        .filter_map(|response| response.answers.get(&question.id))
        .filter_map(|answer| match answer {
            Answer::Scalar(value) => Some(*value as f64),
            Answer::Text(text) => text.trim().parse::<f64>().ok(),
            Answer::MultiSelect(_) => None,
        })
        .collect();
    let count_answered = values.len();
    let average = if count_answered == 0 {
        0.0
    } else {
        values.iter().sum::<f64>() / count_answered as f64
    };
    Analytics::Scalar {
        average,
        count_answered,
        max_scale: question.max_scale(),
    }
}

/// Frequency table over the raw answer strings of one question. Each item
/// of a multi-select answer contributes one count independently. Buckets
/// are seeded from the declared options so zero-count options stay
/// visible, then sorted descending by count; ties keep option order.
fn frequency_analytics(
    question: &Question,
    responses: &[Response],
    total_responses: usize,
) -> Analytics {
    let mut buckets: Vec<(String, usize)> = question
        .options
        .iter()
        .filter(|option| !option.trim().is_empty())
        .map(|option| (option.clone(), 0))
        .collect();

    let mut tally = |value: &str| {
        if value.trim().is_empty() {
            return;
        }
        match buckets.iter_mut().find(|(option, _)| option == value) {
            Some((_, count)) => *count += 1,
            None => buckets.push((value.to_string(), 1)),
        }
    };
    for response in responses {
        match response.answers.get(&question.id) {
            Some(Answer::Text(value)) => tally(value),
            Some(Answer::MultiSelect(values)) => values.iter().for_each(|value| tally(value)),
            Some(Answer::Scalar(_)) | None => {}
        }
    }

    // Stable: equal counts keep their seeded (option) order.
    buckets.sort_by(|(_, a), (_, b)| b.cmp(a));
    let buckets = buckets
        .into_iter()
        .map(|(option, count)| Bucket {
            option,
            count,
            percentage: if total_responses == 0 {
                0.0
            } else {
                count as f64 / total_responses as f64 * 100.0
            },
        })
        .collect();
    Analytics::Frequency { buckets }
}
