use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::form::{FormStatus, Page, Question, QuestionType, Schedule, Section},
    db::form::{Form, FormCore, FormOutline},
    mongodb::Id,
};

/// A form definition as submitted by the authoring UI.
///
/// Sections and questions arrive without IDs; the server issues them.
/// Positions in the two lists define the page order: each section and each
/// standalone question takes its list index as its order.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct FormSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct SectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct QuestionSpec {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    /// Index into the spec's `sections` list, absent for standalone
    /// questions. An out-of-range index is treated as standalone.
    #[serde(default)]
    pub section: Option<usize>,
}

impl From<FormSpec> for FormCore {
    fn from(spec: FormSpec) -> Self {
        let mut form = FormCore::new(spec.title, spec.description, spec.category);
        form.image_ref = spec.image_ref;

        form.sections = spec
            .sections
            .into_iter()
            .enumerate()
            .map(|(index, section)| {
                let mut built = Section::blank(index as i64);
                built.title = section.title;
                built.description = section.description;
                built
            })
            .collect();

        form.questions = spec
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, question)| {
                let section_id = question
                    .section
                    .and_then(|section| form.sections.get(section))
                    .map(|section| section.id);
                let mut built = Question::blank(question.question_type);
                built.prompt = question.prompt;
                built.description = question.description;
                built.required = question.required;
                if question.question_type.has_options() {
                    let options: Vec<String> = question
                        .options
                        .into_iter()
                        .filter(|option| !option.trim().is_empty())
                        .collect();
                    if !options.is_empty() {
                        built.options = options;
                    }
                }
                if question.question_type == QuestionType::LinearScale {
                    built.min = question.min.or(built.min);
                    built.max = question.max.or(built.max);
                }
                built.section_id = section_id;
                built.order = if section_id.is_none() {
                    Some(index as i64)
                } else {
                    None
                };
                built
            })
            .collect();

        form
    }
}

/// A partial metadata update; absent fields are left unchanged.
/// Questions and sections are edited through the composer operations, not
/// through this.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct FormMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_ref: Option<String>,
}

impl FormMetadata {
    pub fn apply(self, form: &mut FormCore) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(category) = self.category {
            form.category = Some(category);
        }
        if let Some(image_ref) = self.image_ref {
            form.image_ref = Some(image_ref);
        }
    }
}

/// Deserialize a doubly-optional field so that an absent field, an explicit
/// `null`, and a value are all distinguishable: absent leaves the target
/// unchanged, `null` clears it. (A plain nested `Option` folds `null` into
/// the outer `None`.)
fn clearable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A partial question update; absent fields are left unchanged. A type
/// change goes through the composer so that type-specific fields are
/// reinitialised, never left stale.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct QuestionPatch {
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub prompt: Option<String>,
    /// `null` removes the helper text.
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,
    pub required: Option<bool>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// `null` detaches the question from its section.
    #[serde(default, deserialize_with = "clearable")]
    pub section_id: Option<Option<Id>>,
}

impl QuestionPatch {
    /// Merge everything except the type, which the caller must apply
    /// through the composer first.
    pub fn apply(self, question: &mut Question) {
        if let Some(prompt) = self.prompt {
            question.prompt = prompt;
        }
        if let Some(description) = self.description {
            question.description = description;
        }
        if let Some(required) = self.required {
            question.required = required;
        }
        if question.question_type == QuestionType::LinearScale {
            if let Some(min) = self.min {
                question.min = Some(min);
            }
            if let Some(max) = self.max {
                question.max = Some(max);
            }
        }
        if let Some(section_id) = self.section_id {
            question.section_id = section_id;
        }
    }
}

/// A partial section update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct SectionPatch {
    pub title: Option<String>,
    /// `null` removes the blurb.
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,
}

impl SectionPatch {
    pub fn apply(self, section: &mut Section) {
        if let Some(title) = self.title {
            section.title = title;
        }
        if let Some(description) = self.description {
            section.description = description;
        }
    }
}

/// A submission window in API representation (RFC 3339 timestamps rather
/// than BSON dates).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<Schedule> for ScheduleView {
    fn from(schedule: Schedule) -> Self {
        Self {
            start_date: schedule.start_date,
            end_date: schedule.end_date,
        }
    }
}

/// A listing entry for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct FormDescription {
    pub id: Id,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleView>,
    pub question_count: usize,
}

impl FormDescription {
    pub fn new(outline: FormOutline, question_count: usize) -> Self {
        Self {
            id: outline.id,
            title: outline.title,
            description: outline.description,
            category: outline.category,
            status: outline.status,
            schedule: outline.schedule.map(ScheduleView::from),
            question_count,
        }
    }
}

/// The rendered questionnaire: what the preview and the respondent see.
/// The page sequence comes from the single shared ordering function, so
/// authors and respondents always see the same thing.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct FormView {
    pub id: Id,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleView>,
    pub pages: Vec<Page>,
}

impl FormView {
    pub fn new(form: &Form) -> Self {
        Self {
            id: form.id,
            title: form.title.clone(),
            description: form.description.clone(),
            category: form.category.clone(),
            image_ref: form.image_ref.clone(),
            status: form.status,
            schedule: form.schedule.map(ScheduleView::from),
            pages: form.pages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> FormSpec {
        FormSpec {
            title: "Course Eval".to_string(),
            description: String::new(),
            category: Some("Academics".to_string()),
            image_ref: None,
            sections: vec![SectionSpec {
                title: "Teaching".to_string(),
                description: None,
            }],
            questions: vec![
                QuestionSpec {
                    question_type: QuestionType::Rating,
                    prompt: "Rate the course".to_string(),
                    description: None,
                    required: true,
                    options: vec![],
                    min: None,
                    max: None,
                    section: None,
                },
                QuestionSpec {
                    question_type: QuestionType::MultipleChoice,
                    prompt: "Would you recommend it?".to_string(),
                    description: None,
                    required: false,
                    options: vec!["Yes".to_string(), "".to_string(), "No".to_string()],
                    min: None,
                    max: None,
                    section: Some(0),
                },
            ],
        }
    }

    #[test]
    fn spec_round_trip_preserves_question_content() {
        let form = FormCore::from(spec());
        for (built, original) in form.questions.iter().zip(spec().questions) {
            assert_eq!(built.question_type, original.question_type);
            assert_eq!(built.prompt, original.prompt);
            assert_eq!(built.required, original.required);
        }
        // Empty options are dropped, non-empty ones kept in order.
        assert_eq!(
            form.questions[1].options,
            vec!["Yes".to_string(), "No".to_string()]
        );
    }

    #[test]
    fn list_positions_become_orders() {
        let form = FormCore::from(spec());
        assert_eq!(form.sections[0].order, 0);
        // Standalone question at list index 0.
        assert_eq!(form.questions[0].order, Some(0));
        // Section member: ordered by its section, not independently.
        assert_eq!(form.questions[1].order, None);
        assert_eq!(form.questions[1].section_id, Some(form.sections[0].id));
    }

    #[test]
    fn out_of_range_section_index_falls_back_to_standalone() {
        let mut bad = spec();
        bad.questions[1].section = Some(7);
        let form = FormCore::from(bad);
        assert!(form.questions[1].section_id.is_none());
        assert_eq!(form.questions[1].order, Some(1));
    }

    #[test]
    fn choice_question_without_options_gets_the_placeholder() {
        let mut incomplete = spec();
        incomplete.questions[1].options = vec![];
        let form = FormCore::from(incomplete);
        assert_eq!(form.questions[1].options, vec!["Option 1".to_string()]);
    }

    #[test]
    fn patch_distinguishes_absent_null_and_value() {
        use rocket::serde::json::serde_json;

        let mut question = Question::blank(QuestionType::Text);
        question.description = Some("old helper text".to_string());
        question.section_id = Some(Id::new());

        // Absent fields leave everything untouched.
        let untouched: QuestionPatch = serde_json::from_str("{}").unwrap();
        untouched.apply(&mut question);
        assert_eq!(question.description.as_deref(), Some("old helper text"));
        assert!(question.section_id.is_some());

        // Explicit nulls clear.
        let cleared: QuestionPatch =
            serde_json::from_str(r#"{"description": null, "section_id": null}"#).unwrap();
        cleared.apply(&mut question);
        assert!(question.description.is_none());
        assert!(question.section_id.is_none());

        // Values set.
        let mut section = Section::blank(0);
        section.description = Some("blurb".to_string());
        let patch: SectionPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        patch.apply(&mut section);
        assert!(section.description.is_none());
        let patch: SectionPatch =
            serde_json::from_str(r#"{"description": "new blurb"}"#).unwrap();
        patch.apply(&mut section);
        assert_eq!(section.description.as_deref(), Some("new blurb"));
    }

    #[test]
    fn metadata_edit_is_refused_once_recipients_can_see_the_form() {
        let mut form = FormCore::example();
        let open = Schedule::normalise(Some(Utc::now()), None, chrono::Duration::days(30));
        form.deploy(open, form.audience.clone().unwrap(), vec![Id::new()])
            .unwrap();

        // The update path checks before applying anything.
        let patch = FormMetadata {
            title: Some("Renamed mid-deployment".to_string()),
            ..Default::default()
        };
        let allowed = form.ensure_updatable(Utc::now() + chrono::Duration::seconds(1));
        assert!(allowed.is_err());
        if allowed.is_ok() {
            patch.apply(&mut form);
        }
        assert_eq!(form.title, "Course Eval");
    }

    #[test]
    fn metadata_update_leaves_absent_fields_alone() {
        let mut form = FormCore::example();
        FormMetadata {
            title: Some("Renamed".to_string()),
            ..Default::default()
        }
        .apply(&mut form);
        assert_eq!(form.title, "Renamed");
        assert_eq!(form.category, Some("Academics".to_string()));
    }
}
