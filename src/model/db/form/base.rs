use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rocket::{http::Status, FromFormField};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::{
            audience::Audience,
            form::{
                build_pages, FormStatus, Page, Question, QuestionId, QuestionType, Schedule,
                Section, SectionId,
            },
        },
        mongodb::Id,
    },
};

/// The direction of a reorder operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    #[field(value = "up")]
    Up,
    #[field(value = "down")]
    Down,
}

/// Core form data, as stored in the database.
///
/// Questions and sections are embedded: a form is loaded and saved as one
/// document, and all composer operations work on the in-memory value before
/// it is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCore {
    pub title: String,
    pub description: String,
    /// One of the administrator-managed category names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional reference to an uploaded banner image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub status: FormStatus,
    /// The authored audience description. Bound at deployment; may be set
    /// earlier while drafting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    /// The concrete recipients resolved from the audience at deployment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<Id>,
    /// The submission window. Present iff the form has been deployed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    pub sections: Vec<Section>,
    pub questions: Vec<Question>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl FormCore {
    /// A new, empty draft.
    pub fn new(title: String, description: String, category: Option<String>) -> Self {
        Self {
            title,
            description,
            category,
            image_ref: None,
            status: FormStatus::Draft,
            audience: None,
            recipients: Vec::new(),
            schedule: None,
            sections: Vec::new(),
            questions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The ordered page sequence, shared by the authoring preview and the
    /// respondent view.
    pub fn pages(&self) -> Vec<Page> {
        build_pages(&self.questions, &self.sections)
    }

    /// Questions and sections may only be edited while drafting.
    fn ensure_editable(&self) -> Result<()> {
        if self.status != FormStatus::Draft {
            return Err(Error::Status(
                Status::BadRequest,
                "Only draft forms can be edited".to_string(),
            ));
        }
        Ok(())
    }

    /// Top-level metadata may change while drafting, or on an active form
    /// whose window has not opened yet. Once recipients can see the form,
    /// it is frozen.
    pub fn ensure_updatable(&self, now: DateTime<Utc>) -> Result<()> {
        let updatable = match self.status {
            FormStatus::Draft => true,
            FormStatus::Active => self
                .schedule
                .map_or(false, |schedule| schedule.start_date > now),
            FormStatus::Template => false,
        };
        if !updatable {
            return Err(Error::Status(
                Status::BadRequest,
                "Cannot modify a form its recipients can already see".to_string(),
            ));
        }
        Ok(())
    }

    /// The next free position in the interleaved section/question sequence.
    fn next_order(&self) -> i64 {
        let section_max = self.sections.iter().map(|section| section.order).max();
        let standalone_max = self
            .questions
            .iter()
            .enumerate()
            .filter(|(_, question)| question.section_id.is_none())
            .map(|(index, question)| question.order.unwrap_or(index as i64))
            .max();
        section_max.max(standalone_max).map_or(0, |max| max + 1)
    }

    fn question_index(&self, question_id: QuestionId) -> Result<usize> {
        self.questions
            .iter()
            .position(|question| question.id == question_id)
            .ok_or_else(|| Error::not_found(format!("Question {question_id}")))
    }

    pub fn question(&self, question_id: QuestionId) -> Result<&Question> {
        let index = self.question_index(question_id)?;
        Ok(&self.questions[index])
    }

    pub fn question_mut(&mut self, question_id: QuestionId) -> Result<&mut Question> {
        let index = self.question_index(question_id)?;
        Ok(&mut self.questions[index])
    }

    fn section_index(&self, section_id: SectionId) -> Result<usize> {
        self.sections
            .iter()
            .position(|section| section.id == section_id)
            .ok_or_else(|| Error::not_found(format!("Section {section_id}")))
    }

    pub fn section_mut(&mut self, section_id: SectionId) -> Result<&mut Section> {
        let index = self.section_index(section_id)?;
        Ok(&mut self.sections[index])
    }

    /// Append a blank question of the given type at the end of the sequence.
    pub fn add_question(&mut self, question_type: QuestionType) -> Result<&Question> {
        self.ensure_editable()?;
        let mut question = Question::blank(question_type);
        question.order = Some(self.next_order());
        self.questions.push(question);
        Ok(self.questions.last().unwrap_or_else(|| unreachable!()))
    }

    /// Deep-copy a question, inserting the copy immediately after the
    /// source. The copy gets a fresh ID and a suffixed prompt.
    pub fn duplicate_question(&mut self, question_id: QuestionId) -> Result<QuestionId> {
        self.ensure_editable()?;
        let index = self.question_index(question_id)?;
        let mut copy = self.questions[index].clone();
        copy.id = QuestionId::new();
        if !copy.prompt.is_empty() {
            copy.prompt = format!("{} (Copy)", copy.prompt);
        }
        let copy_id = copy.id;
        self.questions.insert(index + 1, copy);
        Ok(copy_id)
    }

    pub fn delete_question(&mut self, question_id: QuestionId) -> Result<()> {
        self.ensure_editable()?;
        let index = self.question_index(question_id)?;
        self.questions.remove(index);
        Ok(())
    }

    /// Change a question's type. Crossing into or out of a choice type
    /// (re)initialises or clears the options list, and crossing into or out
    /// of linear-scale resets the bounds, so that no field is left stale.
    pub fn change_question_type(
        &mut self,
        question_id: QuestionId,
        question_type: QuestionType,
    ) -> Result<()> {
        self.ensure_editable()?;
        let question = self.question_mut(question_id)?;
        if question.question_type == question_type {
            return Ok(());
        }
        question.question_type = question_type;
        question.options = if question_type.has_options() {
            vec!["Option 1".to_string()]
        } else {
            Vec::new()
        };
        if question_type == QuestionType::LinearScale {
            question.min = Some(1);
            question.max = Some(10);
        } else {
            question.min = None;
            question.max = None;
        }
        Ok(())
    }

    /// Swap a question with its adjacent sibling in the same ordering
    /// context. Section members swap within the section's member list;
    /// standalone questions swap positions in the interleaved sequence.
    /// A move past either boundary is a no-op.
    pub fn move_question(
        &mut self,
        question_id: QuestionId,
        direction: MoveDirection,
    ) -> Result<()> {
        self.ensure_editable()?;
        let index = self.question_index(question_id)?;

        match self.questions[index].section_id {
            Some(section_id) => {
                // Members of a section order by position in the question
                // list, so swap the list entries.
                let siblings: Vec<usize> = self
                    .questions
                    .iter()
                    .enumerate()
                    .filter(|(_, question)| question.section_id == Some(section_id))
                    .map(|(position, _)| position)
                    .collect();
                let at = siblings
                    .iter()
                    .position(|&position| position == index)
                    .unwrap_or_else(|| unreachable!());
                let neighbour = match direction {
                    MoveDirection::Up => at.checked_sub(1).map(|at| siblings[at]),
                    MoveDirection::Down => siblings.get(at + 1).copied(),
                };
                if let Some(neighbour) = neighbour {
                    self.questions.swap(index, neighbour);
                }
            }
            None => {
                // Standalone questions order by their explicit position, so
                // swap the `order` values with the adjacent standalone.
                let mut standalones: Vec<(usize, i64)> = self
                    .questions
                    .iter()
                    .enumerate()
                    .filter(|(_, question)| question.section_id.is_none())
                    .map(|(position, question)| {
                        (position, question.order.unwrap_or(position as i64))
                    })
                    .collect();
                standalones.sort_by_key(|(_, order)| *order);
                let at = standalones
                    .iter()
                    .position(|&(position, _)| position == index)
                    .unwrap_or_else(|| unreachable!());
                let neighbour = match direction {
                    MoveDirection::Up => at.checked_sub(1).map(|at| standalones[at]),
                    MoveDirection::Down => standalones.get(at + 1).copied(),
                };
                if let Some((neighbour_index, neighbour_order)) = neighbour {
                    let own_order = standalones[at].1;
                    self.questions[index].order = Some(neighbour_order);
                    self.questions[neighbour_index].order = Some(own_order);
                }
            }
        }
        Ok(())
    }

    pub fn add_option(&mut self, question_id: QuestionId) -> Result<()> {
        self.ensure_editable()?;
        let question = self.question_mut(question_id)?;
        if !question.question_type.has_options() {
            return Err(Error::Status(
                Status::BadRequest,
                "This question type does not take options".to_string(),
            ));
        }
        let label = format!("Option {}", question.options.len() + 1);
        question.options.push(label);
        Ok(())
    }

    pub fn update_option(
        &mut self,
        question_id: QuestionId,
        index: usize,
        text: String,
    ) -> Result<()> {
        self.ensure_editable()?;
        let question = self.question_mut(question_id)?;
        let option = question
            .options
            .get_mut(index)
            .ok_or_else(|| Error::not_found(format!("Option {index}")))?;
        *option = text;
        Ok(())
    }

    /// Remove an option. Refused when only one remains: a choice question
    /// must always retain at least one option.
    pub fn delete_option(&mut self, question_id: QuestionId, index: usize) -> Result<()> {
        self.ensure_editable()?;
        let question = self.question_mut(question_id)?;
        if index >= question.options.len() {
            return Err(Error::not_found(format!("Option {index}")));
        }
        if question.options.len() == 1 {
            return Err(Error::Status(
                Status::BadRequest,
                "A choice question must keep at least one option".to_string(),
            ));
        }
        question.options.remove(index);
        Ok(())
    }

    /// Append a blank section at the end of the sequence.
    pub fn add_section(&mut self) -> Result<&Section> {
        self.ensure_editable()?;
        let section = Section::blank(self.next_order());
        self.sections.push(section);
        Ok(self.sections.last().unwrap_or_else(|| unreachable!()))
    }

    /// Delete a section. Member questions are NOT deleted; they keep their
    /// (now dangling) section reference and drop out of rendering until
    /// reassigned.
    pub fn delete_section(&mut self, section_id: SectionId) -> Result<()> {
        self.ensure_editable()?;
        let index = self.section_index(section_id)?;
        self.sections.remove(index);
        Ok(())
    }

    /// Swap a section with the adjacent section in the sequence.
    /// A move past either boundary is a no-op.
    pub fn move_section(&mut self, section_id: SectionId, direction: MoveDirection) -> Result<()> {
        self.ensure_editable()?;
        let index = self.section_index(section_id)?;

        let mut by_order: Vec<(usize, i64)> = self
            .sections
            .iter()
            .enumerate()
            .map(|(position, section)| (position, section.order))
            .collect();
        by_order.sort_by_key(|(_, order)| *order);
        let at = by_order
            .iter()
            .position(|&(position, _)| position == index)
            .unwrap_or_else(|| unreachable!());
        let neighbour = match direction {
            MoveDirection::Up => at.checked_sub(1).map(|at| by_order[at]),
            MoveDirection::Down => by_order.get(at + 1).copied(),
        };
        if let Some((neighbour_index, neighbour_order)) = neighbour {
            let own_order = by_order[at].1;
            self.sections[index].order = neighbour_order;
            self.sections[neighbour_index].order = own_order;
        }
        Ok(())
    }

    /// All the reasons this form cannot be published. Empty means
    /// publishable. Saving a draft never consults this list.
    pub fn validation_failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if self.title.trim().is_empty() {
            failures.push("Form has no title".to_string());
        }
        if self.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
            failures.push("Form has no category".to_string());
        }
        if self.audience.is_none() {
            failures.push("Form has no target audience".to_string());
        }
        if self.questions.is_empty() {
            failures.push("Form has no questions".to_string());
        }
        for (index, question) in self.questions.iter().enumerate() {
            let number = index + 1;
            if question.prompt.trim().is_empty() {
                failures.push(format!("Question {number} has an empty prompt"));
            }
            if question.question_type.has_options()
                && !question.options.iter().any(|option| !option.trim().is_empty())
            {
                failures.push(format!("Question {number} has no options"));
            }
            if question.question_type == QuestionType::LinearScale {
                let min = question.min.unwrap_or(1);
                let max = question.max.unwrap_or(10);
                if min >= max {
                    failures.push(format!("Question {number} has an empty scale range"));
                }
            }
        }
        failures
    }

    pub fn validate(&self) -> Result<()> {
        let failures = self.validation_failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(failures))
        }
    }

    /// Bind a schedule, audience, and resolved recipient set, and activate.
    ///
    /// Idempotent under retry: deploying an already-active form replaces
    /// the schedule, audience, and recipient set in place. An empty
    /// recipient set deploys anyway; the caller is expected to have warned
    /// the author.
    pub fn deploy(
        &mut self,
        schedule: Schedule,
        audience: Audience,
        recipients: Vec<Id>,
    ) -> Result<()> {
        if self.status == FormStatus::Template {
            return Err(Error::Status(
                Status::BadRequest,
                "Templates cannot be deployed".to_string(),
            ));
        }
        self.audience = Some(audience);
        self.validate()?;
        if recipients.is_empty() {
            warn!("Deploying form '{}' to zero recipients", self.title);
        }
        self.schedule = Some(schedule);
        self.recipients = recipients;
        self.status = FormStatus::Active;
        Ok(())
    }

    /// A fresh draft copy of this form, decoupled from the original: new
    /// question and section IDs, no schedule, no recipients.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.reissue_ids();
        copy.title = format!("{} (Copy)", self.title);
        copy.status = FormStatus::Draft;
        copy.schedule = None;
        copy.recipients = Vec::new();
        copy.created_at = Utc::now();
        copy
    }

    /// A reusable template made from this form: the questions and sections
    /// survive (with fresh IDs), deployment state does not.
    pub fn as_template(&self) -> Self {
        let mut template = self.clone();
        template.reissue_ids();
        template.status = FormStatus::Template;
        template.audience = None;
        template.schedule = None;
        template.recipients = Vec::new();
        template.created_at = Utc::now();
        template
    }

    /// Replace every question and section ID, keeping member references
    /// pointing at the right (new) sections.
    fn reissue_ids(&mut self) {
        for section in &mut self.sections {
            let new_id = SectionId::new();
            for question in &mut self.questions {
                if question.section_id == Some(section.id) {
                    question.section_id = Some(new_id);
                }
            }
            section.id = new_id;
        }
        for question in &mut self.questions {
            question.id = QuestionId::new();
        }
    }

    /// Every reason a submission at `now` would be rejected. The unique
    /// index on responses remains the authoritative double-submission
    /// guard; this is the best-effort pre-check.
    pub fn submission_blockers(
        &self,
        now: DateTime<Utc>,
        is_recipient: bool,
        already_submitted: bool,
    ) -> Vec<String> {
        let mut blockers = Vec::new();
        if self.status != FormStatus::Active {
            blockers.push("Form is not active".to_string());
        }
        match self.schedule {
            Some(schedule) if schedule.contains(now) => {}
            _ => blockers.push("Submission window is closed".to_string()),
        }
        if !is_recipient {
            blockers.push("You are not in this form's audience".to_string());
        }
        if already_submitted {
            blockers.push("You have already submitted a response".to_string());
        }
        blockers
    }
}

#[cfg(test)]
mod examples {
    use crate::model::common::audience::{Audience, AudienceType};

    use super::*;

    impl FormCore {
        /// A publishable single-question course evaluation draft.
        pub fn example() -> Self {
            let mut form = Self::new(
                "Course Eval".to_string(),
                "End of term course evaluation".to_string(),
                Some("Academics".to_string()),
            );
            form.audience = Some(Audience::everyone(AudienceType::Students));
            let mut question = Question::blank(QuestionType::Rating);
            question.prompt = "Rate the course".to_string();
            question.required = true;
            question.order = Some(0);
            form.questions.push(question);
            form
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn added_questions_take_successive_orders() {
        let mut form = FormCore::example();
        let first = form.add_question(QuestionType::Text).unwrap().id;
        let second = form.add_question(QuestionType::Textarea).unwrap().id;

        let first_order = form.question(first).unwrap().order;
        let second_order = form.question(second).unwrap().order;
        assert_eq!(first_order, Some(1));
        assert_eq!(second_order, Some(2));
    }

    #[test]
    fn sections_and_questions_share_the_order_sequence() {
        let mut form = FormCore::example();
        let section_order = form.add_section().unwrap().order;
        let question = form.add_question(QuestionType::Text).unwrap();
        assert_eq!(section_order, 1);
        assert_eq!(question.order, Some(2));
    }

    #[test]
    fn duplicate_question_lands_after_the_source_with_a_fresh_id() {
        let mut form = FormCore::example();
        let source = form.questions[0].id;
        let copy = form.duplicate_question(source).unwrap();

        assert_ne!(copy, source);
        assert_eq!(form.questions[1].id, copy);
        assert_eq!(form.questions[1].prompt, "Rate the course (Copy)");
        // Deep copy: editing the copy's options must not touch the source.
        assert_eq!(form.questions[0].prompt, "Rate the course");
    }

    #[test]
    fn type_change_reinitialises_type_specific_fields() {
        let mut form = FormCore::example();
        let id = form.questions[0].id;

        form.change_question_type(id, QuestionType::MultipleChoice)
            .unwrap();
        assert_eq!(
            form.question(id).unwrap().options,
            vec!["Option 1".to_string()]
        );

        form.update_option(id, 0, "Great".to_string()).unwrap();
        form.change_question_type(id, QuestionType::LinearScale)
            .unwrap();
        let question = form.question(id).unwrap();
        assert!(question.options.is_empty());
        assert_eq!(question.min, Some(1));
        assert_eq!(question.max, Some(10));

        form.change_question_type(id, QuestionType::Text).unwrap();
        let question = form.question(id).unwrap();
        assert!(question.options.is_empty());
        assert!(question.min.is_none() && question.max.is_none());
    }

    #[test]
    fn last_option_cannot_be_deleted() {
        let mut form = FormCore::example();
        let id = form.add_question(QuestionType::Dropdown).unwrap().id;

        form.add_option(id).unwrap();
        assert_eq!(form.question(id).unwrap().options.len(), 2);

        form.delete_option(id, 1).unwrap();
        assert!(form.delete_option(id, 0).is_err());
        assert_eq!(form.question(id).unwrap().options.len(), 1);
    }

    #[test]
    fn options_are_refused_on_non_choice_questions() {
        let mut form = FormCore::example();
        let id = form.add_question(QuestionType::Text).unwrap().id;
        assert!(form.add_option(id).is_err());
    }

    #[test]
    fn standalone_move_swaps_positions_in_the_page_sequence() {
        let mut form = FormCore::example();
        let first = form.questions[0].id;
        let second = form.add_question(QuestionType::Text).unwrap().id;

        form.move_question(second, MoveDirection::Up).unwrap();
        let pages = form.pages();
        assert!(matches!(&pages[0], Page::Standalone { question } if question.id == second));
        assert!(matches!(&pages[1], Page::Standalone { question } if question.id == first));

        // Moving past the top is a no-op.
        form.move_question(second, MoveDirection::Up).unwrap();
        assert!(
            matches!(&form.pages()[0], Page::Standalone { question } if question.id == second)
        );
    }

    #[test]
    fn section_member_move_stays_inside_the_section() {
        let mut form = FormCore::example();
        let standalone = form.questions[0].id;
        let section_id = form.add_section().unwrap().id;
        let first = form.add_question(QuestionType::Rating).unwrap().id;
        form.question_mut(first).unwrap().section_id = Some(section_id);
        let second = form.add_question(QuestionType::Rating).unwrap().id;
        form.question_mut(second).unwrap().section_id = Some(section_id);

        form.move_question(second, MoveDirection::Up).unwrap();
        let members: Vec<_> = form
            .questions
            .iter()
            .filter(|question| question.section_id == Some(section_id))
            .map(|question| question.id)
            .collect();
        assert_eq!(members, vec![second, first]);

        // The standalone question is a different ordering context; moving
        // the section's first member up again changes nothing.
        form.move_question(second, MoveDirection::Up).unwrap();
        assert_eq!(form.questions[0].id, standalone);
    }

    #[test]
    fn section_deletion_keeps_member_questions() {
        let mut form = FormCore::example();
        let section_id = form.add_section().unwrap().id;
        let member = form.add_question(QuestionType::Text).unwrap().id;
        form.question_mut(member).unwrap().section_id = Some(section_id);

        form.delete_section(section_id).unwrap();
        assert!(form.question(member).is_ok());
        assert!(form.sections.is_empty());
    }

    #[test]
    fn active_forms_are_not_editable() {
        let mut form = FormCore::example();
        form.deploy(
            Schedule::normalise(None, None, Duration::days(30)),
            Audience::everyone(crate::model::common::audience::AudienceType::Students),
            vec![Id::new()],
        )
        .unwrap();

        assert!(form.add_question(QuestionType::Text).is_err());
        assert!(form.add_section().is_err());
    }

    #[test]
    fn metadata_updates_freeze_once_the_window_opens() {
        let now = Utc::now();
        let mut form = FormCore::example();
        assert!(form.ensure_updatable(now).is_ok());

        // Deployed but not yet open: still updatable.
        let future = Schedule::normalise(Some(now + Duration::days(1)), None, Duration::days(30));
        form.deploy(future, form.audience.clone().unwrap(), vec![Id::new()])
            .unwrap();
        assert!(form.ensure_updatable(now).is_ok());

        // Window open: frozen.
        let open = Schedule::normalise(Some(now), None, Duration::days(30));
        form.deploy(open, form.audience.clone().unwrap(), vec![Id::new()])
            .unwrap();
        assert!(form.ensure_updatable(now + Duration::seconds(1)).is_err());
    }

    #[test]
    fn validation_enumerates_every_failure() {
        let mut form = FormCore::new(String::new(), String::new(), None);
        let scale = form.add_question(QuestionType::LinearScale).unwrap().id;
        {
            let question = form.question_mut(scale).unwrap();
            question.min = Some(5);
            question.max = Some(5);
        }
        let choice = form.add_question(QuestionType::Checkbox).unwrap().id;
        form.question_mut(choice).unwrap().options = vec!["  ".to_string()];

        let failures = form.validation_failures();
        // No title, no category, no audience, two empty prompts, blank
        // options, empty scale range.
        assert_eq!(failures.len(), 7);
        assert!(form.validate().is_err());
    }

    #[test]
    fn drafts_save_without_validating_but_publish_requires_it() {
        let form = FormCore::new("Untitled".to_string(), String::new(), None);
        // A draft with failures is a legal value; nothing in the model
        // prevents holding or storing it.
        assert!(!form.validation_failures().is_empty());

        let mut form = form;
        let result = form.deploy(
            Schedule::normalise(None, None, Duration::days(30)),
            Audience::everyone(crate::model::common::audience::AudienceType::AllUsers),
            vec![],
        );
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(form.status, FormStatus::Draft);
    }

    #[test]
    fn redeploying_updates_in_place() {
        let mut form = FormCore::example();
        let audience = form.audience.clone().unwrap();
        let first_window = Schedule::normalise(None, None, Duration::days(30));
        form.deploy(first_window, audience.clone(), vec![Id::new()])
            .unwrap();

        let second_window = Schedule::normalise(None, None, Duration::days(7));
        let replacement = vec![Id::new(), Id::new()];
        form.deploy(second_window, audience, replacement.clone())
            .unwrap();

        assert_eq!(form.status, FormStatus::Active);
        assert_eq!(form.schedule, Some(second_window));
        assert_eq!(form.recipients, replacement);
    }

    #[test]
    fn templates_cannot_be_deployed() {
        let form = FormCore::example();
        let mut template = form.as_template();
        let result = template.deploy(
            Schedule::normalise(None, None, Duration::days(30)),
            Audience::everyone(crate::model::common::audience::AudienceType::Students),
            vec![Id::new()],
        );
        assert!(result.is_err());
        assert_eq!(template.status, FormStatus::Template);
    }

    #[test]
    fn duplicate_reissues_every_id_but_keeps_structure() {
        let mut form = FormCore::example();
        let section_id = form.add_section().unwrap().id;
        let member = form.add_question(QuestionType::Rating).unwrap().id;
        form.question_mut(member).unwrap().section_id = Some(section_id);
        form.deploy(
            Schedule::normalise(None, None, Duration::days(30)),
            form.audience.clone().unwrap(),
            vec![Id::new()],
        )
        .unwrap();

        let copy = form.duplicate();
        assert_eq!(copy.title, "Course Eval (Copy)");
        assert_eq!(copy.status, FormStatus::Draft);
        assert!(copy.schedule.is_none());
        assert!(copy.recipients.is_empty());
        assert_eq!(copy.questions.len(), form.questions.len());

        // Every ID is fresh.
        for (original, copied) in form.questions.iter().zip(&copy.questions) {
            assert_ne!(original.id, copied.id);
        }
        assert_ne!(form.sections[0].id, copy.sections[0].id);
        // Membership still points at the copied section.
        assert_eq!(copy.questions[1].section_id, Some(copy.sections[0].id));
    }

    #[test]
    fn template_keeps_questions_and_drops_deployment_state() {
        let mut form = FormCore::example();
        form.deploy(
            Schedule::normalise(None, None, Duration::days(30)),
            form.audience.clone().unwrap(),
            vec![Id::new()],
        )
        .unwrap();

        let template = form.as_template();
        assert_eq!(template.status, FormStatus::Template);
        assert!(template.audience.is_none());
        assert!(template.schedule.is_none());
        assert!(template.recipients.is_empty());
        assert_eq!(template.questions.len(), 1);
        assert_ne!(template.questions[0].id, form.questions[0].id);
    }

    #[test]
    fn submission_blockers_report_every_reason() {
        let mut form = FormCore::example();
        let now = Utc::now();

        // Not yet deployed: inactive and windowless.
        let blockers = form.submission_blockers(now, true, false);
        assert_eq!(blockers.len(), 2);

        form.deploy(
            Schedule::normalise(Some(now), None, Duration::days(30)),
            form.audience.clone().unwrap(),
            vec![Id::new()],
        )
        .unwrap();

        assert!(form.submission_blockers(now, true, false).is_empty());
        assert_eq!(form.submission_blockers(now, false, true).len(), 2);

        // Window closed.
        let late = now + Duration::days(31);
        assert_eq!(form.submission_blockers(late, true, false).len(), 1);
    }
}
