use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Question, Section, SectionId};

/// The unit of navigation shown to a respondent: either one standalone
/// question, or one section together with all of its member questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page {
    Standalone { question: Question },
    Grouped {
        section: Section,
        questions: Vec<Question>,
    },
}

impl Page {
    /// All questions on this page, in presentation order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        match self {
            Self::Standalone { question } => std::slice::from_ref(question).iter(),
            Self::Grouped { questions, .. } => questions.iter(),
        }
    }
}

/// Merge sections and standalone questions into the ordered page sequence.
///
/// One entry is produced per section (at `section.order`) and per standalone
/// question (at `question.order`, defaulting to its position index in the
/// question list), stable-sorted ascending. Section members are inlined in
/// their relative order of appearance in the question list, not separately
/// sorted.
///
/// This function is pure and deterministic, and is the single source of
/// page order for the authoring preview and the respondent view alike.
/// A question referencing a section that no longer exists is reported and
/// excluded from rendering.
pub fn build_pages(questions: &[Question], sections: &[Section]) -> Vec<Page> {
    let section_ids: HashSet<SectionId> = sections.iter().map(|section| section.id).collect();

    enum Entry<'a> {
        Section(&'a Section),
        Standalone(&'a Question),
    }

    // Sections first, so that an order tie resolves section-before-question.
    let mut entries: Vec<(i64, Entry)> = sections
        .iter()
        .map(|section| (section.order, Entry::Section(section)))
        .collect();
    for (index, question) in questions.iter().enumerate() {
        match question.section_id {
            None => {
                let order = question.order.unwrap_or(index as i64);
                entries.push((order, Entry::Standalone(question)));
            }
            Some(section_id) if !section_ids.contains(&section_id) => {
                warn!(
                    "Question {} references missing section {}; excluded from rendering",
                    question.id, section_id
                );
            }
            // Inlined under its section below.
            Some(_) => {}
        }
    }
    entries.sort_by_key(|(order, _)| *order);

    entries
        .into_iter()
        .map(|(_, entry)| match entry {
            Entry::Standalone(question) => Page::Standalone {
                question: question.clone(),
            },
            Entry::Section(section) => Page::Grouped {
                section: section.clone(),
                questions: questions
                    .iter()
                    .filter(|question| question.section_id == Some(section.id))
                    .cloned()
                    .collect(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::model::common::form::QuestionType;

    use super::*;

    fn standalone(order: Option<i64>) -> Question {
        let mut question = Question::blank(QuestionType::Text);
        question.order = order;
        question
    }

    fn member_of(section: &Section) -> Question {
        let mut question = Question::blank(QuestionType::Rating);
        question.section_id = Some(section.id);
        question
    }

    #[test]
    fn standalone_questions_interleave_with_sections_by_order() {
        let s1 = Section::blank(1);
        let s2 = Section::blank(3);
        let q = standalone(Some(2));

        let pages = build_pages(&[q.clone()], &[s1.clone(), s2.clone()]);
        assert_eq!(pages.len(), 3);
        assert!(matches!(&pages[0], Page::Grouped { section, .. } if section.id == s1.id));
        assert!(matches!(&pages[1], Page::Standalone { question } if question.id == q.id));
        assert!(matches!(&pages[2], Page::Grouped { section, .. } if section.id == s2.id));
    }

    #[test]
    fn page_order_is_deterministic() {
        let s1 = Section::blank(0);
        let s2 = Section::blank(2);
        let questions = vec![
            member_of(&s1),
            standalone(Some(1)),
            member_of(&s2),
            member_of(&s1),
            standalone(Some(3)),
        ];
        let sections = vec![s1, s2];

        let first = build_pages(&questions, &sections);
        let second = build_pages(&questions, &sections);
        assert_eq!(first, second);
    }

    #[test]
    fn section_members_keep_their_relative_insertion_order() {
        let section = Section::blank(0);
        let first = member_of(&section);
        let second = member_of(&section);
        let third = member_of(&section);
        let questions = vec![first.clone(), second.clone(), third.clone()];

        let pages = build_pages(&questions, &[section]);
        match &pages[0] {
            Page::Grouped { questions, .. } => {
                let ids: Vec<_> = questions.iter().map(|q| q.id).collect();
                assert_eq!(ids, vec![first.id, second.id, third.id]);
            }
            other => panic!("expected a grouped page, got {other:?}"),
        }
    }

    #[test]
    fn unordered_standalone_question_defaults_to_position_index() {
        // Standalone question at index 0 with no explicit order sorts at 0,
        // before a section at order 1.
        let section = Section::blank(1);
        let q = standalone(None);

        let pages = build_pages(&[q.clone()], &[section]);
        assert!(matches!(&pages[0], Page::Standalone { question } if question.id == q.id));
    }

    #[test]
    fn orphaned_question_is_excluded_not_fatal() {
        let section = Section::blank(0);
        let mut orphan = Question::blank(QuestionType::Text);
        orphan.section_id = Some(SectionId::new()); // Points at nothing.

        let pages = build_pages(&[orphan], &[section]);
        assert_eq!(pages.len(), 1);
        match &pages[0] {
            Page::Grouped { questions, .. } => assert!(questions.is_empty()),
            other => panic!("expected a grouped page, got {other:?}"),
        }
    }

    #[test]
    fn order_tie_resolves_section_first() {
        let section = Section::blank(5);
        let q = standalone(Some(5));

        let pages = build_pages(&[q], &[section]);
        assert!(matches!(&pages[0], Page::Grouped { .. }));
        assert!(matches!(&pages[1], Page::Standalone { .. }));
    }
}
