use std::collections::HashMap;

use super::form::{Answer, Page, QuestionId};

/// The result of stepping backwards from the current page.
#[derive(Debug, PartialEq)]
pub enum Retreat<'a> {
    /// Moved to the previous page.
    Page(&'a Page),
    /// Already on the first page; the respondent leaves the form.
    Exited,
}

/// A respondent's walk through a form's pages.
///
/// The page sequence is fixed at construction; the session only tracks the
/// current position and the answers entered so far. Answers survive
/// navigation in both directions, so stepping back and forward again shows
/// the previously-entered values.
#[derive(Debug)]
pub struct PagerSession {
    pages: Vec<Page>,
    current: usize,
    answers: HashMap<QuestionId, Answer>,
}

impl PagerSession {
    /// Begin a session on the first page. Returns None for a form with no
    /// pages, which has nothing to walk.
    pub fn new(pages: Vec<Page>) -> Option<Self> {
        if pages.is_empty() {
            return None;
        }
        Some(Self {
            pages,
            current: 0,
            answers: HashMap::new(),
        })
    }

    /// The page currently shown.
    pub fn current_page(&self) -> &Page {
        &self.pages[self.current]
    }

    /// Is the session on its final page?
    pub fn on_last_page(&self) -> bool {
        self.current + 1 == self.pages.len()
    }

    /// Completion percentage of the current position: page index plus one,
    /// over the total page count.
    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / self.pages.len() as f64 * 100.0
    }

    /// Record (or overwrite) the answer to a question. Position is
    /// unaffected; answers are kept wherever the respondent navigates next.
    pub fn record_answer(&mut self, question_id: QuestionId, answer: Answer) {
        self.answers.insert(question_id, answer);
    }

    /// The answer currently recorded for a question, if any.
    pub fn answer(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    /// Advance to the next page. Returns None from the last page, where the
    /// only forward action is submission.
    pub fn advance(&mut self) -> Option<&Page> {
        if self.on_last_page() {
            return None;
        }
        self.current += 1;
        Some(&self.pages[self.current])
    }

    /// Step back one page, or exit from the first page. Recorded answers
    /// are kept either way.
    pub fn retreat(&mut self) -> Retreat {
        if self.current == 0 {
            return Retreat::Exited;
        }
        self.current -= 1;
        Retreat::Page(&self.pages[self.current])
    }

    /// Required questions on the current page that have no recorded answer.
    pub fn missing_on_current_page(&self) -> Vec<QuestionId> {
        self.current_page()
            .questions()
            .filter(|question| question.required && !self.answers.contains_key(&question.id))
            .map(|question| question.id)
            .collect()
    }

    /// Consume the session and yield the accumulated answers. Only valid
    /// from the last page; anywhere else the walk is unfinished and the
    /// session is returned untouched.
    pub fn into_answers(self) -> Result<HashMap<QuestionId, Answer>, Self> {
        if self.on_last_page() {
            Ok(self.answers)
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::common::form::{build_pages, Question, QuestionType, Section};

    use super::*;

    fn three_pages() -> Vec<Page> {
        let section = Section::blank(0);
        let mut member = Question::blank(QuestionType::Rating);
        member.section_id = Some(section.id);
        let mut first = Question::blank(QuestionType::Text);
        first.order = Some(1);
        first.required = true;
        let mut second = Question::blank(QuestionType::Textarea);
        second.order = Some(2);
        build_pages(&[member, first, second], &[section])
    }

    #[test]
    fn empty_form_yields_no_session() {
        assert!(PagerSession::new(vec![]).is_none());
    }

    #[test]
    fn progress_counts_the_current_page() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        assert_eq!(session.progress(), 100.0 / 3.0);
        session.advance();
        assert_eq!(session.progress(), 200.0 / 3.0);
        session.advance();
        assert_eq!(session.progress(), 100.0);
    }

    #[test]
    fn advancing_past_the_last_page_is_refused() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        assert!(session.advance().is_some());
        assert!(session.advance().is_some());
        assert!(session.on_last_page());
        assert!(session.advance().is_none());
    }

    #[test]
    fn retreating_from_the_first_page_exits() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        assert_eq!(session.retreat(), Retreat::Exited);

        session.advance();
        assert!(matches!(session.retreat(), Retreat::Page(_)));
    }

    #[test]
    fn answers_survive_navigation() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        session.advance();
        let question_id = session.current_page().questions().next().unwrap().id;
        session.record_answer(question_id, Answer::Text("good course".to_string()));

        session.retreat();
        session.advance();
        assert_eq!(
            session.answer(question_id),
            Some(&Answer::Text("good course".to_string()))
        );
    }

    #[test]
    fn required_questions_are_flagged_until_answered() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        session.advance(); // The required standalone text question.
        let missing = session.missing_on_current_page();
        assert_eq!(missing.len(), 1);

        session.record_answer(missing[0], Answer::Text("fine".to_string()));
        assert!(session.missing_on_current_page().is_empty());
    }

    #[test]
    fn answers_are_only_released_on_the_last_page() {
        let mut session = PagerSession::new(three_pages()).unwrap();
        session = session.into_answers().unwrap_err();

        session.advance();
        session.advance();
        let question_id = session.current_page().questions().next().unwrap().id;
        session.record_answer(question_id, Answer::Text("thanks".to_string()));

        let answers = session.into_answers().unwrap();
        assert_eq!(answers.len(), 1);
    }
}
