mod page;
mod question;
mod schedule;
mod section;
mod state;

pub use page::{build_pages, Page};
pub use question::{Answer, Question, QuestionType};
pub use schedule::Schedule;
pub use section::Section;
pub use state::FormStatus;

use crate::model::mongodb::Id;

pub type FormId = Id;
pub type QuestionId = Id;
pub type SectionId = Id;
