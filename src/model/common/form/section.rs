use serde::{Deserialize, Serialize};

use super::SectionId;

/// A titled grouping of questions, rendered to the respondent as one page.
/// A section owns questions via their `section_id` back-reference; deleting
/// a section does not delete its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section unique ID.
    pub id: SectionId,
    /// Section title.
    pub title: String,
    /// Optional blurb shown under the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position in the interleaved section/question sequence.
    pub order: i64,
}

impl Section {
    /// A blank section at the given position.
    pub fn blank(order: i64) -> Self {
        Self {
            id: SectionId::new(),
            title: String::new(),
            description: None,
            order,
        }
    }
}
