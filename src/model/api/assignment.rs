use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::form::Schedule, db::form::FormOutline, mongodb::Id};

use super::form::ScheduleView;

/// Where an assignment stands for one respondent. Derived on read from the
/// form's window and the respondent's responses; never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    /// Responded; nothing left to do.
    Completed,
    /// The window has not opened yet.
    Upcoming,
    /// Open for submission.
    Open,
    /// The window has passed without a response.
    Missed,
}

impl AssignmentStatus {
    pub fn derive(schedule: Schedule, now: DateTime<Utc>, completed: bool) -> Self {
        if completed {
            Self::Completed
        } else if now < schedule.start_date {
            Self::Upcoming
        } else if schedule.contains(now) {
            Self::Open
        } else {
            Self::Missed
        }
    }
}

/// One entry in a respondent's "forms assigned to you" list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct AssignmentView {
    pub form_id: Id,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub schedule: ScheduleView,
    pub question_count: usize,
    pub status: AssignmentStatus,
}

impl AssignmentView {
    /// Assemble the derived view. Returns None for a form without a
    /// schedule, which cannot have been assigned.
    pub fn derive(
        outline: FormOutline,
        question_count: usize,
        now: DateTime<Utc>,
        completed: bool,
    ) -> Option<Self> {
        let schedule = outline.schedule?;
        Some(Self {
            form_id: outline.id,
            title: outline.title,
            description: outline.description,
            category: outline.category,
            schedule: schedule.into(),
            question_count,
            status: AssignmentStatus::derive(schedule, now, completed),
        })
    }
}
