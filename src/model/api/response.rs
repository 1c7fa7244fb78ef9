use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        audience::Recipient,
        form::{Answer, QuestionId},
    },
    db::{directory::DirectoryUser, response::Response},
    mongodb::{serde_string_map, Id},
};

/// A complete answer map, submitted as one unit from the final page.
/// There is no partial or incremental submission.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct SubmissionRequest {
    #[serde(with = "serde_string_map")]
    pub answers: HashMap<QuestionId, Answer>,
}

/// Acknowledgement of a stored submission.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct SubmissionReceipt {
    pub success: bool,
    pub response_id: Id,
}

/// One stored response as shown to the form's author, with the respondent
/// identified the same way as in recipient lists.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ResponseDescription {
    pub respondent: Recipient,
    #[serde(with = "serde_string_map")]
    pub answers: HashMap<QuestionId, Answer>,
    pub submitted_at: DateTime<Utc>,
}

impl ResponseDescription {
    /// Pair a stored response with its respondent's directory record.
    /// A respondent no longer in the directory is shown anonymised rather
    /// than dropped.
    pub fn new(response: &Response, respondent: Option<&DirectoryUser>) -> Self {
        let respondent = match respondent {
            Some(user) => user.recipient(),
            None => Recipient {
                id: response.respondent_id,
                display_name: "Deleted account".to_string(),
                detail_label: String::new(),
            },
        };
        Self {
            respondent,
            answers: response.answers.clone(),
            submitted_at: response.submitted_at,
        }
    }
}

/// One entry in a respondent's own submission history; used to derive
/// assignment completion.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct SubmissionSummary {
    pub form_id: Id,
    pub submitted_at: DateTime<Utc>,
}

impl From<&Response> for SubmissionSummary {
    fn from(response: &Response) -> Self {
        Self {
            form_id: response.form_id,
            submitted_at: response.submitted_at,
        }
    }
}
