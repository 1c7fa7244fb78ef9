use std::collections::HashMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::form::{Answer, QuestionId},
    mongodb::{serde_string_map, Id},
};

/// Core response data: one respondent's complete answer map for one form.
///
/// Written exactly once; the unique index on `(form_id, respondent_id)`
/// rejects a second write for the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCore {
    pub form_id: Id,
    pub respondent_id: Id,
    #[serde(with = "serde_string_map")]
    pub answers: HashMap<QuestionId, Answer>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

impl ResponseCore {
    pub fn new(form_id: Id, respondent_id: Id, answers: HashMap<QuestionId, Answer>) -> Self {
        Self {
            form_id,
            respondent_id,
            answers,
            submitted_at: Utc::now(),
        }
    }
}

/// Response data ready for insertion.
pub type NewResponse = ResponseCore;

/// A response from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub response: ResponseCore,
}

impl Deref for Response {
    type Target = ResponseCore;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson;

    use super::*;

    #[test]
    fn answer_map_keys_stringify_for_bson() {
        let question_id = QuestionId::new();
        let mut answers = HashMap::new();
        answers.insert(question_id, Answer::Scalar(5));
        let response = ResponseCore::new(Id::new(), Id::new(), answers);

        let doc = bson::to_document(&response).unwrap();
        let stored = doc.get_document("answers").unwrap();
        assert!(stored.contains_key(question_id.to_string()));

        let back: ResponseCore = bson::from_document(doc).unwrap();
        assert_eq!(back, response);
    }
}
