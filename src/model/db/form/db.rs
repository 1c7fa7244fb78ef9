use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{
    common::form::{FormStatus, Schedule},
    mongodb::Id,
};

use super::FormCore;

/// A form from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub form: FormCore,
}

impl Deref for Form {
    type Target = FormCore;

    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.form
    }
}

/// A lightweight read of a form document for listings: everything except
/// the embedded questions and sections. Extra document fields are simply
/// not deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOutline {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

#[cfg(test)]
mod tests {
    use mongodb::bson;

    use super::*;

    #[test]
    fn outline_reads_from_a_full_form_document() {
        let form = Form {
            id: Id::new(),
            form: FormCore::example(),
        };
        let doc = bson::to_document(&form).unwrap();
        let outline: FormOutline = bson::from_document(doc).unwrap();
        assert_eq!(outline.id, form.id);
        assert_eq!(outline.title, form.title);
        assert_eq!(outline.status, form.status);
    }
}
