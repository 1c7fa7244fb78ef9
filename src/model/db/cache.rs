use std::collections::HashMap;

use rocket::tokio::sync::Mutex;

use crate::{
    error::{Error, Result},
    model::mongodb::{Coll, Id},
};

use super::form::Form;

/// A read-through cache of per-form question counts, managed by the server
/// and shared across requests.
///
/// Listings ask for question counts far more often than forms change, and
/// the count would otherwise force loading every full form document. Every
/// successful form write must invalidate the entry for that form.
#[derive(Debug, Default)]
pub struct QuestionCounts(Mutex<HashMap<Id, usize>>);

impl QuestionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// The question count for a form, loading the form on a cache miss.
    pub async fn read_through(&self, forms: &Coll<Form>, form_id: Id) -> Result<usize> {
        let mut counts = self.0.lock().await;
        if let Some(&count) = counts.get(&form_id) {
            return Ok(count);
        }
        let form = forms
            .find_one(form_id.as_doc(), None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
        let count = form.questions.len();
        counts.insert(form_id, count);
        Ok(count)
    }

    /// Drop the cached count for a form. Called after every successful
    /// create, update, or delete of that form.
    pub async fn invalidate(&self, form_id: Id) {
        self.0.lock().await.remove(&form_id);
    }
}
