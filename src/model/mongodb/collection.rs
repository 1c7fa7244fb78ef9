use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    category::{Category, NewCategory},
    directory::DirectoryUser,
    form::{Form, FormOutline, NewForm},
    response::{NewResponse, Response},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Form collections
const FORMS: &str = "forms";
impl MongoCollection for Form {
    const NAME: &'static str = FORMS;
}
impl MongoCollection for NewForm {
    const NAME: &'static str = FORMS;
}
impl MongoCollection for FormOutline {
    const NAME: &'static str = FORMS;
}

// Response collections
const RESPONSES: &str = "responses";
impl MongoCollection for Response {
    const NAME: &'static str = RESPONSES;
}
impl MongoCollection for NewResponse {
    const NAME: &'static str = RESPONSES;
}

// Category collections
const CATEGORIES: &str = "categories";
impl MongoCollection for Category {
    const NAME: &'static str = CATEGORIES;
}
impl MongoCollection for NewCategory {
    const NAME: &'static str = CATEGORIES;
}

// User directory collection
const USERS: &str = "users";
impl MongoCollection for DirectoryUser {
    const NAME: &'static str = USERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Response collection: one response per (form, respondent) pair.
    // This is the authoritative guard against double submission; the
    // eligibility pre-check in the API is best-effort only.
    let response_index = IndexModel::builder()
        .keys(doc! {"form_id": 1, "respondent_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Response>::from_db(db)
        .create_index(response_index, None)
        .await?;

    // Category collection.
    let category_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique)
        .build();
    Coll::<Category>::from_db(db)
        .create_index(category_index, None)
        .await?;

    // User directory: audience resolution filters on role.
    let user_index = IndexModel::builder().keys(doc! {"role": 1}).build();
    Coll::<DirectoryUser>::from_db(db)
        .create_index(user_index, None)
        .await?;

    Ok(())
}
