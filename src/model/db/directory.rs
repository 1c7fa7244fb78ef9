use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    Database,
};
use rocket::{
    futures::TryStreamExt,
    http::Status,
    request::{self, FromRequest, Request},
    State,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    model::{
        common::audience::{Audience, AudienceType, Recipient},
        mongodb::{Coll, Id},
    },
};

/// The roles a directory account can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Alumni,
    Employer,
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        to_bson(&role).expect("Serialisation is infallible")
    }
}

/// An account in the user directory. The directory is maintained by the
/// surrounding account system; this service only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    #[serde(rename = "_id")]
    pub id: Id,
    pub display_name: String,
    pub role: Role,
    /// Department, for students and instructors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Course/year/section, for students.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_year_section: Option<String>,
    /// Employing company, for alumni and employer accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl DirectoryUser {
    /// Role-dependent context shown next to the name in recipient lists.
    pub fn detail_label(&self) -> String {
        let parts: Vec<&str> = match self.role {
            Role::Student => [&self.department, &self.course_year_section]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect(),
            Role::Instructor => self.department.iter().map(String::as_str).collect(),
            Role::Alumni | Role::Employer => self.company.iter().map(String::as_str).collect(),
        };
        parts.join(", ")
    }

    pub fn recipient(&self) -> Recipient {
        Recipient {
            id: self.id,
            display_name: self.display_name.clone(),
            detail_label: self.detail_label(),
        }
    }
}

/// The directory query matching an audience description.
///
/// The structural filters only apply where the cohort defines them:
/// department and course/section for students (either, both, or neither),
/// department for instructors, company for alumni. Absent filters mean the
/// whole cohort.
pub fn audience_filter(audience: &Audience) -> Document {
    let mut filter = match audience.audience_type {
        AudienceType::AllUsers => doc! {},
        AudienceType::Students => doc! { "role": Role::Student },
        AudienceType::Instructors => doc! { "role": Role::Instructor },
        AudienceType::Alumni => doc! { "role": Role::Alumni },
        AudienceType::Staff => doc! { "role": Role::Employer },
    };
    match audience.audience_type {
        AudienceType::Students => {
            if let Some(department) = &audience.department {
                filter.insert("department", department);
            }
            if let Some(section) = &audience.course_year_section {
                filter.insert("course_year_section", section);
            }
        }
        AudienceType::Instructors => {
            if let Some(department) = &audience.department {
                filter.insert("department", department);
            }
        }
        AudienceType::Alumni => {
            if let Some(company) = &audience.company {
                filter.insert("company", company);
            }
        }
        AudienceType::AllUsers | AudienceType::Staff => {}
    }
    filter
}

/// Resolve an audience description to its concrete recipient pool.
pub async fn resolve_audience(
    users: &Coll<DirectoryUser>,
    audience: &Audience,
) -> crate::error::Result<Vec<Recipient>> {
    let members: Vec<DirectoryUser> = users
        .find(audience_filter(audience), None)
        .await?
        .try_collect()
        .await?;
    Ok(recipient_pool(&members))
}

/// Order a directory query result into the pool shown to authors:
/// deduplicated by account, sorted by display name (ID as the tiebreak so
/// the order is total).
fn recipient_pool(members: &[DirectoryUser]) -> Vec<Recipient> {
    let mut recipients: Vec<Recipient> = members.iter().map(DirectoryUser::recipient).collect();
    recipients.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    recipients.dedup_by(|a, b| a.id == b.id);
    recipients
}

/// The cookie naming the calling account.
pub const USER_ID_COOKIE: &str = "user_id";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DirectoryUser {
    type Error = Error;

    /// Identify the caller from their `user_id` cookie and load their
    /// directory record.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let user_id = req
            .cookies()
            .get_private(USER_ID_COOKIE)
            .and_then(|cookie| cookie.value().parse::<Id>().ok());
        let Some(user_id) = user_id else {
            return request::Outcome::Failure((
                Status::Unauthorized,
                Error::Status(Status::Unauthorized, "Not signed in".to_string()),
            ));
        };

        // Panics iff the `Database` is not managed by `rocket::Rocket`.
        let db = req.guard::<&State<Database>>().await.unwrap();
        let users = Coll::<DirectoryUser>::from_db(db);
        match users.find_one(user_id.as_doc(), None).await {
            Ok(Some(user)) => request::Outcome::Success(user),
            Ok(None) => request::Outcome::Failure((
                Status::Unauthorized,
                Error::Status(Status::Unauthorized, "Unknown account".to_string()),
            )),
            Err(err) => request::Outcome::Failure((Status::InternalServerError, err.into())),
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl DirectoryUser {
        pub fn example_student(name: &str, department: &str, section: &str) -> Self {
            Self {
                id: Id::new(),
                display_name: name.to_string(),
                role: Role::Student,
                department: Some(department.to_string()),
                course_year_section: Some(section.to_string()),
                company: None,
            }
        }
    }
}
