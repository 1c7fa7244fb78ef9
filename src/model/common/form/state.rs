use mongodb::bson::{to_bson, Bson};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};

/// States in the Form lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum FormStatus {
    /// Under construction, only visible to authors.
    #[field(value = "draft")]
    Draft,
    /// Deployed with a schedule and audience, visible to its recipients.
    #[field(value = "active")]
    Active,
    /// A reusable starting point, never deployed, decoupled from its origin.
    #[field(value = "template")]
    Template,
}

impl From<FormStatus> for Bson {
    fn from(status: FormStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}
