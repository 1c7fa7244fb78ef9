use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{1}")]
    Status(Status, String),
    /// A form failed pre-publish validation; every failure is reported.
    #[error("Form failed validation: {0:?}")]
    Validation(Vec<String>),
    /// A submission was rejected; every blocking reason is reported.
    #[error("Submission rejected: {0:?}")]
    Ineligible(Vec<String>),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }
}

/// The body returned for errors that carry a reason list.
#[derive(Debug, Serialize)]
struct Reasons {
    success: bool,
    reasons: Vec<String>,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        match self {
            Self::Db(err) => {
                error!("Database error: {err}");
                Err(Status::InternalServerError)
            }
            Self::Status(status, msg) => {
                warn!("{status}: {msg}");
                Err(status)
            }
            Self::Validation(reasons) => reasons_response(req, Status::UnprocessableEntity, reasons),
            Self::Ineligible(reasons) => reasons_response(req, Status::Conflict, reasons),
        }
    }
}

/// Respond with the given status and a JSON body listing the reasons.
fn reasons_response<'r, 'o: 'r>(
    req: &'r Request<'_>,
    status: Status,
    reasons: Vec<String>,
) -> response::Result<'o> {
    let mut response = Json(Reasons {
        success: false,
        reasons,
    })
    .respond_to(req)?;
    response.set_status(status);
    Ok(response)
}
