use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        common::audience::{Audience, Recipient},
        db::directory::{resolve_audience, DirectoryUser},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![preview_audience]
}

/// Resolve an audience description to its concrete recipient pool, for the
/// authoring UI's recipient picker. Resolution is a pure directory query:
/// previewing the same audience twice without directory changes yields the
/// same pool.
#[post("/audience/resolve", data = "<audience>", format = "json")]
async fn preview_audience(
    audience: Json<Audience>,
    users: Coll<DirectoryUser>,
) -> Result<Json<Vec<Recipient>>> {
    let recipients = resolve_audience(&users, &audience).await?;
    if recipients.is_empty() {
        warn!("Audience {:?} resolves to zero recipients", audience.0);
    }
    Ok(Json(recipients))
}
