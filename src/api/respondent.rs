use std::collections::HashSet;

use chrono::Utc;
use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{AssignmentView, FormView, SubmissionReceipt, SubmissionRequest, SubmissionSummary},
        common::form::FormStatus,
        db::{
            cache::QuestionCounts,
            directory::DirectoryUser,
            form::{Form, FormOutline},
            response::{NewResponse, Response},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_assignments, view_assigned_form, submit_response, get_my_submissions]
}

/// The forms deployed to the calling respondent, each with its derived
/// completion status.
#[get("/assignments")]
async fn get_assignments(
    user: DirectoryUser,
    outlines: Coll<FormOutline>,
    forms: Coll<Form>,
    responses: Coll<Response>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Vec<AssignmentView>>> {
    let filter = doc! {
        "status": FormStatus::Active,
        "recipients": *user.id,
    };
    let outlines: Vec<FormOutline> = outlines.find(filter, None).await?.try_collect().await?;

    let submitted: Vec<Response> = responses
        .find(doc! { "respondent_id": *user.id }, None)
        .await?
        .try_collect()
        .await?;
    let completed: HashSet<Id> = submitted.iter().map(|response| response.form_id).collect();

    let now = Utc::now();
    let mut assignments = Vec::with_capacity(outlines.len());
    for outline in outlines {
        let form_id = outline.id;
        let question_count = counts.read_through(&forms, form_id).await?;
        if let Some(assignment) =
            AssignmentView::derive(outline, question_count, now, completed.contains(&form_id))
        {
            assignments.push(assignment);
        }
    }
    Ok(Json(assignments))
}

/// The rendered questionnaire for one assignment. The page sequence is the
/// same one the author's preview uses.
#[get("/assignments/<form_id>")]
async fn view_assigned_form(
    user: DirectoryUser,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<FormView>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    // A form outside the caller's assignments might as well not exist.
    if form.status != FormStatus::Active || !form.recipients.contains(&user.id) {
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    Ok(Json(FormView::new(&form)))
}

/// Store a complete answer map. The eligibility pre-check reports every
/// blocking reason at once; the unique response index is the authoritative
/// guard against a double submission racing past the pre-check.
#[post("/assignments/<form_id>/responses", data = "<submission>", format = "json")]
async fn submit_response(
    user: DirectoryUser,
    form_id: Id,
    submission: Json<SubmissionRequest>,
    forms: Coll<Form>,
    responses: Coll<Response>,
    new_responses: Coll<NewResponse>,
) -> Result<Json<SubmissionReceipt>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;

    let already_submitted = responses
        .find_one(
            doc! { "form_id": *form_id, "respondent_id": *user.id },
            None,
        )
        .await?
        .is_some();
    let blockers = form.submission_blockers(
        Utc::now(),
        form.recipients.contains(&user.id),
        already_submitted,
    );
    if !blockers.is_empty() {
        return Err(Error::Ineligible(blockers));
    }

    let response = NewResponse::new(form_id, user.id, submission.0.answers);
    let result = new_responses.insert_one(&response, None).await;
    let response_id: Id = match result {
        Ok(outcome) => outcome
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into(),
        // Lost a race against our own pre-check.
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Ineligible(vec![
                "You have already submitted a response".to_string(),
            ]));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(SubmissionReceipt {
        success: true,
        response_id,
    }))
}

/// The calling respondent's own submission history.
#[get("/responses")]
async fn get_my_submissions(
    user: DirectoryUser,
    responses: Coll<Response>,
) -> Result<Json<Vec<SubmissionSummary>>> {
    let submitted: Vec<Response> = responses
        .find(doc! { "respondent_id": *user.id }, None)
        .await?
        .try_collect()
        .await?;
    Ok(Json(submitted.iter().map(SubmissionSummary::from).collect()))
}
