use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            DeployOutcome, DeployRequest, FormDescription, FormMetadata, FormResults, FormSpec,
            FormView, QuestionPatch, ResponseDescription, SectionPatch,
        },
        common::form::{FormStatus, Question, QuestionType, Schedule, Section},
        db::{
            cache::QuestionCounts,
            directory::{resolve_audience, DirectoryUser},
            form::{Form, FormCore, FormOutline, MoveDirection, NewForm},
            response::Response,
        },
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_forms,
        create_form,
        get_form,
        update_form,
        delete_form,
        duplicate_form,
        save_template,
        add_question,
        duplicate_question,
        update_question,
        delete_question,
        move_question,
        add_option,
        update_option,
        delete_option,
        add_section,
        update_section,
        delete_section,
        move_section,
        deploy_form,
        get_results,
        get_responses,
    ]
}

#[get("/forms?<status>")]
async fn get_forms(
    status: Option<FormStatus>,
    outlines: Coll<FormOutline>,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Vec<FormDescription>>> {
    let filter = status.map(|status| doc! { "status": status });
    let outlines: Vec<FormOutline> = outlines.find(filter, None).await?.try_collect().await?;

    let mut descriptions = Vec::with_capacity(outlines.len());
    for outline in outlines {
        let question_count = counts.read_through(&forms, outline.id).await?;
        descriptions.push(FormDescription::new(outline, question_count));
    }
    Ok(Json(descriptions))
}

#[post("/forms", data = "<spec>", format = "json")]
async fn create_form(
    spec: Json<FormSpec>,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<Json<FormView>> {
    let form: NewForm = spec.0.into();
    let new_id: Id = new_forms
        .insert_one(&form, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let form = forms
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Just inserted.
    Ok(Json(FormView::new(&form)))
}

#[get("/forms/<form_id>")]
async fn get_form(form_id: Id, forms: Coll<Form>) -> Result<Json<FormView>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    Ok(Json(FormView::new(&form)))
}

#[put("/forms/<form_id>", data = "<metadata>", format = "json")]
async fn update_form(
    form_id: Id,
    metadata: Json<FormMetadata>,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<FormView>> {
    edit_form(&forms, counts, form_id, |form| {
        form.ensure_updatable(Utc::now())?;
        metadata.0.apply(form);
        Ok(())
    })
    .await?;
    get_form(form_id, forms).await
}

#[delete("/forms/<form_id>")]
async fn delete_form(
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    let result = forms.delete_one(form_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    // Responses are meaningless without their form.
    responses
        .delete_many(doc! { "form_id": *form_id }, None)
        .await?;
    counts.invalidate(form_id).await;
    Ok(())
}

#[post("/forms/<form_id>/duplicate")]
async fn duplicate_form(
    form_id: Id,
    forms: Coll<Form>,
    new_forms: Coll<NewForm>,
) -> Result<Json<FormView>> {
    copy_form(form_id, forms, new_forms, FormCore::duplicate).await
}

#[post("/forms/<form_id>/template")]
async fn save_template(
    form_id: Id,
    forms: Coll<Form>,
    new_forms: Coll<NewForm>,
) -> Result<Json<FormView>> {
    copy_form(form_id, forms, new_forms, FormCore::as_template).await
}

/// Insert a derived copy of an existing form and return the stored copy.
async fn copy_form(
    form_id: Id,
    forms: Coll<Form>,
    new_forms: Coll<NewForm>,
    derive: impl FnOnce(&FormCore) -> FormCore,
) -> Result<Json<FormView>> {
    let source = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;

    let copy = derive(&source);
    let new_id: Id = new_forms
        .insert_one(&copy, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();
    let copy = forms
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Just inserted.
    Ok(Json(FormView::new(&copy)))
}

#[post("/forms/<form_id>/questions?<question_type>")]
async fn add_question(
    form_id: Id,
    question_type: QuestionType,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Question>> {
    let question = edit_form(&forms, counts, form_id, |form| {
        form.add_question(question_type).map(Question::clone)
    })
    .await?;
    Ok(Json(question))
}

#[post("/forms/<form_id>/questions/<question_id>/duplicate")]
async fn duplicate_question(
    form_id: Id,
    question_id: Id,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Question>> {
    let question = edit_form(&forms, counts, form_id, |form| {
        let copy_id = form.duplicate_question(question_id)?;
        form.question(copy_id).map(Question::clone)
    })
    .await?;
    Ok(Json(question))
}

#[put("/forms/<form_id>/questions/<question_id>", data = "<patch>", format = "json")]
async fn update_question(
    form_id: Id,
    question_id: Id,
    patch: Json<QuestionPatch>,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Question>> {
    let question = edit_form(&forms, counts, form_id, |form| {
        let patch = patch.0;
        if let Some(question_type) = patch.question_type {
            form.change_question_type(question_id, question_type)?;
        }
        let question = form.question_mut(question_id)?;
        patch.apply(question);
        Ok(question.clone())
    })
    .await?;
    Ok(Json(question))
}

#[delete("/forms/<form_id>/questions/<question_id>")]
async fn delete_question(
    form_id: Id,
    question_id: Id,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.delete_question(question_id)
    })
    .await
}

#[post("/forms/<form_id>/questions/<question_id>/move?<direction>")]
async fn move_question(
    form_id: Id,
    question_id: Id,
    direction: MoveDirection,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.move_question(question_id, direction)
    })
    .await
}

#[post("/forms/<form_id>/questions/<question_id>/options")]
async fn add_option(
    form_id: Id,
    question_id: Id,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Question>> {
    let question = edit_form(&forms, counts, form_id, |form| {
        form.add_option(question_id)?;
        form.question(question_id).map(Question::clone)
    })
    .await?;
    Ok(Json(question))
}

#[put(
    "/forms/<form_id>/questions/<question_id>/options/<index>",
    data = "<text>",
    format = "json"
)]
async fn update_option(
    form_id: Id,
    question_id: Id,
    index: usize,
    text: Json<String>,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.update_option(question_id, index, text.0)
    })
    .await
}

#[delete("/forms/<form_id>/questions/<question_id>/options/<index>")]
async fn delete_option(
    form_id: Id,
    question_id: Id,
    index: usize,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.delete_option(question_id, index)
    })
    .await
}

#[post("/forms/<form_id>/sections")]
async fn add_section(
    form_id: Id,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Section>> {
    let section = edit_form(&forms, counts, form_id, |form| {
        form.add_section().map(Section::clone)
    })
    .await?;
    Ok(Json(section))
}

#[put("/forms/<form_id>/sections/<section_id>", data = "<patch>", format = "json")]
async fn update_section(
    form_id: Id,
    section_id: Id,
    patch: Json<SectionPatch>,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<Json<Section>> {
    let section = edit_form(&forms, counts, form_id, |form| {
        let section = form.section_mut(section_id)?;
        patch.0.apply(section);
        Ok(section.clone())
    })
    .await?;
    Ok(Json(section))
}

#[delete("/forms/<form_id>/sections/<section_id>")]
async fn delete_section(
    form_id: Id,
    section_id: Id,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.delete_section(section_id)
    })
    .await
}

#[post("/forms/<form_id>/sections/<section_id>/move?<direction>")]
async fn move_section(
    form_id: Id,
    section_id: Id,
    direction: MoveDirection,
    forms: Coll<Form>,
    counts: &State<QuestionCounts>,
) -> Result<()> {
    edit_form(&forms, counts, form_id, |form| {
        form.move_section(section_id, direction)
    })
    .await
}

#[post("/forms/<form_id>/deploy", data = "<request>", format = "json")]
async fn deploy_form(
    form_id: Id,
    request: Json<DeployRequest>,
    forms: Coll<Form>,
    users: Coll<DirectoryUser>,
    counts: &State<QuestionCounts>,
    config: &State<Config>,
) -> Result<Json<DeployOutcome>> {
    let request = request.0;
    let mut form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;

    // Resolve the audience, unless the author hand-picked recipients.
    let recipients = match request.recipients {
        Some(recipients) => recipients,
        None => resolve_audience(&users, &request.audience)
            .await?
            .into_iter()
            .map(|recipient| recipient.id)
            .collect(),
    };

    let schedule = Schedule::normalise(
        request.start_date,
        request.end_date,
        config.default_window(),
    );
    form.deploy(schedule, request.audience, recipients)?;

    let result = forms.replace_one(form_id.as_doc(), &form, None).await?;
    assert_eq!(result.matched_count, 1);
    counts.invalidate(form_id).await;

    let mut warnings = Vec::new();
    if form.recipients.is_empty() {
        warnings.push("No recipients match this audience; nobody will receive the form".to_string());
    }
    Ok(Json(DeployOutcome {
        form_id,
        status: form.status,
        schedule: schedule.into(),
        recipient_count: form.recipients.len(),
        warnings,
    }))
}

#[get("/forms/<form_id>/results")]
async fn get_results(
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<FormResults>> {
    let form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    let responses: Vec<Response> = responses
        .find(doc! { "form_id": *form_id }, None)
        .await?
        .try_collect()
        .await?;
    Ok(Json(FormResults::compute(&form, &responses)))
}

#[get("/forms/<form_id>/responses")]
async fn get_responses(
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
    users: Coll<DirectoryUser>,
) -> Result<Json<Vec<ResponseDescription>>> {
    let form = forms.find_one(form_id.as_doc(), None).await?;
    if form.is_none() {
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    let responses: Vec<Response> = responses
        .find(doc! { "form_id": *form_id }, None)
        .await?
        .try_collect()
        .await?;

    let respondent_ids: Vec<_> = responses
        .iter()
        .map(|response| *response.respondent_id)
        .collect();
    let respondents: Vec<DirectoryUser> = users
        .find(doc! { "_id": { "$in": respondent_ids } }, None)
        .await?
        .try_collect()
        .await?;
    let by_id: HashMap<Id, &DirectoryUser> = respondents
        .iter()
        .map(|respondent| (respondent.id, respondent))
        .collect();

    Ok(Json(
        responses
            .iter()
            .map(|response| {
                ResponseDescription::new(response, by_id.get(&response.respondent_id).copied())
            })
            .collect(),
    ))
}

/// Load a form, apply an edit to its draft state, and write it back,
/// dropping the cached question count.
async fn edit_form<T>(
    forms: &Coll<Form>,
    counts: &QuestionCounts,
    form_id: Id,
    edit: impl FnOnce(&mut FormCore) -> Result<T>,
) -> Result<T> {
    let mut form = forms
        .find_one(form_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;

    let output = edit(&mut form)?;

    let result = forms.replace_one(form_id.as_doc(), &form, None).await?;
    assert_eq!(result.matched_count, 1);
    counts.invalidate(form_id).await;
    Ok(output)
}
