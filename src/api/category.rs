use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        db::category::{Category, NewCategory},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_categories, create_category, delete_category]
}

#[get("/categories")]
async fn get_categories(categories: Coll<Category>) -> Result<Json<Vec<Category>>> {
    let categories = categories.find(None, None).await?.try_collect().await?;
    Ok(Json(categories))
}

#[post("/categories", data = "<category>", format = "json")]
async fn create_category(
    category: Json<NewCategory>,
    new_categories: Coll<NewCategory>,
    categories: Coll<Category>,
) -> Result<Json<Category>> {
    let name = category.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Status(
            Status::BadRequest,
            "Category name cannot be empty".to_string(),
        ));
    }

    // The unique index on `name` enforces uniqueness.
    let result = new_categories
        .insert_one(NewCategory { name: name.clone() }, None)
        .await;
    let new_id: Id = match result {
        Ok(outcome) => outcome
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Category already exists: {name}"),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let category = categories
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Just inserted.
    Ok(Json(category))
}

#[delete("/categories/<category_id>")]
async fn delete_category(category_id: Id, categories: Coll<Category>) -> Result<()> {
    let result = categories.delete_one(category_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        Err(Error::not_found(format!("Category {category_id}")))
    } else {
        Ok(())
    }
}
