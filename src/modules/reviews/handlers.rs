use axum::{
    extract::{Path, State},
    Json,
};
use bookshelf_db::{
    models::{DeleteOutcome, InsertOutcome, Review, ReviewFields, UpdateOutcome},
    Database, StoreError,
};
use bookshelf_http::{error::AppError, extract::ApiJson};
use serde::Deserialize;
use serde_json::json;

use crate::utils::parse_id;
use crate::validation::{validated, Validate};

#[derive(Debug, Deserialize)]
pub struct ReviewTextUpdate {
    #[serde(default)]
    pub review: String,
}

impl Validate for ReviewTextUpdate {
    fn issues(&self) -> Vec<serde_json::Value> {
        if self.review.trim().is_empty() {
            vec![json!({ "field": "review", "error": "required" })]
        } else {
            Vec::new()
        }
    }
}

/// `GET /reviews/{bookId}`; the segment is a book reference, not a review id.
pub async fn reviews_for_book(
    State(db): State<Database>,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(db.reviews_for_book(&book_id).await?))
}

pub async fn create_review(
    State(db): State<Database>,
    ApiJson(fields): ApiJson<ReviewFields>,
) -> Result<Json<InsertOutcome>, AppError> {
    let fields = validated(fields, "Invalid review")?;
    let book_id = fields.book_id.clone();
    let reviewer = fields.user_email.clone();

    match db.insert_review(fields).await {
        Ok(outcome) => {
            tracing::info!(book_id = %book_id, review_id = %outcome.inserted_id, "review added");
            Ok(Json(outcome))
        }
        Err(StoreError::Duplicate { .. }) => Err(AppError::conflict(
            vec![json!({ "bookId": book_id, "userEmail": reviewer })],
            "Already reviewed",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn update_review(
    State(db): State<Database>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReviewTextUpdate>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;
    let body = validated(body, "Invalid review update")?;
    Ok(Json(db.update_review_text(&id, &body.review).await?))
}

pub async fn delete_review(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(db.delete_review(&id).await?))
}
