use axum::{
    extract::{Path, State},
    Json,
};
use bookshelf_db::{
    models::{Book, BookChanges, BookFields, DeleteOutcome, InsertOutcome, ReadingStatus, UpdateOutcome},
    Database,
};
use bookshelf_http::{
    error::AppError,
    extract::{ApiJson, ApiQuery},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::utils::parse_id;
use crate::validation::validated;

/// Most-upvoted books returned by `GET /popularBook`.
pub const POPULAR_LIMIT: usize = 8;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub email: String,
}

/// Any JSON value is accepted so that non-string statuses get the same 400
/// as unknown strings.
#[derive(Debug, Deserialize)]
pub struct ReadingStatusUpdate {
    #[serde(default)]
    pub reading_status: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatusChanged {
    pub success: bool,
    pub modified_count: u64,
}

pub async fn create_book(
    State(db): State<Database>,
    ApiJson(fields): ApiJson<BookFields>,
) -> Result<Json<InsertOutcome>, AppError> {
    let fields = validated(fields, "Invalid book")?;
    let outcome = db.insert_book(fields).await?;
    tracing::info!(book_id = %outcome.inserted_id, "book added");
    Ok(Json(outcome))
}

pub async fn list_books(State(db): State<Database>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(db.list_books().await?))
}

/// Shared by `/addBook/{id}`, `/editBook/{id}` and `/popularBook/{id}`.
pub async fn get_book(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Option<Book>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(db.find_book(&id).await?))
}

pub async fn upvote_book(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(db.increment_upvote(&id).await?))
}

pub async fn books_by_owner(
    State(db): State<Database>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(db.books_by_owner(&query.email).await?))
}

pub async fn update_book(
    State(db): State<Database>,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<BookChanges>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let id = parse_id(&id)?;
    let changes = validated(changes, "Invalid book update")?;
    Ok(Json(db.update_book(&id, changes).await?))
}

pub async fn delete_book(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_id(&id)?;
    let outcome = db.delete_book(&id).await?;
    tracing::info!(book_id = %id, deleted = outcome.deleted_count, "book delete requested");
    Ok(Json(outcome))
}

pub async fn popular_books(State(db): State<Database>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(db.popular_books(POPULAR_LIMIT).await?))
}

pub async fn update_reading_status(
    State(db): State<Database>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReadingStatusUpdate>,
) -> Result<Json<ReadingStatusChanged>, AppError> {
    let status = body
        .reading_status
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<ReadingStatus>().ok())
        .ok_or_else(|| {
            AppError::validation(
                vec![json!({
                    "field": "reading_status",
                    "value": body.reading_status,
                    "allowed": ReadingStatus::ALL.map(|s| s.as_str()),
                })],
                "Invalid reading status",
            )
        })?;
    let id = parse_id(&id)?;

    let outcome = db
        .set_reading_status(&id, status)
        .await
        .map_err(|err| AppError::internal(err, "Failed to update reading status"))?;

    if outcome.modified_count == 0 {
        return Err(AppError::not_found("Book not found or status unchanged"));
    }

    Ok(Json(ReadingStatusChanged {
        success: true,
        modified_count: outcome.modified_count,
    }))
}
