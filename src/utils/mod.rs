//! Project-specific utilities live here.

pub mod openapi;

use bookshelf_db::models::RecordId;
use bookshelf_http::error::AppError;

/// Parse a path segment as a document id, rejecting malformed ids with a 400.
pub fn parse_id(raw: &str) -> Result<RecordId, AppError> {
    Ok(RecordId::parse(raw)?)
}
