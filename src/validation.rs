//! Boundary checks applied to request bodies before they reach the store.

use bookshelf_db::models::{BookChanges, BookFields, OfferFields, ReviewFields};
use bookshelf_http::error::AppError;
use serde_json::{json, Map, Value};

/// A request payload that can describe what is wrong with it.
pub trait Validate {
    /// One JSON object per problem; empty when the payload is acceptable.
    fn issues(&self) -> Vec<Value>;
}

/// Pass `value` through, or fail with a validation error listing its issues.
pub fn validated<T: Validate>(value: T, message: &str) -> Result<T, AppError> {
    let issues = value.issues();
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(AppError::validation(issues, message))
    }
}

fn issue(field: &str, error: &str) -> Value {
    json!({ "field": field, "error": error })
}

fn require_text(issues: &mut Vec<Value>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(issue(field, "required"));
    }
}

fn require_email(issues: &mut Vec<Value>, field: &str, value: &str) {
    let well_formed = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        issues.push(issue(field, "must be an email address"));
    }
}

fn reject_id(issues: &mut Vec<Value>, extra: &Map<String, Value>) {
    if extra.contains_key("_id") {
        issues.push(issue("_id", "assigned by the server"));
    }
}

impl Validate for BookFields {
    fn issues(&self) -> Vec<Value> {
        let mut issues = Vec::new();
        require_text(&mut issues, "title", &self.title);
        require_text(&mut issues, "author", &self.author);
        require_email(&mut issues, "user_email", &self.user_email);
        reject_id(&mut issues, &self.extra);
        issues
    }
}

impl Validate for BookChanges {
    fn issues(&self) -> Vec<Value> {
        let mut issues = Vec::new();
        if self.is_empty() {
            issues.push(issue("body", "no fields to update"));
        }
        if let Some(title) = &self.title {
            require_text(&mut issues, "title", title);
        }
        if let Some(author) = &self.author {
            require_text(&mut issues, "author", author);
        }
        if let Some(email) = &self.user_email {
            require_email(&mut issues, "user_email", email);
        }
        reject_id(&mut issues, &self.extra);
        issues
    }
}

impl Validate for ReviewFields {
    fn issues(&self) -> Vec<Value> {
        let mut issues = Vec::new();
        require_text(&mut issues, "bookId", &self.book_id);
        require_email(&mut issues, "userEmail", &self.user_email);
        require_text(&mut issues, "review", &self.review);
        reject_id(&mut issues, &self.extra);
        issues
    }
}

impl Validate for OfferFields {
    fn issues(&self) -> Vec<Value> {
        let mut issues = Vec::new();
        if self.is_empty() {
            issues.push(issue("body", "offer has no fields"));
        }
        reject_id(&mut issues, self);
        issues
    }
}
