//! Typed records persisted in the bookshelf collections.
//!
//! Every record keeps the fields the service reasons about as typed members
//! and carries whatever else the client sent in a flattened `extra` map, so a
//! stored document reads back exactly as it was written plus its `_id`.

use std::{fmt, str::FromStr};

use mongodb::bson::oid::ObjectId;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::StoreError;

/// Primary key of a stored document, rendered as a 24 character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(ObjectId);

impl RecordId {
    /// Allocate a fresh identifier.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    /// Parse a hex identifier taken from a request path.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| StoreError::InvalidId(raw.to_string()))
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for RecordId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Where a reader is with a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[serde(rename = "Want-to-Read")]
    WantToRead,
    Reading,
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [Self::WantToRead, Self::Reading, Self::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WantToRead => "Want-to-Read",
            Self::Reading => "Reading",
            Self::Read => "Read",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown reading status '{0}'")]
pub struct UnknownReadingStatus(pub String);

impl FromStr for ReadingStatus {
    type Err = UnknownReadingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownReadingStatus(s.to_string()))
    }
}

/// Body of a book document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owner of the shelf entry.
    #[serde(default)]
    pub user_email: String,
    /// Absent until the first upvote or an explicit value is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_status: Option<ReadingStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookFields {
    /// Upvote count, treating an absent counter as zero.
    pub fn upvotes(&self) -> i64 {
        self.upvote.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: BookFields,
}

/// Partial update of a book; only the present members are written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_status: Option<ReadingStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.user_email.is_none()
            && self.upvote.is_none()
            && self.reading_status.is_none()
            && self.extra.is_empty()
    }

    /// Apply the changes to a book body with `$set` semantics.
    pub fn apply(&self, fields: &mut BookFields) {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(author) = &self.author {
            fields.author = author.clone();
        }
        if let Some(description) = &self.description {
            fields.description = Some(description.clone());
        }
        if let Some(user_email) = &self.user_email {
            fields.user_email = user_email.clone();
        }
        if let Some(upvote) = self.upvote {
            fields.upvote = Some(upvote);
        }
        if let Some(status) = self.reading_status {
            fields.reading_status = Some(status);
        }
        for (key, value) in &self.extra {
            fields.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Body of a review document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFields {
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub review: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: ReviewFields,
}

/// Free-form promotional fields.
pub type OfferFields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialOffer {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: OfferFields,
}

/// Registered reader profile. Only ever counted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// One row of the top reviewers aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerTally {
    #[serde(rename = "_id")]
    pub email: String,
    #[serde(rename = "totalReviews")]
    pub total_reviews: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub book_count: u64,
    pub user_count: u64,
    pub review_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: RecordId,
}

impl InsertOutcome {
    pub fn new(inserted_id: RecordId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<RecordId>,
}

impl UpdateOutcome {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_rejects_malformed_hex() {
        assert!(RecordId::parse("not-an-id").is_err());
        assert!(RecordId::parse("65f0c0ffee0000000000000").is_err());
        assert!(RecordId::parse("65f0c0ffee00000000000000").is_ok());
    }

    #[test]
    fn record_id_serializes_as_hex_string() {
        let id = RecordId::parse("65f0c0ffee00000000000001").unwrap();
        assert_eq!(
            serde_json::to_value(id).unwrap(),
            json!("65f0c0ffee00000000000001")
        );
    }

    #[test]
    fn reading_status_uses_wire_names() {
        assert_eq!(
            "Want-to-Read".parse::<ReadingStatus>().unwrap(),
            ReadingStatus::WantToRead
        );
        assert_eq!(
            serde_json::to_value(ReadingStatus::Reading).unwrap(),
            json!("Reading")
        );
        assert!("reading".parse::<ReadingStatus>().is_err());
        assert!("Invalid".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn book_keeps_unknown_fields() {
        let book: Book = serde_json::from_value(json!({
            "_id": "65f0c0ffee00000000000002",
            "title": "Dune",
            "author": "Frank Herbert",
            "user_email": "paul@arrakis.test",
            "cover_photo": "https://img.test/dune.png",
            "total_page": 412
        }))
        .unwrap();

        assert_eq!(book.fields.upvote, None);
        assert_eq!(book.fields.upvotes(), 0);
        assert_eq!(book.fields.extra["total_page"], json!(412));

        let echoed = serde_json::to_value(&book).unwrap();
        assert_eq!(echoed["cover_photo"], json!("https://img.test/dune.png"));
        assert_eq!(echoed["_id"], json!("65f0c0ffee00000000000002"));
        assert!(echoed.get("reading_status").is_none());
        assert!(echoed.get("upvote").is_none());
    }

    #[test]
    fn book_changes_apply_only_present_members() {
        let mut fields = BookFields {
            title: "Old".into(),
            author: "A".into(),
            user_email: "a@b.test".into(),
            upvote: Some(4),
            ..Default::default()
        };
        let changes: BookChanges =
            serde_json::from_value(json!({"title": "New", "shelf": "top"})).unwrap();

        changes.apply(&mut fields);

        assert_eq!(fields.title, "New");
        assert_eq!(fields.author, "A");
        assert_eq!(fields.upvote, Some(4));
        assert_eq!(fields.extra["shelf"], json!("top"));
        assert!(!changes.is_empty());
        assert!(BookChanges::default().is_empty());
    }

    #[test]
    fn review_fields_use_camel_case() {
        let review: ReviewFields = serde_json::from_value(json!({
            "bookId": "b1",
            "userEmail": "r@x.test",
            "review": "great",
            "rating": 5
        }))
        .unwrap();
        assert_eq!(review.book_id, "b1");
        assert_eq!(review.extra["rating"], json!(5));
    }

    #[test]
    fn outcomes_mirror_driver_shapes() {
        let id = RecordId::parse("65f0c0ffee00000000000003").unwrap();
        assert_eq!(
            serde_json::to_value(InsertOutcome::new(id)).unwrap(),
            json!({"acknowledged": true, "insertedId": "65f0c0ffee00000000000003"})
        );
        assert_eq!(
            serde_json::to_value(UpdateOutcome::new(1, 0)).unwrap(),
            json!({"acknowledged": true, "matchedCount": 1, "modifiedCount": 0, "upsertedId": null})
        );
        assert_eq!(
            serde_json::to_value(DeleteOutcome::new(1)).unwrap(),
            json!({"acknowledged": true, "deletedCount": 1})
        );
    }
}
