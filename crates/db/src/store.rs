use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{
    Book, BookChanges, BookFields, CollectionCounts, DeleteOutcome, InsertOutcome, OfferFields,
    ReadingStatus, RecordId, Review, ReviewFields, ReviewerTally, SpecialOffer, UpdateOutcome,
};

/// Collections backing the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Books,
    Reviews,
    Users,
    SpecialOffers,
}

impl CollectionKind {
    /// Name of the collection in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Books => "addBook",
            Self::Reviews => "reviews",
            Self::Users => "users",
            Self::SpecialOffers => "specialOffer",
        }
    }
}

/// Ascending index declared by a module and created at startup.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: &'static str,
    pub collection: CollectionKind,
    pub keys: &'static [&'static str],
    pub unique: bool,
}

/// Operations the HTTP modules run against the document store.
///
/// One call per request; implementations hold their own connection handle
/// and are shared across requests behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round-trip to the backend.
    async fn ping(&self) -> StoreResult<()>;

    /// Create the given indexes. Existing indexes with the same definition are left alone.
    async fn ensure_indexes(&self, specs: &[IndexSpec]) -> StoreResult<()>;

    async fn insert_book(&self, fields: BookFields) -> StoreResult<InsertOutcome>;

    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    async fn find_book(&self, id: &RecordId) -> StoreResult<Option<Book>>;

    async fn books_by_owner(&self, email: &str) -> StoreResult<Vec<Book>>;

    /// Books ordered by `upvote`, highest first.
    async fn popular_books(&self, limit: usize) -> StoreResult<Vec<Book>>;

    async fn update_book(&self, id: &RecordId, changes: BookChanges)
        -> StoreResult<UpdateOutcome>;

    async fn increment_upvote(&self, id: &RecordId) -> StoreResult<UpdateOutcome>;

    async fn set_reading_status(
        &self,
        id: &RecordId,
        status: ReadingStatus,
    ) -> StoreResult<UpdateOutcome>;

    async fn delete_book(&self, id: &RecordId) -> StoreResult<DeleteOutcome>;

    async fn reviews_for_book(&self, book_id: &str) -> StoreResult<Vec<Review>>;

    /// Insert a review. Fails with [`crate::StoreError::Duplicate`] when the
    /// reviewer already reviewed the book.
    async fn insert_review(&self, fields: ReviewFields) -> StoreResult<InsertOutcome>;

    async fn update_review_text(&self, id: &RecordId, text: &str) -> StoreResult<UpdateOutcome>;

    async fn delete_review(&self, id: &RecordId) -> StoreResult<DeleteOutcome>;

    /// Reviewers ranked by number of reviews, ties broken by email.
    async fn top_reviewers(&self, limit: usize) -> StoreResult<Vec<ReviewerTally>>;

    async fn insert_offer(&self, fields: OfferFields) -> StoreResult<InsertOutcome>;

    async fn list_offers(&self, limit: usize) -> StoreResult<Vec<SpecialOffer>>;

    async fn counts(&self) -> StoreResult<CollectionCounts>;
}
