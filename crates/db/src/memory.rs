//! Process-local backend used by tests and `backend = "memory"` deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Book, BookChanges, BookFields, CollectionCounts, DeleteOutcome, InsertOutcome, OfferFields,
    ReadingStatus, RecordId, Review, ReviewFields, ReviewerTally, SpecialOffer, UpdateOutcome,
    User,
};
use crate::store::{CollectionKind, DocumentStore, IndexSpec};

#[derive(Default)]
struct Collections {
    books: Vec<Book>,
    reviews: Vec<Review>,
    users: Vec<User>,
    offers: Vec<SpecialOffer>,
}

/// Document store kept entirely in memory. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user profile. Users have no HTTP write path; this seeds them.
    pub fn seed_user(&self, profile: Map<String, Value>) -> RecordId {
        let id = RecordId::generate();
        self.state.write().users.push(User { id, profile });
        id
    }
}

/// Run `mutate` on the matching record, reporting modified only when it changed.
fn update_where<T, F>(records: &mut [T], matches: impl Fn(&T) -> bool, mutate: F) -> UpdateOutcome
where
    T: Clone + PartialEq,
    F: FnOnce(&mut T),
{
    match records.iter_mut().find(|record| matches(record)) {
        Some(record) => {
            let before = record.clone();
            mutate(record);
            UpdateOutcome::new(1, u64::from(*record != before))
        }
        None => UpdateOutcome::new(0, 0),
    }
}

fn delete_where<T>(records: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> DeleteOutcome {
    match records.iter().position(matches) {
        Some(index) => {
            records.remove(index);
            DeleteOutcome::new(1)
        }
        None => DeleteOutcome::new(0),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ensure_indexes(&self, specs: &[IndexSpec]) -> StoreResult<()> {
        // Review uniqueness is enforced inside `insert_review`; nothing to build.
        for spec in specs {
            tracing::debug!(
                target: "bookshelf-db",
                index = spec.name,
                collection = spec.collection.as_str(),
                "memory store skips index creation"
            );
        }
        Ok(())
    }

    async fn insert_book(&self, fields: BookFields) -> StoreResult<InsertOutcome> {
        let id = RecordId::generate();
        self.state.write().books.push(Book { id, fields });
        Ok(InsertOutcome::new(id))
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.state.read().books.clone())
    }

    async fn find_book(&self, id: &RecordId) -> StoreResult<Option<Book>> {
        Ok(self
            .state
            .read()
            .books
            .iter()
            .find(|book| book.id == *id)
            .cloned())
    }

    async fn books_by_owner(&self, email: &str) -> StoreResult<Vec<Book>> {
        Ok(self
            .state
            .read()
            .books
            .iter()
            .filter(|book| book.fields.user_email == email)
            .cloned()
            .collect())
    }

    async fn popular_books(&self, limit: usize) -> StoreResult<Vec<Book>> {
        let mut books = self.state.read().books.clone();
        books.sort_by_key(|book| std::cmp::Reverse(book.fields.upvotes()));
        books.truncate(limit);
        Ok(books)
    }

    async fn update_book(
        &self,
        id: &RecordId,
        changes: BookChanges,
    ) -> StoreResult<UpdateOutcome> {
        let mut state = self.state.write();
        Ok(update_where(
            &mut state.books,
            |book: &Book| book.id == *id,
            |book| changes.apply(&mut book.fields),
        ))
    }

    async fn increment_upvote(&self, id: &RecordId) -> StoreResult<UpdateOutcome> {
        let mut state = self.state.write();
        let Some(book) = state.books.iter_mut().find(|book| book.id == *id) else {
            return Ok(UpdateOutcome::new(0, 0));
        };

        let next = book
            .fields
            .upvotes()
            .checked_add(1)
            .ok_or(StoreError::CounterOverflow {
                collection: CollectionKind::Books.as_str(),
                field: "upvote",
            })?;
        book.fields.upvote = Some(next);
        Ok(UpdateOutcome::new(1, 1))
    }

    async fn set_reading_status(
        &self,
        id: &RecordId,
        status: ReadingStatus,
    ) -> StoreResult<UpdateOutcome> {
        let mut state = self.state.write();
        Ok(update_where(
            &mut state.books,
            |book: &Book| book.id == *id,
            |book| book.fields.reading_status = Some(status),
        ))
    }

    async fn delete_book(&self, id: &RecordId) -> StoreResult<DeleteOutcome> {
        Ok(delete_where(&mut self.state.write().books, |book: &Book| {
            book.id == *id
        }))
    }

    async fn reviews_for_book(&self, book_id: &str) -> StoreResult<Vec<Review>> {
        Ok(self
            .state
            .read()
            .reviews
            .iter()
            .filter(|review| review.fields.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn insert_review(&self, fields: ReviewFields) -> StoreResult<InsertOutcome> {
        let mut state = self.state.write();
        let duplicate = state.reviews.iter().any(|review| {
            review.fields.book_id == fields.book_id && review.fields.user_email == fields.user_email
        });
        if duplicate {
            return Err(StoreError::Duplicate {
                collection: CollectionKind::Reviews.as_str(),
            });
        }

        let id = RecordId::generate();
        state.reviews.push(Review { id, fields });
        Ok(InsertOutcome::new(id))
    }

    async fn update_review_text(&self, id: &RecordId, text: &str) -> StoreResult<UpdateOutcome> {
        let mut state = self.state.write();
        Ok(update_where(
            &mut state.reviews,
            |review: &Review| review.id == *id,
            |review| review.fields.review = text.to_string(),
        ))
    }

    async fn delete_review(&self, id: &RecordId) -> StoreResult<DeleteOutcome> {
        Ok(delete_where(&mut self.state.write().reviews, |review: &Review| {
            review.id == *id
        }))
    }

    async fn top_reviewers(&self, limit: usize) -> StoreResult<Vec<ReviewerTally>> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for review in &self.state.read().reviews {
            *totals.entry(review.fields.user_email.clone()).or_default() += 1;
        }

        let mut ranked: Vec<ReviewerTally> = totals
            .into_iter()
            .map(|(email, total_reviews)| ReviewerTally {
                email,
                total_reviews,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_reviews
                .cmp(&a.total_reviews)
                .then_with(|| a.email.cmp(&b.email))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn insert_offer(&self, fields: OfferFields) -> StoreResult<InsertOutcome> {
        let id = RecordId::generate();
        self.state.write().offers.push(SpecialOffer { id, fields });
        Ok(InsertOutcome::new(id))
    }

    async fn list_offers(&self, limit: usize) -> StoreResult<Vec<SpecialOffer>> {
        Ok(self
            .state
            .read()
            .offers
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn counts(&self) -> StoreResult<CollectionCounts> {
        let state = self.state.read();
        Ok(CollectionCounts {
            book_count: state.books.len() as u64,
            user_count: state.users.len() as u64,
            review_count: state.reviews.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(owner: &str, upvote: i64) -> BookFields {
        BookFields {
            title: format!("{owner}'s book"),
            author: "Anon".into(),
            user_email: owner.into(),
            upvote: Some(upvote),
            ..Default::default()
        }
    }

    fn review(book_id: &str, email: &str) -> ReviewFields {
        ReviewFields {
            book_id: book_id.into(),
            user_email: email.into(),
            review: "worth reading".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upvote_increments_are_unbounded_counters() {
        let store = MemoryStore::new();
        let id = store.insert_book(book("a@x.test", 0)).await.unwrap().inserted_id;

        for _ in 0..5 {
            let outcome = store.increment_upvote(&id).await.unwrap();
            assert_eq!(outcome.modified_count, 1);
        }

        let stored = store.find_book(&id).await.unwrap().unwrap();
        assert_eq!(stored.fields.upvote, Some(5));
    }

    #[tokio::test]
    async fn upvote_starts_absent_counter_at_one() {
        let store = MemoryStore::new();
        let fields = BookFields {
            upvote: None,
            ..book("a@x.test", 0)
        };
        let id = store.insert_book(fields).await.unwrap().inserted_id;

        store.increment_upvote(&id).await.unwrap();

        let stored = store.find_book(&id).await.unwrap().unwrap();
        assert_eq!(stored.fields.upvote, Some(1));
    }

    #[tokio::test]
    async fn upvote_overflow_is_an_error_not_a_panic() {
        let store = MemoryStore::new();
        let id = store
            .insert_book(book("a@x.test", i64::MAX))
            .await
            .unwrap()
            .inserted_id;

        let err = store.increment_upvote(&id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::CounterOverflow { field: "upvote", .. }
        ));

        let stored = store.find_book(&id).await.unwrap().unwrap();
        assert_eq!(stored.fields.upvote, Some(i64::MAX));
    }

    #[tokio::test]
    async fn popular_books_are_sorted_and_bounded() {
        let store = MemoryStore::new();
        for upvote in [3, 9, 0, 12, 5, 1, 7, 7, 2, 4] {
            store.insert_book(book("a@x.test", upvote)).await.unwrap();
        }

        let popular = store.popular_books(8).await.unwrap();
        let votes: Vec<i64> = popular.iter().map(|b| b.fields.upvotes()).collect();
        assert_eq!(votes, vec![12, 9, 7, 7, 5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn setting_same_status_modifies_nothing() {
        let store = MemoryStore::new();
        let id = store.insert_book(book("a@x.test", 0)).await.unwrap().inserted_id;

        let first = store
            .set_reading_status(&id, ReadingStatus::Reading)
            .await
            .unwrap();
        let second = store
            .set_reading_status(&id, ReadingStatus::Reading)
            .await
            .unwrap();

        assert_eq!(first, UpdateOutcome::new(1, 1));
        assert_eq!(second, UpdateOutcome::new(1, 0));
    }

    #[tokio::test]
    async fn duplicate_review_is_rejected() {
        let store = MemoryStore::new();
        store.insert_review(review("b1", "r@x.test")).await.unwrap();

        let err = store
            .insert_review(review("b1", "r@x.test"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        store.insert_review(review("b2", "r@x.test")).await.unwrap();
        assert_eq!(store.counts().await.unwrap().review_count, 2);
    }

    #[tokio::test]
    async fn top_reviewers_rank_by_count_then_email() {
        let store = MemoryStore::new();
        let tallies = [("c@x.test", 1), ("a@x.test", 5), ("b@x.test", 3), ("d@x.test", 3)];
        for (email, count) in tallies {
            for n in 0..count {
                store
                    .insert_review(review(&format!("book-{n}"), email))
                    .await
                    .unwrap();
            }
        }

        let top = store.top_reviewers(3).await.unwrap();
        let ranked: Vec<(&str, u64)> = top
            .iter()
            .map(|t| (t.email.as_str(), t.total_reviews))
            .collect();
        assert_eq!(ranked, vec![("a@x.test", 5), ("b@x.test", 3), ("d@x.test", 3)]);
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let store = MemoryStore::new();
        let keep = store.insert_book(book("a@x.test", 0)).await.unwrap().inserted_id;
        let gone = store.insert_book(book("a@x.test", 0)).await.unwrap().inserted_id;

        assert_eq!(store.delete_book(&gone).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_book(&gone).await.unwrap().deleted_count, 0);
        assert!(store.find_book(&gone).await.unwrap().is_none());
        assert!(store.find_book(&keep).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn counts_include_seeded_users() {
        let store = MemoryStore::new();
        store.seed_user(Map::new());
        store.insert_book(book("a@x.test", 0)).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.book_count, 1);
        assert_eq!(counts.user_count, 1);
        assert_eq!(counts.review_count, 0);
    }
}
