//! MongoDB backend.

use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Book, BookChanges, BookFields, CollectionCounts, DeleteOutcome, InsertOutcome, OfferFields,
    ReadingStatus, RecordId, Review, ReviewFields, ReviewerTally, SpecialOffer, UpdateOutcome,
};
use crate::settings::DatabaseSettings;
use crate::store::{CollectionKind, DocumentStore, IndexSpec};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Store backed by a single shared MongoDB client.
pub struct MongoStore {
    client: Client,
    books: Collection<Document>,
    reviews: Collection<Document>,
    users: Collection<Document>,
    offers: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(settings.connection_uri())
            .await
            .with_context(|| "failed to parse MongoDB connection string")?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options).with_context(|| "failed to create MongoDB client")?;
        Ok(Self::from_client(client, &settings.name))
    }

    pub fn from_client(client: Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            books: db.collection(CollectionKind::Books.as_str()),
            reviews: db.collection(CollectionKind::Reviews.as_str()),
            users: db.collection(CollectionKind::Users.as_str()),
            offers: db.collection(CollectionKind::SpecialOffers.as_str()),
            client,
        }
    }

    fn collection(&self, kind: CollectionKind) -> &Collection<Document> {
        match kind {
            CollectionKind::Books => &self.books,
            CollectionKind::Reviews => &self.reviews,
            CollectionKind::Users => &self.users,
            CollectionKind::SpecialOffers => &self.offers,
        }
    }

    async fn insert(&self, kind: CollectionKind, document: Document) -> StoreResult<InsertOutcome> {
        let result = self.collection(kind).insert_one(document).await.map_err(|err| {
            if is_duplicate_key(&err) {
                StoreError::Duplicate {
                    collection: kind.as_str(),
                }
            } else {
                StoreError::Backend(err)
            }
        })?;

        match result.inserted_id {
            Bson::ObjectId(id) => Ok(InsertOutcome::new(id.into())),
            _ => Err(StoreError::MissingId {
                collection: kind.as_str(),
            }),
        }
    }

    async fn find_all(
        &self,
        kind: CollectionKind,
        filter: Document,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let mut find = self.collection(kind).find(filter);
        if let Some(limit) = limit {
            find = find.limit(limit as i64);
        }
        Ok(find.await?.try_collect().await?)
    }

    async fn update(
        &self,
        kind: CollectionKind,
        id: &RecordId,
        update: Document,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(kind)
            .update_one(doc! { "_id": id.object_id() }, update)
            .await?;
        Ok(UpdateOutcome::new(result.matched_count, result.modified_count))
    }

    async fn delete(&self, kind: CollectionKind, id: &RecordId) -> StoreResult<DeleteOutcome> {
        let result = self
            .collection(kind)
            .delete_one(doc! { "_id": id.object_id() })
            .await?;
        Ok(DeleteOutcome::new(result.deleted_count))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

/// Split a stored document into its id and typed body.
fn decode<T: DeserializeOwned>(
    kind: CollectionKind,
    mut document: Document,
) -> StoreResult<(RecordId, T)> {
    let id = match document.remove("_id") {
        Some(Bson::ObjectId(id)) => RecordId::from(id),
        _ => {
            return Err(StoreError::MissingId {
                collection: kind.as_str(),
            })
        }
    };
    Ok((id, bson::from_document(document)?))
}

/// Decode a listing. Documents that no longer fit the typed record are logged
/// and left out so one stray document cannot fail the whole listing.
fn decode_each<T>(
    documents: Vec<Document>,
    decode: fn(Document) -> StoreResult<T>,
) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").cloned();
            match decode(document) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(
                        target: "bookshelf-db",
                        id = ?id,
                        error = %err,
                        "skipping undecodable document"
                    );
                    None
                }
            }
        })
        .collect()
}

fn decode_book(document: Document) -> StoreResult<Book> {
    let (id, fields) = decode(CollectionKind::Books, document)?;
    Ok(Book { id, fields })
}

fn decode_review(document: Document) -> StoreResult<Review> {
    let (id, fields) = decode(CollectionKind::Reviews, document)?;
    Ok(Review { id, fields })
}

fn decode_offer(document: Document) -> StoreResult<SpecialOffer> {
    let (id, fields) = decode(CollectionKind::SpecialOffers, document)?;
    Ok(SpecialOffer { id, fields })
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn ensure_indexes(&self, specs: &[IndexSpec]) -> StoreResult<()> {
        for spec in specs {
            let mut keys = Document::new();
            for key in spec.keys {
                keys.insert(*key, 1);
            }
            let options = IndexOptions::builder()
                .name(spec.name.to_string())
                .unique(spec.unique)
                .build();
            let model = IndexModel::builder().keys(keys).options(options).build();

            self.collection(spec.collection).create_index(model).await?;
            tracing::info!(
                target: "bookshelf-db",
                index = spec.name,
                collection = spec.collection.as_str(),
                unique = spec.unique,
                "index ensured"
            );
        }
        Ok(())
    }

    async fn insert_book(&self, fields: BookFields) -> StoreResult<InsertOutcome> {
        self.insert(CollectionKind::Books, bson::to_document(&fields)?)
            .await
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let documents = self.find_all(CollectionKind::Books, doc! {}, None).await?;
        Ok(decode_each(documents, decode_book))
    }

    async fn find_book(&self, id: &RecordId) -> StoreResult<Option<Book>> {
        self.books
            .find_one(doc! { "_id": id.object_id() })
            .await?
            .map(decode_book)
            .transpose()
    }

    async fn books_by_owner(&self, email: &str) -> StoreResult<Vec<Book>> {
        let documents = self
            .find_all(CollectionKind::Books, doc! { "user_email": email }, None)
            .await?;
        Ok(decode_each(documents, decode_book))
    }

    async fn popular_books(&self, limit: usize) -> StoreResult<Vec<Book>> {
        let documents: Vec<Document> = self
            .books
            .find(doc! {})
            .sort(doc! { "upvote": -1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(decode_each(documents, decode_book))
    }

    async fn update_book(
        &self,
        id: &RecordId,
        changes: BookChanges,
    ) -> StoreResult<UpdateOutcome> {
        let set = bson::to_document(&changes)?;
        self.update(CollectionKind::Books, id, doc! { "$set": set })
            .await
    }

    async fn increment_upvote(&self, id: &RecordId) -> StoreResult<UpdateOutcome> {
        self.update(CollectionKind::Books, id, doc! { "$inc": { "upvote": 1 } })
            .await
    }

    async fn set_reading_status(
        &self,
        id: &RecordId,
        status: ReadingStatus,
    ) -> StoreResult<UpdateOutcome> {
        self.update(
            CollectionKind::Books,
            id,
            doc! { "$set": { "reading_status": status.as_str() } },
        )
        .await
    }

    async fn delete_book(&self, id: &RecordId) -> StoreResult<DeleteOutcome> {
        self.delete(CollectionKind::Books, id).await
    }

    async fn reviews_for_book(&self, book_id: &str) -> StoreResult<Vec<Review>> {
        let documents = self
            .find_all(CollectionKind::Reviews, doc! { "bookId": book_id }, None)
            .await?;
        Ok(decode_each(documents, decode_review))
    }

    async fn insert_review(&self, fields: ReviewFields) -> StoreResult<InsertOutcome> {
        // The unique (bookId, userEmail) index closes the race; this lookup keeps
        // the rule in force on deployments where the index could not be built.
        let existing = self
            .reviews
            .find_one(doc! { "bookId": fields.book_id.as_str(), "userEmail": fields.user_email.as_str() })
            .await?;
        if existing.is_some() {
            return Err(StoreError::Duplicate {
                collection: CollectionKind::Reviews.as_str(),
            });
        }

        self.insert(CollectionKind::Reviews, bson::to_document(&fields)?)
            .await
    }

    async fn update_review_text(&self, id: &RecordId, text: &str) -> StoreResult<UpdateOutcome> {
        self.update(CollectionKind::Reviews, id, doc! { "$set": { "review": text } })
            .await
    }

    async fn delete_review(&self, id: &RecordId) -> StoreResult<DeleteOutcome> {
        self.delete(CollectionKind::Reviews, id).await
    }

    async fn top_reviewers(&self, limit: usize) -> StoreResult<Vec<ReviewerTally>> {
        let pipeline = vec![
            doc! { "$match": { "userEmail": { "$type": "string" } } },
            doc! { "$group": { "_id": "$userEmail", "totalReviews": { "$sum": 1 } } },
            doc! { "$sort": { "totalReviews": -1, "_id": 1 } },
            doc! { "$limit": limit as i64 },
        ];
        let documents: Vec<Document> = self.reviews.aggregate(pipeline).await?.try_collect().await?;
        documents
            .into_iter()
            .map(|document| Ok(bson::from_document(document)?))
            .collect()
    }

    async fn insert_offer(&self, fields: OfferFields) -> StoreResult<InsertOutcome> {
        self.insert(CollectionKind::SpecialOffers, bson::to_document(&fields)?)
            .await
    }

    async fn list_offers(&self, limit: usize) -> StoreResult<Vec<SpecialOffer>> {
        let documents = self
            .find_all(CollectionKind::SpecialOffers, doc! {}, Some(limit))
            .await?;
        Ok(decode_each(documents, decode_offer))
    }

    async fn counts(&self) -> StoreResult<CollectionCounts> {
        Ok(CollectionCounts {
            book_count: self.books.count_documents(doc! {}).await?,
            user_count: self.users.count_documents(doc! {}).await?,
            review_count: self.reviews.count_documents(doc! {}).await?,
        })
    }
}
