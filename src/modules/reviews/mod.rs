pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookshelf_db::{CollectionKind, Database, IndexSpec};
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use crate::utils::openapi::{array_of, json_body, operation, path_param, responses, schema_ref};

/// One review per reader per book
pub struct ReviewsModule {
    db: Database,
}

impl ReviewsModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = CollectionKind::Reviews.as_str(),
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        // GET reads the segment as a book id, PATCH/DELETE as a review id.
        Router::new()
            .route("/reviews", post(handlers::create_review))
            .route(
                "/reviews/{id}",
                get(handlers::reviews_for_book)
                    .patch(handlers::update_review)
                    .delete(handlers::delete_review),
            )
            .with_state(self.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let mut create = operation(
            "Review a book (once per reader)",
            "Reviews",
            responses("Insert result", schema_ref("InsertResult"), &["400", "500"]),
        );
        create["requestBody"] = json_body("ReviewInput");

        let mut list = operation(
            "List reviews of a book",
            "Reviews",
            responses("Reviews", array_of("Review"), &["500"]),
        );
        list["parameters"] = json!([path_param("id", "Book id the reviews refer to")]);

        let review_id = path_param("id", "Review id (24 character hex)");
        let mut edit = operation(
            "Replace a review's text",
            "Reviews",
            responses("Update result", schema_ref("UpdateResult"), &["400", "500"]),
        );
        edit["parameters"] = json!([review_id.clone()]);
        edit["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": {
                "type": "object",
                "properties": { "review": { "type": "string" } },
                "required": ["review"]
            } } }
        });

        let mut remove = operation(
            "Delete a review",
            "Reviews",
            responses("Delete result", schema_ref("DeleteResult"), &["400", "500"]),
        );
        remove["parameters"] = json!([review_id]);

        Some(json!({
            "paths": {
                "/reviews": { "post": create },
                "/reviews/{id}": { "get": list, "patch": edit, "delete": remove }
            },
            "components": {
                "schemas": {
                    "ReviewInput": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string" },
                            "userEmail": { "type": "string" },
                            "review": { "type": "string" }
                        },
                        "required": ["bookId", "userEmail", "review"]
                    },
                    "Review": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "bookId": { "type": "string" },
                            "userEmail": { "type": "string" },
                            "review": { "type": "string" }
                        },
                        "required": ["_id", "bookId", "userEmail", "review"]
                    }
                }
            }
        }))
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![IndexSpec {
            name: "reviews_book_reviewer_unique",
            collection: CollectionKind::Reviews,
            keys: &["bookId", "userEmail"],
            unique: true,
        }]
    }
}

/// Create a new instance of the reviews module
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(ReviewsModule::new(db))
}
