pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use bookshelf_db::{CollectionKind, Database, IndexSpec};
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use crate::utils::openapi::{array_of, json_body, operation, path_param, responses, schema_ref};

/// Book shelf entries: add, browse, edit, upvote, track reading status
pub struct BooksModule {
    db: Database,
}

impl BooksModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = CollectionKind::Books.as_str(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/addBook",
                post(handlers::create_book).get(handlers::list_books),
            )
            .route(
                "/addBook/{id}",
                get(handlers::get_book).patch(handlers::upvote_book),
            )
            .route("/getuserbook", get(handlers::books_by_owner))
            .route("/editBook/{id}", get(handlers::get_book))
            .route("/updateBook/{id}", put(handlers::update_book))
            .route("/delete/{id}", delete(handlers::delete_book))
            .route("/popularBook", get(handlers::popular_books))
            .route("/popularBook/{id}", get(handlers::get_book))
            .route(
                "/books/{id}/reading-status",
                patch(handlers::update_reading_status),
            )
            .with_state(self.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id = path_param("id", "Book id (24 character hex)");
        let maybe_book = json!({ "oneOf": [schema_ref("Book"), { "type": "null" }] });

        let mut fetch_by_id = operation(
            "Fetch a book by id",
            "Books",
            responses("Book or null", maybe_book, &["400", "500"]),
        );
        fetch_by_id["parameters"] = json!([id.clone()]);

        let mut upvote = operation(
            "Increment a book's upvote counter",
            "Books",
            responses("Update result", schema_ref("UpdateResult"), &["400", "500"]),
        );
        upvote["parameters"] = json!([id.clone()]);

        let mut create = operation(
            "Add a book",
            "Books",
            responses("Insert result", schema_ref("InsertResult"), &["400", "500"]),
        );
        create["requestBody"] = json_body("BookInput");

        let mut by_owner = operation(
            "List books owned by a user",
            "Books",
            responses("Books", array_of("Book"), &["400", "500"]),
        );
        by_owner["parameters"] = json!([{
            "name": "email",
            "in": "query",
            "required": true,
            "schema": { "type": "string" }
        }]);

        let mut update = operation(
            "Set fields on a book",
            "Books",
            responses("Update result", schema_ref("UpdateResult"), &["400", "500"]),
        );
        update["parameters"] = json!([id.clone()]);
        update["requestBody"] = json_body("BookChanges");

        let mut remove = operation(
            "Delete a book",
            "Books",
            responses("Delete result", schema_ref("DeleteResult"), &["400", "500"]),
        );
        remove["parameters"] = json!([id.clone()]);

        let mut reading_status = operation(
            "Set a book's reading status",
            "Books",
            responses(
                "Status changed",
                json!({
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "modifiedCount": { "type": "integer" }
                    }
                }),
                &["400", "404", "500"],
            ),
        );
        reading_status["parameters"] = json!([id]);
        reading_status["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": {
                "type": "object",
                "properties": { "reading_status": { "$ref": "#/components/schemas/ReadingStatus" } },
                "required": ["reading_status"]
            } } }
        });

        Some(json!({
            "paths": {
                "/addBook": {
                    "post": create,
                    "get": operation("List all books", "Books", responses("Books", array_of("Book"), &["500"]))
                },
                "/addBook/{id}": { "get": fetch_by_id.clone(), "patch": upvote },
                "/getuserbook": { "get": by_owner },
                "/editBook/{id}": { "get": fetch_by_id.clone() },
                "/updateBook/{id}": { "put": update },
                "/delete/{id}": { "delete": remove },
                "/popularBook": {
                    "get": operation("Most upvoted books (at most 8)", "Books", responses("Books", array_of("Book"), &["500"]))
                },
                "/popularBook/{id}": { "get": fetch_by_id },
                "/books/{id}/reading-status": { "patch": reading_status }
            },
            "components": {
                "schemas": {
                    "ReadingStatus": {
                        "type": "string",
                        "enum": ["Want-to-Read", "Reading", "Read"]
                    },
                    "BookInput": {
                        "type": "object",
                        "description": "Additional properties are stored verbatim",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "user_email": { "type": "string" },
                            "upvote": { "type": "integer" },
                            "reading_status": schema_ref("ReadingStatus")
                        },
                        "required": ["title", "author", "user_email"]
                    },
                    "BookChanges": {
                        "type": "object",
                        "description": "Any subset of book fields",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "user_email": { "type": "string" },
                            "upvote": { "type": "integer" },
                            "reading_status": schema_ref("ReadingStatus")
                        }
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "user_email": { "type": "string" },
                            "upvote": { "type": "integer" },
                            "reading_status": schema_ref("ReadingStatus")
                        },
                        "required": ["_id", "title", "author", "user_email"]
                    },
                    "InsertResult": {
                        "type": "object",
                        "properties": {
                            "acknowledged": { "type": "boolean" },
                            "insertedId": { "type": "string" }
                        }
                    },
                    "UpdateResult": {
                        "type": "object",
                        "properties": {
                            "acknowledged": { "type": "boolean" },
                            "matchedCount": { "type": "integer" },
                            "modifiedCount": { "type": "integer" },
                            "upsertedId": { "type": ["string", "null"] }
                        }
                    },
                    "DeleteResult": {
                        "type": "object",
                        "properties": {
                            "acknowledged": { "type": "boolean" },
                            "deletedCount": { "type": "integer" }
                        }
                    }
                }
            }
        }))
    }

    fn indexes(&self) -> Vec<IndexSpec> {
        vec![
            IndexSpec {
                name: "addBook_user_email",
                collection: CollectionKind::Books,
                keys: &["user_email"],
                unique: false,
            },
            IndexSpec {
                name: "addBook_upvote",
                collection: CollectionKind::Books,
                keys: &["upvote"],
                unique: false,
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db))
}
