use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use bookshelf_db::{
    models::{CollectionCounts, ReviewerTally},
    Database,
};
use bookshelf_http::error::AppError;
use bookshelf_kernel::Module;
use serde_json::json;

use crate::utils::openapi::{array_of, operation, responses, schema_ref};

/// Reviewers returned by `GET /api/top-reviewers`.
pub const TOP_REVIEWERS_LIMIT: usize = 3;

/// Read-only aggregates over the collections
pub struct StatsModule {
    db: Database,
}

impl StatsModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Module for StatsModule {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/api/stats", get(stats))
            .route("/api/top-reviewers", get(top_reviewers))
            .with_state(self.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/api/stats": {
                    "get": operation("Count books, users and reviews", "Stats", responses("Counts", schema_ref("Stats"), &["500"]))
                },
                "/api/top-reviewers": {
                    "get": operation("Three most active reviewers", "Stats", responses("Reviewers", array_of("ReviewerTally"), &["500"]))
                }
            },
            "components": {
                "schemas": {
                    "Stats": {
                        "type": "object",
                        "properties": {
                            "bookCount": { "type": "integer" },
                            "userCount": { "type": "integer" },
                            "reviewCount": { "type": "integer" }
                        },
                        "required": ["bookCount", "userCount", "reviewCount"]
                    },
                    "ReviewerTally": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string", "description": "Reviewer email" },
                            "totalReviews": { "type": "integer" }
                        },
                        "required": ["_id", "totalReviews"]
                    }
                }
            }
        }))
    }
}

async fn stats(State(db): State<Database>) -> Result<Json<CollectionCounts>, AppError> {
    db.counts()
        .await
        .map(Json)
        .map_err(|err| AppError::internal(err, "Failed to fetch stats"))
}

async fn top_reviewers(State(db): State<Database>) -> Result<Json<Vec<ReviewerTally>>, AppError> {
    db.top_reviewers(TOP_REVIEWERS_LIMIT)
        .await
        .map(Json)
        .map_err(|err| AppError::internal(err, "Failed to fetch top reviewers"))
}

/// Create a new instance of the stats module
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(StatsModule::new(db))
}
