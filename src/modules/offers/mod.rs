use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use bookshelf_db::{
    models::{InsertOutcome, OfferFields, SpecialOffer},
    Database,
};
use bookshelf_http::{error::AppError, extract::ApiJson};
use bookshelf_kernel::Module;
use serde_json::json;

use crate::utils::openapi::{array_of, operation, responses, schema_ref};
use crate::validation::validated;

/// Offers shown by `GET /special-offer`.
pub const OFFER_LIMIT: usize = 8;

/// Promotional content for the storefront
pub struct OffersModule {
    db: Database,
}

impl OffersModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Module for OffersModule {
    fn name(&self) -> &'static str {
        "offers"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/add-special-offer", post(create_offer))
            .route("/special-offer", get(list_offers))
            .with_state(self.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let mut create = operation(
            "Add a special offer",
            "Offers",
            responses("Insert result", schema_ref("InsertResult"), &["400", "500"]),
        );
        create["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": { "type": "object" } } }
        });

        Some(json!({
            "paths": {
                "/add-special-offer": { "post": create },
                "/special-offer": {
                    "get": operation("List special offers (at most 8)", "Offers", responses("Offers", array_of("SpecialOffer"), &["500"]))
                }
            },
            "components": {
                "schemas": {
                    "SpecialOffer": {
                        "type": "object",
                        "description": "Free-form promotional fields",
                        "properties": { "_id": { "type": "string" } },
                        "required": ["_id"]
                    }
                }
            }
        }))
    }
}

async fn create_offer(
    State(db): State<Database>,
    ApiJson(fields): ApiJson<OfferFields>,
) -> Result<Json<InsertOutcome>, AppError> {
    let fields = validated(fields, "Invalid special offer")?;
    Ok(Json(db.insert_offer(fields).await?))
}

async fn list_offers(State(db): State<Database>) -> Result<Json<Vec<SpecialOffer>>, AppError> {
    Ok(Json(db.list_offers(OFFER_LIMIT).await?))
}

/// Create a new instance of the offers module
pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(OffersModule::new(db))
}
