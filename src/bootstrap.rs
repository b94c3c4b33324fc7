//! Startup and shutdown sequence.

use anyhow::Context;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry with every feature module wired to `db`.
pub fn build_registry(db: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);
    registry
}

/// Construct the configured store and check that it answers.
pub async fn open_database(settings: &Settings) -> anyhow::Result<Database> {
    let db = bookshelf_db::connect(&settings.database)
        .await
        .with_context(|| "failed to construct document store")?;

    if let Err(err) = db.ping().await {
        tracing::warn!(%err, "document store did not answer ping; continuing");
    }

    Ok(db)
}

/// Create the indexes every module declares.
pub async fn ensure_indexes(settings: &Settings, db: &Database) -> anyhow::Result<()> {
    let registry = build_registry(db);
    let ctx = InitCtx { settings, db };
    registry.ensure_indexes(&ctx).await
}

/// Run the HTTP service until a shutdown signal, then stop modules.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db = open_database(&settings).await?;
    let registry = build_registry(&db);
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    if let Err(err) = registry.ensure_indexes(&ctx).await {
        // Review uniqueness still holds through the pre-insert lookup.
        tracing::warn!(error = %format!("{err:#}"), "index creation failed");
    }
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings, &db).await;

    registry.stop_modules().await?;
    tracing::info!("bookshelf-app shut down");
    served
}
