use anyhow::Context;
use std::sync::Arc;

use bookshelf_db::IndexSpec;

use crate::module::{InitCtx, Module};

/// Module registry for managing module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Create every index declared by the registered modules
    pub async fn ensure_indexes(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let indexes = self.collect_indexes();
        tracing::info!("ensuring {} indexes", indexes.len());

        ctx.db
            .ensure_indexes(&indexes)
            .await
            .with_context(|| "failed to ensure module indexes")
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all indexes from all modules, ordered by collection then name
    pub fn collect_indexes(&self) -> Vec<IndexSpec> {
        let mut indexes: Vec<IndexSpec> = self
            .modules
            .iter()
            .flat_map(|module| module.indexes())
            .collect();

        indexes.sort_by(|a, b| {
            a.collection
                .as_str()
                .cmp(b.collection.as_str())
                .then_with(|| a.name.cmp(b.name))
        });

        indexes
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use bookshelf_db::{CollectionKind, Database, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestModule {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn indexes(&self) -> Vec<IndexSpec> {
            vec![IndexSpec {
                name: "test_by_key",
                collection: CollectionKind::Users,
                keys: &["key"],
                unique: false,
            }]
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_indexes().is_empty());
    }

    #[test]
    fn test_get_module_by_name() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule {
            name: "books",
            calls: Arc::default(),
        }));

        assert!(registry.get_module("books").is_some());
        assert!(registry.get_module("reviews").is_none());
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let db: Database = Arc::new(MemoryStore::new());
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        let calls = Arc::new(AtomicUsize::new(0));

        registry.register(Arc::new(TestModule {
            name: "test",
            calls: calls.clone(),
        }));

        registry.init_modules(&ctx).await.unwrap();
        registry.ensure_indexes(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.collect_indexes().len(), 1);
    }
}
