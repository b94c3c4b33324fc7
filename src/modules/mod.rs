pub mod books;
pub mod offers;
pub mod reviews;
pub mod stats;

use bookshelf_db::Database;
use bookshelf_kernel::ModuleRegistry;

/// Register all feature modules with the registry, each holding the store handle
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(books::create_module(db.clone()));
    registry.register(reviews::create_module(db.clone()));
    registry.register(offers::create_module(db.clone()));
    registry.register(stats::create_module(db.clone()));
}
