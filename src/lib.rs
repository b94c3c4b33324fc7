//! Virtual bookshelf application library
//!
//! Feature modules (books, reviews, special offers, stats), request
//! validation, and the bootstrap sequence shared by the server and CLI binaries.

pub mod bootstrap;
pub mod modules;
pub mod utils;
pub mod validation;

/// Re-export commonly used types
pub use modules::*;
