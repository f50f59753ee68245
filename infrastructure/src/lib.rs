// Module declarations
pub mod persistence;

// Re-export the store implementation
pub use persistence::{DEFAULT_DATABASE_NAME, InMemoryDocumentStore, ObjectIdGenerator};
