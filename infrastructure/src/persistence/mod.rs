pub mod in_memory_store;
pub mod object_id;

pub use in_memory_store::{DEFAULT_DATABASE_NAME, InMemoryDocumentStore};
pub use object_id::ObjectIdGenerator;
