use super::object_id::ObjectIdGenerator;
use application::{ApplicationError, DocumentFilter, DocumentStore};
use async_trait::async_trait;
use dashmap::DashMap;
use domain::{Document, DocumentId, EntityKind};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DATABASE_NAME: &str = "green_future";

// --- Document Store Implementation ---

/// Concurrent in-memory document store. Each collection keeps its documents in
/// insertion order, which is the order queries return them in. Nothing survives
/// a restart.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    database_name: String,
    // Collection Name -> documents, oldest first
    collections: DashMap<&'static str, Vec<Document>>,
    ids: ObjectIdGenerator,
    open: AtomicBool,
    // Inserts hold it shared, `close` exclusively: no insert lands after close returns.
    write_gate: RwLock<()>,
}

impl InMemoryDocumentStore {
    pub fn new(database_name: impl Into<String>) -> Self {
        let database_name = database_name.into();
        info!(database = %database_name, "Opening in-memory document store");
        Self {
            database_name,
            collections: DashMap::new(),
            ids: ObjectIdGenerator::new(),
            open: AtomicBool::new(true),
            write_gate: RwLock::new(()),
        }
    }

    fn ensure_open(&self) -> Result<(), ApplicationError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ApplicationError::Storage(format!(
                "document store '{}' is closed",
                self.database_name
            )))
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_NAME)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn is_persistent(&self) -> bool {
        false
    }

    #[instrument(skip(self, fields))]
    async fn insert(
        &self,
        kind: EntityKind,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, ApplicationError> {
        let _gate = self.write_gate.read().await;
        self.ensure_open()?;
        let id = self.ids.next_id();
        debug!(collection = %kind, doc_id = %id, "Inserting document into in-memory store");

        // Created on first insert
        self.collections
            .entry(kind.collection_name())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    #[instrument(skip(self, filter))]
    async fn find(
        &self,
        kind: EntityKind,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>, ApplicationError> {
        self.ensure_open()?;
        debug!(collection = %kind, "Querying in-memory store");

        let Some(collection) = self.collections.get(kind.collection_name()) else {
            return Ok(Vec::new()); // Nothing inserted yet
        };
        let documents = collection
            .iter()
            .filter(|doc| filter.matches(doc))
            .take(limit)
            .cloned()
            .collect();
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<String>, ApplicationError> {
        self.ensure_open()?;
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    #[instrument(skip(self))]
    async fn close(&self) {
        let _gate = self.write_gate.write().await;
        if self.open.swap(false, Ordering::AcqRel) {
            let documents: usize = self.collections.iter().map(|entry| entry.value().len()).sum();
            info!(database = %self.database_name, documents, "In-memory document store closed");
        } else {
            warn!(database = %self.database_name, "Document store already closed");
        }
    }
}
