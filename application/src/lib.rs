use async_trait::async_trait;
use domain::{Document, DocumentId, DomainError, EntityKind, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value}; // For flattened record fields
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// The store was unreachable or rejected the operation. Displays the raw message.
    #[error("{0}")]
    Storage(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Filters ---

/// Field-equality filter for document queries. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter(Map<String, Value>);

impl DocumentFilter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition on `field`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| document.get_field_value(field) == Some(expected))
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for the document store backing every collection.
///
/// One handle is created at startup and shared by all requests; implementations
/// must be safe for concurrent use.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Logical name of the database this store serves.
    fn database_name(&self) -> &str;
    /// Whether stored documents outlive the process.
    fn is_persistent(&self) -> bool;
    /// Inserts a new document into the kind's collection and returns its generated id.
    async fn insert(
        &self,
        kind: EntityKind,
        fields: Map<String, Value>,
    ) -> Result<DocumentId, ApplicationError>;
    /// Returns up to `limit` documents matching `filter`, in store order.
    async fn find(
        &self,
        kind: EntityKind,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>, ApplicationError>;
    /// Names of the collections that currently hold documents.
    async fn list_collections(&self) -> Result<Vec<String>, ApplicationError>;
    /// Whether the store still accepts operations.
    fn is_open(&self) -> bool;
    /// Releases the store. Every later operation fails with a storage error.
    async fn close(&self);
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// Number of records a list request returns when no usable limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Query parameters of the list endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Absent or negative limits fall back to the default and `0` means nothing.
    /// Larger values are passed through uncapped.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit >= 0 => usize::try_from(limit).unwrap_or(usize::MAX),
            _ => DEFAULT_LIST_LIMIT,
        }
    }
}

/// Body returned after a record was stored.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreateRecordResponse {
    pub status: &'static str,
    pub id: String,
}

impl CreateRecordResponse {
    pub fn success(id: DocumentId) -> Self {
        Self {
            status: "success",
            id: id.into(),
        }
    }
}

/// Public shape of a stored record: its fields plus the store id as `id`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecordResponse {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl From<Document> for RecordResponse {
    fn from(document: Document) -> Self {
        let (id, fields) = document.into_parts();
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Response of the `/test` endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DatabaseStatusResponse {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

// --- Application Services (Use Cases) ---

/// Generic create/read access to every record collection.
pub struct PersistenceService {
    store: Arc<dyn DocumentStore>,
}

impl PersistenceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stores `record` in its kind's collection and returns the new id.
    #[instrument(skip(self, record))]
    pub async fn create_document<R: Record>(
        &self,
        record: &R,
    ) -> Result<DocumentId, ApplicationError> {
        let collection = R::KIND.collection_name();
        debug!(collection = %collection, "Attempting to create document");

        let fields = record.to_fields()?;
        let id = self.store.insert(R::KIND, fields).await.map_err(|e| {
            error!(collection = %collection, "Failed to insert document: {}", e);
            e
        })?;
        info!(collection = %collection, doc_id = %id, "Document created");
        Ok(id)
    }

    /// Returns at most `limit` documents of `kind` matching `filter`. The
    /// documents keep the store's internal id; callers map them for output.
    #[instrument(skip(self, filter))]
    pub async fn get_documents(
        &self,
        kind: EntityKind,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>, ApplicationError> {
        let collection = kind.collection_name();
        if limit == 0 {
            debug!(collection = %collection, "Zero limit requested; skipping store query");
            return Ok(Vec::new());
        }

        let documents = self.store.find(kind, filter, limit).await.map_err(|e| {
            error!(collection = %collection, "Failed to query documents: {}", e);
            e
        })?;
        info!(collection = %collection, count = documents.len(), limit, "Documents retrieved");
        Ok(documents)
    }

    /// Closes the underlying store. Called once when the server shuts down.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.store.is_open() {
            self.store.close().await;
            info!(database = %self.store.database_name(), "Document store closed");
        } else {
            warn!("Shutdown requested but the document store was already closed");
        }
    }
}

/// Longest store error text echoed back by the status report.
const STATUS_ERROR_MAX_CHARS: usize = 80;

/// Reports whether the backend can reach its document store.
pub struct StatusService {
    store: Arc<dyn DocumentStore>,
    database_url_configured: bool,
}

impl StatusService {
    pub fn new(store: Arc<dyn DocumentStore>, database_url_configured: bool) -> Self {
        Self {
            store,
            database_url_configured,
        }
    }

    /// Never fails: store problems are described inside the report.
    #[instrument(skip(self))]
    pub async fn database_status(&self) -> DatabaseStatusResponse {
        let mut response = DatabaseStatusResponse {
            backend: "✅ Running".to_string(),
            database: "❌ Not Available".to_string(),
            database_url: None,
            database_name: None,
            connection_status: "Not Connected".to_string(),
            collections: Vec::new(),
        };

        if !self.store.is_open() {
            warn!("Status requested while the document store is closed");
            return response;
        }

        let persistent = self.store.is_persistent();
        response.database = "✅ Available".to_string();
        response.database_url = Some(
            match (self.database_url_configured, persistent) {
                (true, true) => "✅ Set",
                (true, false) => "⚠️  Set but ignored (in-memory store)",
                (false, _) => "❌ Not Set",
            }
            .to_string(),
        );
        response.database_name = Some(self.store.database_name().to_string());
        response.connection_status = if persistent { "Connected" } else { "In-Memory" }.to_string();

        match self.store.list_collections().await {
            Ok(mut collections) => {
                collections.truncate(10);
                response.collections = collections;
                response.database = if persistent {
                    "✅ Connected & Working"
                } else {
                    "✅ In-Memory Store Working (not persisted)"
                }
                .to_string();
            }
            Err(e) => {
                warn!("Store reachable but listing collections failed: {}", e);
                response.database = format!(
                    "⚠️  Connected but Error: {}",
                    truncate_chars(&e.to_string(), STATUS_ERROR_MAX_CHARS)
                );
            }
        }
        response
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
