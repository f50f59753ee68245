use crate::AppState;
use application::{ApplicationError, CreateRecordResponse, DocumentFilter, ListQuery, RecordResponse};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json as JsonResponse, Response},
};
use domain::{EntityKind, Record};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

pub const SERVICE_NAME: &str = "Green Future Initiative Backend";
pub const SERVICE_VERSION: &str = "1.0.0";

/// Error body shared by every failing endpoint.
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

fn detail_response(status: StatusCode, detail: String) -> Response {
    (status, JsonResponse(ErrorResponse { detail })).into_response()
}

// --- Service Info Handlers ---

pub async fn root_handler() -> impl IntoResponse {
    JsonResponse(json!({ "message": SERVICE_NAME, "version": SERVICE_VERSION }))
}

pub async fn hello_handler() -> impl IntoResponse {
    JsonResponse(json!({ "message": "Hello from the backend API!" }))
}

pub async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// Handler listing the declared fields of every record kind (GET /schema).
pub async fn schema_handler() -> impl IntoResponse {
    let schemas: Map<String, Value> = EntityKind::ALL
        .into_iter()
        .map(|kind| {
            let fields = kind.schema().field_names().into_iter().map(Value::from).collect();
            (kind.collection_name().to_string(), Value::Array(fields))
        })
        .collect();
    JsonResponse(schemas)
}

/// Handler reporting backend and store status (GET /test).
pub async fn database_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Received request for database status");
    JsonResponse(state.status_service.database_status().await)
}

// --- Record Handlers ---

/// `None` when the request has no content type at all.
fn declares_json(headers: &HeaderMap) -> Option<bool> {
    let content_type = headers.get(header::CONTENT_TYPE)?;
    let Ok(content_type) = content_type.to_str() else {
        return Some(false);
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    Some(mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json")))
}

/// Handler storing one record (POST /api/volunteers, /api/donations, /api/contacts).
/// Bodies that do not match the record's schema never reach the store. A body
/// sent without any content type is still read as JSON.
pub async fn create_record_handler<R: Record + 'static>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let collection = R::KIND.collection_name();
    if declares_json(&headers) == Some(false) {
        warn!(collection = %collection, "Rejected record body with a non-JSON content type");
        return detail_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected request with `Content-Type: application/json`".to_string(),
        );
    }
    let Json(record) = match Json::<R>::from_bytes(&body) {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(collection = %collection, "Rejected invalid record body: {}", rejection.body_text());
            return detail_response(rejection.status(), rejection.body_text());
        }
    };

    info!(collection = %collection, "Received request to create record");
    match state.persistence_service.create_document(&record).await {
        Ok(id) => {
            info!(collection = %collection, doc_id = %id, "Record created successfully via handler");
            (StatusCode::OK, JsonResponse(CreateRecordResponse::success(id))).into_response()
        }
        Err(e) => {
            error!(collection = %collection, "Failed to create record via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler listing records of one kind (GET with optional `limit`).
pub async fn list_records_handler<R: Record + 'static>(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let collection = R::KIND.collection_name();
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!(collection = %collection, "Rejected list query: {}", rejection.body_text());
            return detail_response(rejection.status(), rejection.body_text());
        }
    };

    let limit = query.effective_limit();
    info!(collection = %collection, limit, "Received request to list records");
    match state
        .persistence_service
        .get_documents(R::KIND, &DocumentFilter::all(), limit)
        .await
    {
        Ok(documents) => {
            let records: Vec<RecordResponse> =
                documents.into_iter().map(RecordResponse::from).collect();
            (StatusCode::OK, JsonResponse(records)).into_response()
        }
        Err(e) => {
            error!(collection = %collection, "Failed to list records via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Maps ApplicationError to an HTTP status and a `{"detail": ...}` body.
/// Storage failures surface their raw message with a 500.
pub fn map_application_error_to_response(err: ApplicationError) -> Response {
    let status = match &err {
        ApplicationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ApplicationError::DomainError(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    detail_response(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainError;

    #[test]
    fn storage_errors_map_to_500() {
        let response =
            map_application_error_to_response(ApplicationError::Storage("db down".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_errors_map_to_422() {
        let response = map_application_error_to_response(ApplicationError::DomainError(
            DomainError::Serialization("expected an object".to_string()),
        ));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, value.parse().unwrap());
        headers
    }

    #[test]
    fn content_type_detection() {
        assert_eq!(declares_json(&HeaderMap::new()), None);
        assert_eq!(declares_json(&with_content_type("application/json")), Some(true));
        assert_eq!(
            declares_json(&with_content_type("Application/JSON; charset=utf-8")),
            Some(true)
        );
        assert_eq!(declares_json(&with_content_type("application/ld+json")), Some(true));
        assert_eq!(declares_json(&with_content_type("text/plain")), Some(false));
    }
}
