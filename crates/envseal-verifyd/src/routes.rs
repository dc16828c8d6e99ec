use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use envseal_crypto::{DigestLedger, MatchResult, check_integrity};

use crate::pages::{self, INDEX_PAGE};

/// Form field carrying the record id.
pub const ID_FIELD: &str = "dataId";
/// Form field carrying the uploaded payload.
pub const FILE_FIELD: &str = "dataFile";

/// Cap on the id field; ids are UUIDs in practice.
const MAX_ID_BYTES: usize = 256;
/// Room for multipart boundaries and headers on top of the upload itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<DigestLedger>,
    pub max_upload_bytes: usize,
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    Router::new()
        .route("/", get(index))
        .route("/checksum", post(checksum))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /`: upload form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// `POST /checksum`: check an uploaded payload against the ledger.
pub async fn checksum(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match read_form(&mut multipart, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e.message(), "Rejected checksum request");
            return e.into_response();
        }
    };
    info!(id = %form.id, "Checking data integrity");

    let result = match form.data {
        None => MatchResult::InputError(format!("no {FILE_FIELD} uploaded")),
        Some(data) => {
            let ledger = Arc::clone(&state.ledger);
            let id = form.id.clone();
            tokio::task::spawn_blocking(move || check_integrity(&ledger, &id, &data))
                .await
                .unwrap_or_else(|e| MatchResult::Unavailable(format!("check task failed: {e}")))
        }
    };
    info!(id = %form.id, %result, "Checksum result");

    (status_for(&result), Html(pages::result_page(&form.id, &result))).into_response()
}

/// HTTP status for a check outcome.
///
/// Match, mismatch and unknown id are all answered normally; only requests
/// that could not be evaluated get an error status.
pub const fn status_for(result: &MatchResult) -> StatusCode {
    match result {
        MatchResult::Success | MatchResult::Mismatch | MatchResult::NotFound => StatusCode::OK,
        MatchResult::InputError(_) => StatusCode::BAD_REQUEST,
        MatchResult::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[derive(Debug, Default)]
struct CheckForm {
    id: String,
    data: Option<Vec<u8>>,
}

/// Why a form could not be read.
#[derive(Debug)]
enum FormError {
    TooLarge { field: &'static str, limit: usize },
    Malformed(String),
    Multipart(MultipartError),
}

impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e)
    }
}

impl FormError {
    fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::TooLarge { field, limit } => {
                format!("{field} exceeds the upload limit of {limit} bytes")
            }
            Self::Malformed(reason) => reason.clone(),
            Self::Multipart(e) => e.body_text(),
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let result = MatchResult::InputError(self.message());
        (self.status(), Html(pages::result_page("", &result))).into_response()
    }
}

async fn read_form(multipart: &mut Multipart, max_upload: usize) -> Result<CheckForm, FormError> {
    let mut form = CheckForm::default();
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            ID_FIELD => {
                let bytes = read_limited(&mut field, ID_FIELD, MAX_ID_BYTES).await?;
                form.id = String::from_utf8(bytes)
                    .map_err(|_| FormError::Malformed(format!("{ID_FIELD} is not UTF-8")))?;
            }
            FILE_FIELD => {
                form.data = Some(read_limited(&mut field, FILE_FIELD, max_upload).await?);
            }
            // Unknown fields are skipped by the next `next_field` call.
            _ => {}
        }
    }
    Ok(form)
}

/// Read a field chunk by chunk, failing as soon as it grows past `limit`.
async fn read_limited(
    field: &mut Field<'_>,
    name: &'static str,
    limit: usize,
) -> Result<Vec<u8>, FormError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(FormError::TooLarge { field: name, limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_statuses() {
        assert_eq!(status_for(&MatchResult::Success), StatusCode::OK);
        assert_eq!(status_for(&MatchResult::Mismatch), StatusCode::OK);
        assert_eq!(status_for(&MatchResult::NotFound), StatusCode::OK);
        assert_eq!(
            status_for(&MatchResult::InputError("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&MatchResult::Unavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn too_large_is_413() {
        let err = FormError::TooLarge {
            field: FILE_FIELD,
            limit: 10,
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.message().contains("10 bytes"));
    }
}
