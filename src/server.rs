//! HTTP API.
//!
//! Exposes the importers, the chapter reader, the verification toggle, and
//! the language overview as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`   | `/health` | Health check (returns version) |
//! | `POST`  | `/import-bible` | Import a USFM directory |
//! | `POST`  | `/import-html-bible` | Import a per-chapter HTML directory |
//! | `GET`   | `/verses/{language}/{book}/{chapter}` | Read one chapter |
//! | `PATCH` | `/verses/{language}/{book}/{chapter}/{verse}/verify` | Set or clear `human_verified` |
//! | `GET`   | `/languages` | Summaries for all languages |
//! | `GET`   | `/languages/{code}` | One language document |
//! | `POST`  | `/new-language` | Register a language with zeroed progress |
//! | `GET`   | `/bible-books/{language}` | All books with structure and progress |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "directory not found: /data/usfm" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `storage` (500),
//! `internal` (500). An import that ran but wrote nothing is not an error:
//! it returns 200 with `success: false` and `status: "failed"`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use lectio_core::models::{
    normalize_language_code, ImportResult, LanguageDocument, LanguageSummary, TranslationType,
};

use crate::config::Config;
use crate::error::{ImportError, LookupError};
use crate::import::Importer;
use crate::languages::{self, BookProgress, NewLanguage};
use crate::read::{ChapterView, Reader, VerificationUpdate};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    importer: Importer,
}

impl AppState {
    pub fn new(config: Arc<Config>, importer: Importer) -> Self {
        Self { config, importer }
    }

    fn reader(&self) -> Reader<'_> {
        Reader::from_importer(&self.importer, &self.config.import.base_language)
    }

    fn translation_type(&self, requested: Option<TranslationType>) -> TranslationType {
        requested.unwrap_or(self.config.import.default_translation_type)
    }
}

/// Builds the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/import-bible", post(handle_import_usfm))
        .route("/import-html-bible", post(handle_import_html))
        .route("/verses/{language}/{book}/{chapter}", get(handle_read_chapter))
        .route(
            "/verses/{language}/{book}/{chapter}/{verse}/verify",
            patch(handle_verify),
        )
        .route("/languages", get(handle_languages))
        .route("/languages/{code}", get(handle_language))
        .route("/new-language", post(handle_new_language))
        .route("/bible-books/{language}", get(handle_bible_books))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let importer = Importer::open(config).await?;
    let app = router(AppState::new(Arc::new(config.clone()), importer));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "server listening");
    println!("lectio server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match &e {
            _ if e.is_input_error() => {
                AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string())
            }
            ImportError::Reconcile(_) => {
                error!("import failed: {}", e);
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
            }
            _ => {
                error!("import failed: {}", e);
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        }
    }
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::UnknownBook(_)
            | LookupError::OutOfRange(_)
            | LookupError::InvalidLanguage(_) => {
                AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string())
            }
            LookupError::NotFound(message) => {
                AppError::new(StatusCode::NOT_FOUND, "not_found", message)
            }
            LookupError::Storage(cause) => {
                error!("storage error: {:#}", cause);
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage",
                    format!("{:#}", cause),
                )
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /import-bible, /import-html-bible ============

#[derive(Deserialize)]
struct ImportUsfmRequest {
    language_code: String,
    #[serde(default)]
    language_name: String,
    usfm_directory: PathBuf,
    translation_type: Option<TranslationType>,
}

#[derive(Deserialize)]
struct ImportHtmlRequest {
    language_code: String,
    #[serde(default)]
    language_name: String,
    html_directory: PathBuf,
    translation_type: Option<TranslationType>,
}

fn require_language_code(code: &str) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "language_code must not be empty",
        ));
    }
    Ok(())
}

async fn handle_import_usfm(
    State(state): State<AppState>,
    Json(req): Json<ImportUsfmRequest>,
) -> Result<Json<ImportResult>, AppError> {
    require_language_code(&req.language_code)?;
    let result = state
        .importer
        .import_usfm(
            &req.usfm_directory,
            &req.language_code,
            &req.language_name,
            req.translation_type,
        )
        .await?;
    Ok(Json(result))
}

async fn handle_import_html(
    State(state): State<AppState>,
    Json(req): Json<ImportHtmlRequest>,
) -> Result<Json<ImportResult>, AppError> {
    require_language_code(&req.language_code)?;
    let result = state
        .importer
        .import_html(
            &req.html_directory,
            &req.language_code,
            &req.language_name,
            req.translation_type,
        )
        .await?;
    Ok(Json(result))
}

// ============ /verses ============

#[derive(Deserialize)]
struct TranslationTypeQuery {
    translation_type: Option<TranslationType>,
}

async fn handle_read_chapter(
    State(state): State<AppState>,
    Path((language, book, chapter)): Path<(String, String, u32)>,
    Query(query): Query<TranslationTypeQuery>,
) -> Result<Json<ChapterView>, AppError> {
    let tt = state.translation_type(query.translation_type);
    let view = state
        .reader()
        .read_chapter(&language, &book, chapter, tt)
        .await?;
    Ok(Json(view))
}

#[derive(Deserialize)]
struct VerifyRequest {
    human_verified: bool,
    translation_type: Option<TranslationType>,
}

async fn handle_verify(
    State(state): State<AppState>,
    Path((language, book, chapter, verse)): Path<(String, String, u32, u32)>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerificationUpdate>, AppError> {
    let tt = state.translation_type(req.translation_type);
    let update = state
        .reader()
        .set_verification(&language, &book, chapter, verse, tt, req.human_verified)
        .await?;
    Ok(Json(update))
}

// ============ /languages ============

async fn handle_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<LanguageSummary>>, AppError> {
    Ok(Json(languages::list_languages(state.importer.store()).await?))
}

async fn handle_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LanguageDocument>, AppError> {
    Ok(Json(
        languages::language_detail(state.importer.store(), &code).await?,
    ))
}

// ============ POST /new-language ============

#[derive(Deserialize)]
struct NewLanguageRequest {
    language: String,
}

/// `201 Created` for a new language, `200` when it already existed.
async fn handle_new_language(
    State(state): State<AppState>,
    Json(req): Json<NewLanguageRequest>,
) -> Result<(StatusCode, Json<NewLanguage>), AppError> {
    let result =
        languages::create_language(state.importer.store(), &state.config.import, &req.language)
            .await?;
    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

// ============ GET /bible-books/{language} ============

#[derive(Serialize)]
struct BibleBooksResponse {
    language: String,
    translation_type: TranslationType,
    count: usize,
    books: Vec<BookProgress>,
}

async fn handle_bible_books(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Query(query): Query<TranslationTypeQuery>,
) -> Result<Json<BibleBooksResponse>, AppError> {
    let tt = state.translation_type(query.translation_type);
    let books = languages::bible_books(
        state.importer.canon(),
        state.importer.store(),
        &language,
        tt,
    )
    .await?;
    Ok(Json(BibleBooksResponse {
        language: normalize_language_code(&language),
        translation_type: tt,
        count: books.len(),
        books,
    }))
}
