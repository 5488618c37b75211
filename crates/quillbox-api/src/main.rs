//! quillbox-api - HTTP API server for quillbox notes

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use quillbox_core::{
    decode_array_fields, ArrayField, CreateNoteRequest, ListItem, Note, NoteRepository, Tag,
    UpdateNoteRequest,
};
use quillbox_db::Database;
use quillbox_media::{CloudinaryStorage, MediaStorage};

use config::AppConfig;

/// Cap on request bodies; uploads stream through memory before they reach
/// the provider.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically; useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APP STATE AND OPENAPI
// =============================================================================

/// Application state shared across handlers.
///
/// Handlers keep no state of their own; everything here is a handle to an
/// external collaborator.
#[derive(Clone)]
struct AppState {
    db: Database,
    media: Arc<dyn MediaStorage>,
}

/// OpenAPI documentation, generated from the same typed contracts the
/// handlers deserialize. Swagger UI at `/docs` serves it.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quillbox API",
        description = "Notes with image attachments, checklist items, tags, and substring search"
    ),
    paths(
        search_notes,
        list_all_notes,
        get_note,
        create_note,
        update_note,
        delete_note,
        health_check
    ),
    components(schemas(
        Note,
        ListItem,
        Tag,
        CreateNoteForm,
        UpdateNoteBody,
        SearchMissResponse,
        ErrorBody
    )),
    tags(
        (name = "Notes", description = "Note CRUD and search"),
        (name = "System", description = "Health checks")
    )
)]
struct ApiDoc;

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Error body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
struct ErrorBody {
    error: String,
}

/// Body returned when a search matches nothing; distinguishes "found
/// nothing" from a query error (which is a 500).
#[derive(Debug, Serialize, ToSchema)]
struct SearchMissResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
}

/// JSON body for note creation.
///
/// `list` and `tags` arrive structured or as JSON text; the decode rule is
/// uniform across the pair (see `quillbox_core::fields`).
#[derive(Debug, Deserialize)]
struct CreateNoteBody {
    title: Option<String>,
    content: Option<String>,
    list: Option<ArrayField<ListItem>>,
    tags: Option<ArrayField<Tag>>,
}

/// Multipart form contract for note creation (documentation schema; the
/// handler reads the same parts from the multipart stream).
#[derive(ToSchema)]
#[allow(dead_code)]
struct CreateNoteForm {
    /// Image attachment; jpg, jpeg, png, and pdf are accepted.
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
    title: Option<String>,
    content: Option<String>,
    /// JSON-encoded array of `{"item": ...}` records.
    list: Option<String>,
    /// JSON-encoded array of `{"name": ...}` records.
    tags: Option<String>,
}

/// JSON body for note updates. All four fields are replaced on every
/// update; an absent field overwrites with its empty default. `image` has
/// no update path.
#[derive(Debug, Default, Deserialize, ToSchema)]
struct UpdateNoteBody {
    title: Option<String>,
    content: Option<String>,
    list: Option<Vec<ListItem>>,
    tags: Option<Vec<Tag>>,
}

/// A note submission after transport decoding, before array-field decode.
struct NoteSubmission {
    title: Option<String>,
    content: Option<String>,
    list: Option<ArrayField<ListItem>>,
    tags: Option<ArrayField<Tag>>,
    image: String,
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

fn init_tracing() {
    // LOG_FORMAT  - "json" or "text" (default: "text")
    // RUST_LOG    - standard env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quillbox_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let media: Arc<dyn MediaStorage> = Arc::new(CloudinaryStorage::new(config.media.clone())?);

    let state = AppState { db, media };
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();
    let app = app(state, allowed_origins);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with the full middleware stack.
fn app(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Notes
        .route("/api/notes/search", get(search_notes))
        .route("/api/notes", get(list_all_notes).post(create_note))
        .route(
            "/api/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CatchPanicLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Service is up"))
)]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// NOTE HANDLERS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/notes/search",
    tag = "Notes",
    params(
        ("query" = Option<String>, Query,
         description = "Pattern matched case-insensitively against title, content, image, every list item, and every tag name")
    ),
    responses(
        (status = 200, description = "Matching notes, or a no-match message", body = [Note]),
        (status = 500, description = "Pattern or store failure", body = ErrorBody)
    )
)]
async fn search_notes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    // An absent query is the empty pattern and matches every note.
    // Long-standing behavior, kept as-is.
    let pattern = params.query.unwrap_or_default();
    let notes = state.db.notes.search(&pattern).await?;

    if notes.is_empty() {
        return Ok(Json(SearchMissResponse {
            message: "No Matching Notes Found".to_string(),
        })
        .into_response());
    }
    Ok(Json(notes).into_response())
}

#[utoipa::path(
    get,
    path = "/api/notes",
    tag = "Notes",
    responses(
        (status = 200, description = "Every note, unfiltered and unpaginated", body = [Note]),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
async fn list_all_notes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let notes = state.db.notes.list_all().await?;
    Ok(Json(notes))
}

#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = Note),
        (status = 404, description = "No such note", body = ErrorBody),
        (status = 500, description = "Malformed id or store failure", body = ErrorBody)
    )
)]
async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_note_id(&id)?;
    let note = state.db.notes.fetch(id).await?;
    Ok(Json(note))
}

#[utoipa::path(
    post,
    path = "/api/notes",
    tag = "Notes",
    request_body(content = CreateNoteForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "The created note", body = Note),
        (status = 500, description = "Upload, decode, or store failure", body = ErrorBody)
    )
)]
async fn create_note(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let submission = if is_multipart(req.headers()) {
        read_multipart_submission(&state, req).await?
    } else {
        read_json_submission(req).await?
    };

    let (list, tags) = decode_array_fields(submission.list, submission.tags)?;

    let note = state
        .db
        .notes
        .insert(CreateNoteRequest {
            title: submission.title.unwrap_or_default(),
            content: submission.content.unwrap_or_default(),
            image: submission.image,
            list,
            tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = String, Path, description = "Note id")),
    request_body = UpdateNoteBody,
    responses(
        (status = 200, description = "The updated note", body = Note),
        (status = 404, description = "No such note", body = ErrorBody),
        (status = 500, description = "Malformed id, body, or store failure", body = ErrorBody)
    )
)]
async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_note_id(&id)?;
    let Json(body) = Json::<UpdateNoteBody>::from_request(req, &())
        .await
        .map_err(|e| ApiError::Internal(format!("body decode failed: {}", e)))?;

    let note = state
        .db
        .notes
        .update_fields(
            id,
            UpdateNoteRequest {
                title: body.title.unwrap_or_default(),
                content: body.content.unwrap_or_default(),
                list: body.list.unwrap_or_default(),
                tags: body.tags.unwrap_or_default(),
            },
        )
        .await?;

    Ok(Json(note))
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "No such note", body = ErrorBody),
        (status = 500, description = "Malformed id or store failure", body = ErrorBody)
    )
)]
async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_note_id(&id)?;
    state.db.notes.delete(id).await?;
    // No body on 204; the external media object, if any, is not cleaned up.
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// SUBMISSION READING
// =============================================================================

fn is_multipart(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

/// A malformed id is surfaced on the internal-error path, not as a 400;
/// the same coarse mapping the store's cast failures have always had.
fn parse_note_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Internal(format!("malformed note id {:?}: {}", raw, e)))
}

async fn read_json_submission(req: Request) -> Result<NoteSubmission, ApiError> {
    let Json(body) = Json::<CreateNoteBody>::from_request(req, &())
        .await
        .map_err(|e| ApiError::Internal(format!("body decode failed: {}", e)))?;

    Ok(NoteSubmission {
        title: body.title,
        content: body.content,
        list: body.list,
        tags: body.tags,
        image: String::new(),
    })
}

/// Read the multipart stream, forwarding the image part to the media
/// collaborator as soon as it appears.
///
/// The upload happens before the insert; if persistence fails afterwards the
/// stored object stays orphaned with the provider.
async fn read_multipart_submission(
    state: &AppState,
    req: Request,
) -> Result<NoteSubmission, ApiError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| ApiError::Internal(format!("multipart read failed: {}", e)))?;

    let mut submission = NoteSubmission {
        title: None,
        content: None,
        list: None,
        tags: None,
        image: String::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(format!("multipart read failed: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                // Only file parts count as an upload; a text part named
                // "image" is ignored.
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(format!("multipart read failed: {}", e)))?
                    .to_vec();

                let stored = state.media.upload(&filename, &content_type, data).await?;
                submission.image = stored.url;
            }
            Some("title") => submission.title = Some(field_text(field).await?),
            Some("content") => submission.content = Some(field_text(field).await?),
            Some("list") => submission.list = Some(ArrayField::Text(field_text(field).await?)),
            Some("tags") => submission.tags = Some(ArrayField::Text(field_text(field).await?)),
            _ => {}
        }
    }

    Ok(submission)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Internal(format!("multipart read failed: {}", e)))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// Boundary error for every handler.
///
/// The taxonomy is deliberately coarse: not-found keeps its own status, and
/// every other failure collapses to an opaque 500. Causes go to the log.
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Internal(String),
}

impl From<quillbox_core::Error> for ApiError {
    fn from(err: quillbox_core::Error) -> Self {
        match err {
            quillbox_core::Error::NoteNotFound(id) => {
                tracing::debug!(note_id = %id, "Note not found");
                ApiError::NotFound("Note not found".to_string())
            }
            quillbox_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
