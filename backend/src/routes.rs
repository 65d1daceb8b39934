use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::session::{SessionStore, SessionStoreError};
use crate::upload::{read_analysis_form, UploadError, UploadedImage};
use shared::{AnalysisMode, ResultBundle, SessionError};

pub const SESSION_HEADER: &str = "X-Session-Id";

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    #[error("Invalid X-Session-Id header: {0}")]
    InvalidSessionId(String),
    #[error("Analysis run aborted: {0}")]
    RunAborted(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upload(_) | ApiError::InvalidSessionId(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(SessionStoreError::UnknownSession(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionStoreError::Session(SessionError::AnalysisInProgress)) => {
                StatusCode::CONFLICT
            }
            ApiError::Session(SessionStoreError::Session(SessionError::NoFile)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RunAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/analyze").route(web::post().to(analyze)))
        .service(web::resource("/api/sessions").route(web::post().to(create_session)))
        .service(
            web::resource("/api/sessions/{session_id}")
                .route(web::get().to(get_session))
                .route(web::delete().to(delete_session)),
        )
        .service(web::resource("/api/health").route(web::get().to(health)));
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    configure_api(cfg);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

fn session_id(req: &HttpRequest) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = req.headers().get(SESSION_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::InvalidSessionId("non-ASCII value".into()))?;
    Uuid::parse_str(raw.trim())
        .map(Some)
        .map_err(|_| ApiError::InvalidSessionId(raw.to_string()))
}

async fn analyze(
    req: HttpRequest,
    payload: Multipart,
    dispatcher: web::Data<Dispatcher>,
    sessions: web::Data<SessionStore>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let session = session_id(&req)?;
    let (mode, image) = read_analysis_form(payload, config.max_upload_bytes).await?;

    let bundle = match session {
        Some(id) => run_in_session(id, mode, image, dispatcher, sessions).await?,
        None => dispatcher.run(mode, &image).await,
    };

    Ok(HttpResponse::Ok().json(bundle))
}

/// Runs the dispatch on its own task so the session is settled even when the client
/// goes away and this handler is dropped.
async fn run_in_session(
    id: Uuid,
    mode: AnalysisMode,
    image: UploadedImage,
    dispatcher: web::Data<Dispatcher>,
    sessions: web::Data<SessionStore>,
) -> Result<ResultBundle, ApiError> {
    sessions.select_and_begin(id, &image.file_name).await?;

    let store = sessions.clone();
    let run = actix_web::rt::spawn(async move {
        let bundle = dispatcher.run(mode, &image).await;
        match store.complete(id, bundle.clone()).await {
            Ok(true) => info!("Session {} updated with run {}", id, bundle.run_id),
            Ok(false) => {}
            Err(e) => warn!("Could not record run {} in session {}: {}", bundle.run_id, id, e),
        }
        bundle
    });

    match run.await {
        Ok(bundle) => Ok(bundle),
        Err(e) => {
            error!("Analysis run for session {} aborted: {}", id, e);
            if let Err(e) = sessions.fail(id).await {
                warn!("Could not release session {}: {}", id, e);
            }
            Err(ApiError::RunAborted(e.to_string()))
        }
    }
}

async fn create_session(sessions: web::Data<SessionStore>) -> HttpResponse {
    let session_id = sessions.create().await;
    HttpResponse::Created().json(json!({ "session_id": session_id }))
}

async fn get_session(
    sessions: web::Data<SessionStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_path_id(&path.into_inner())?;
    let snapshot = sessions.snapshot(id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn delete_session(
    sessions: web::Data<SessionStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_path_id(&path.into_inner())?;
    if sessions.remove(id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(SessionStoreError::UnknownSession(id).into())
    }
}

fn parse_path_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidSessionId(raw.to_string()))
}

async fn health(config: web::Data<AppConfig>) -> HttpResponse {
    match config.endpoints() {
        Ok(endpoints) => {
            let detectors: Vec<_> = endpoints
                .iter()
                .map(|e| json!({ "kind": e.kind, "url": e.url.as_str() }))
                .collect();
            HttpResponse::Ok().json(json!({
                "status": "ok",
                "timeout_secs": config.detectors.timeout_secs,
                "detectors": detectors,
            }))
        }
        Err(e) => {
            error!("Health check found invalid configuration: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}
