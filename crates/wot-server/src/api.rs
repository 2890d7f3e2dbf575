//! API handlers for the web-of-trust server.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wot_attest::{AttestStoreError, ReactionError};
use wot_notify::{NotificationItem, NotificationStore, NotifyError, CATEGORY_NAMESPACE};
use wot_service::{VouchRequest, WotError};
use wot_types::{ExternalError, SigId, User, UserVersion, WotReaction, WotVouch};

use crate::backend::BackendError;
use crate::directory::DirectoryError;
use crate::identify::IdentifyError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Request body for `POST /api/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
}

/// Request body for `POST /api/wot/vouch`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VouchBody {
    /// Username of the vouchee.
    pub vouchee: String,
    #[serde(flatten)]
    pub request: VouchRequest,
}

/// Request body for `POST /api/wot/vouch/assertion`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VouchAssertionBody {
    /// Assertion naming the vouchee; identification runs against it.
    pub assertion: String,
    #[serde(flatten)]
    pub request: VouchRequest,
}

/// Request body for `POST /api/wot/react`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactBody {
    pub voucher: UserVersion,
    pub proof: SigId,
    pub reaction: WotReaction,
}

/// Request body for `POST /api/wot/react/by-name`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactByNameBody {
    /// Username of the voucher.
    pub voucher: String,
    pub reaction: WotReaction,
}

/// Request body for `POST /api/wot/revoke`.
#[derive(Debug, Deserialize)]
pub struct RevokeBody {
    /// Username of the vouchee.
    pub vouchee: String,
}

/// Request body for `POST /api/wot/notifications/dismiss`.
#[derive(Debug, Deserialize)]
pub struct DismissBody {
    pub voucher: String,
    pub vouchee: String,
}

/// Response body for notification dismissal.
#[derive(Debug, Serialize, Deserialize)]
pub struct DismissResponse {
    pub dismissed: usize,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PreconditionFailed(msg) => (StatusCode::PRECONDITION_FAILED, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

fn reaction_error(err: &ReactionError) -> ApiError {
    let msg = err.to_string();
    match err {
        ReactionError::IllegalTransition(_) | ReactionError::NoOp(_) => ApiError::Conflict(msg),
        ReactionError::InvalidState | ReactionError::UnknownState(_) => {
            ApiError::InternalServerError(msg)
        }
    }
}

fn attest_error(err: &AttestStoreError) -> ApiError {
    match err {
        AttestStoreError::Reaction(inner) => reaction_error(inner),
        AttestStoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        AttestStoreError::StaleProof(_) => ApiError::Conflict(err.to_string()),
        _ => ApiError::InternalServerError(err.to_string()),
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        let msg = err.to_string();
        match err {
            DirectoryError::NotFound(_) => ApiError::NotFound(msg),
            DirectoryError::Taken(_) => ApiError::Conflict(msg),
            DirectoryError::InvalidUsername(_) => ApiError::BadRequest(msg),
            _ => ApiError::InternalServerError(msg),
        }
    }
}

/// Classifies a collaborator failure by its concrete type.
fn external_error(err: ExternalError) -> ApiError {
    if let Some(dir) = err.downcast_ref::<DirectoryError>() {
        let msg = dir.to_string();
        return match dir {
            DirectoryError::NotFound(_) => ApiError::NotFound(msg),
            DirectoryError::InvalidUsername(_) => ApiError::BadRequest(msg),
            _ => ApiError::InternalServerError(msg),
        };
    }
    if err.downcast_ref::<IdentifyError>().is_some() {
        return ApiError::BadGateway(err.to_string());
    }
    if let Some(backend) = err.downcast_ref::<BackendError>() {
        return match backend {
            BackendError::Attest(inner) => attest_error(inner),
            _ => ApiError::InternalServerError(err.to_string()),
        };
    }
    if err.downcast_ref::<NotifyError>().is_some() {
        return ApiError::InternalServerError(err.to_string());
    }
    ApiError::InternalServerError(err.to_string())
}

impl From<WotError> for ApiError {
    fn from(err: WotError) -> Self {
        match err {
            WotError::Reaction(inner) => reaction_error(&inner),
            WotError::NotFound(_) => ApiError::NotFound(err.to_string()),
            WotError::TrackingBroke => ApiError::PreconditionFailed(err.to_string()),
            WotError::InvalidArgument(_) => ApiError::BadRequest(err.to_string()),
            WotError::Decode(_) => ApiError::InternalServerError(err.to_string()),
            WotError::External(inner) => external_error(inner),
        }
    }
}

/// Handler for `POST /api/users`.
pub async fn register_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.directory.register(&payload.username).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for `POST /api/wot/vouch`.
pub async fn vouch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<VouchBody>,
) -> Result<Json<WotVouch>, ApiError> {
    let vouchee = state.service.resolve(&payload.vouchee).await?;
    let vouch = state.service.vouch(&me, &vouchee, payload.request).await?;
    Ok(Json(vouch))
}

/// Handler for `POST /api/wot/vouch/assertion`.
pub async fn vouch_assertion_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<VouchAssertionBody>,
) -> Result<Json<WotVouch>, ApiError> {
    let vouch = state
        .service
        .vouch_from_assertion(&me, &payload.assertion, payload.request)
        .await?;
    Ok(Json(vouch))
}

/// Handler for `POST /api/wot/react`.
pub async fn react_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<ReactBody>,
) -> Result<Json<WotVouch>, ApiError> {
    let vouch = state
        .service
        .react(&me, &payload.voucher, &payload.proof, payload.reaction)
        .await?;
    Ok(Json(vouch))
}

/// Handler for `POST /api/wot/react/by-name`.
pub async fn react_by_name_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<ReactByNameBody>,
) -> Result<Json<WotVouch>, ApiError> {
    let vouch = state
        .service
        .react_by_voucher_name(&me, &payload.voucher, payload.reaction)
        .await?;
    Ok(Json(vouch))
}

/// Handler for `POST /api/wot/revoke`.
pub async fn revoke_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<RevokeBody>,
) -> Result<Json<WotVouch>, ApiError> {
    let vouch = state.service.revoke(&me, &payload.vouchee).await?;
    Ok(Json(vouch))
}

/// Handler for `GET /api/wot/mine`.
pub async fn list_mine_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<Json<Vec<WotVouch>>, ApiError> {
    Ok(Json(state.service.list_mine(&me).await?))
}

/// Handler for `GET /api/wot/user/{username}`.
pub async fn list_for_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<WotVouch>>, ApiError> {
    Ok(Json(state.service.list_for(&username).await?))
}

/// Handler for `POST /api/wot/notifications/dismiss`.
pub async fn dismiss_notifications_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(payload): Json<DismissBody>,
) -> Result<Json<DismissResponse>, ApiError> {
    let dismissed = state
        .service
        .dismiss_notifications(&me, &payload.voucher, &payload.vouchee)
        .await?;
    Ok(Json(DismissResponse { dismissed }))
}

/// Handler for `GET /api/wot/notifications`.
pub async fn list_notifications_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<Json<Vec<NotificationItem>>, ApiError> {
    let items = state
        .notifications
        .items_with_category_prefix(&me.uv, CATEGORY_NAMESPACE)
        .await
        .map_err(external_error)?;
    Ok(Json(items))
}
