use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::directory::DirectoryError;
use crate::AppState;
use wot_types::User;

/// Header naming the acting user.
pub const USERNAME_HEADER: &str = "X-Wot-Username";

/// The acting user, stored in request extensions by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware to authenticate requests via `X-Wot-Username`.
///
/// The header value is resolved through the local directory; unknown names
/// are rejected with `401`. There is no credential check: the username is
/// trusted as given, so the server must sit behind something that
/// authenticates callers.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let username = req
        .headers()
        .get(USERNAME_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .to_string();

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let user = state.directory.lookup(&username).await.map_err(|e| match e {
        DirectoryError::NotFound(_) => StatusCode::UNAUTHORIZED,
        other => {
            tracing::error!(error = %other, "directory lookup failed during auth");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
