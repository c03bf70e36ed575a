//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};

/// Maps a domain error's status and code to a JSON error response.
pub(crate) fn domain_error(status_code: u16, error_code: &str, message: String) -> Response {
    let status =
        StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    // 5xx details stay in the logs; clients get a generic message.
    let message = if status.is_server_error() {
        "An internal error occurred".to_string()
    } else {
        message
    };
    (
        status,
        Json(json!({ "error": error_code, "message": message })),
    )
        .into_response()
}

pub mod auth;
pub mod content;
pub mod documents;
pub mod financing;
pub mod health;
pub mod kyc;
pub mod notifications;
pub mod payments;
pub mod requests;
pub mod signatures;
pub mod users;
pub mod webhooks;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(kyc::routes())
        .merge(financing::routes())
        .merge(payments::routes())
        .merge(documents::routes())
        .merge(signatures::routes())
        .merge(requests::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(content::routes())
        .merge(webhooks::routes())
        .merge(documents::public_routes())
        .merge(protected_routes)
}
