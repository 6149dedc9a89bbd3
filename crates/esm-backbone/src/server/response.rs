use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

pub(crate) fn handle_internal_server_error<E: std::error::Error>(e: E) -> impl IntoResponse {
    error!(error = %e, "unhandled error occurred.");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Redirect to the error page, tagged with the identity class the user signed in with when known.
pub(crate) fn error_redirect(error_path: &str, user_type: Option<&str>) -> Response {
    match user_type {
        Some(user_type) => {
            let location = format!("{error_path}?t={}", urlencoding::encode(&user_type.to_lowercase()));
            Redirect::to(&location).into_response()
        }
        None => Redirect::to(error_path).into_response(),
    }
}
