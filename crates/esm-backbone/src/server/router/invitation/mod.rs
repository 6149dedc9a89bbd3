use std::{collections::HashMap, sync::Arc};

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::warn;
use ulid::Ulid;

use crate::{
    application::{authentication::AuthenticationUseCase, Application},
    domain::siteminder::RequestMetadata,
    server::{router::authentication::signed_in_redirect, session::parse_cookie},
};

pub(crate) fn router(application: Arc<Application>) -> Router {
    Router::new().route("/invitations/:invitation_id/accept", get(handle_accept_invitation)).with_state(application)
}

#[debug_handler]
async fn handle_accept_invitation(
    State(application): State<Arc<Application>>,
    Path(invitation_id): Path<String>,
    Query(query_params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let error_path = &application.redirect().invitation_error_path;

    let Ok(invitation_id) = Ulid::from_string(&invitation_id) else {
        warn!(error_code = "INVITATION_REJECTED", "invitation id({invitation_id}) is malformed.");
        return Redirect::to(error_path).into_response();
    };

    let current_session_id = parse_cookie(&headers, &application.session_config().cookie_name);
    let metadata = RequestMetadata::new(headers, Default::default(), query_params);

    let authentication = application.authentication();
    match authentication.accept_invitation(&invitation_id, &metadata, current_session_id.as_deref()).await {
        Ok(session) => signed_in_redirect(&application, &session, error_path),
        Err(e) => {
            warn!(error_code = e.code(), error = %e, "invitation({invitation_id}) could not be accepted.");
            Redirect::to(error_path).into_response()
        }
    }
}
