use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use tracing::{error, warn};

use crate::{
    application::{authentication::AuthenticationUseCase, Application},
    domain::{session::Session, siteminder::RequestMetadata},
    server::{
        response::error_redirect,
        session::{parse_cookie, session_cookie},
    },
};

pub(crate) fn router(application: Arc<Application>) -> Router {
    Router::new()
        .route("/authentication/signin", get(handle_sign_in))
        .route("/authentication/signin/:userguid/:usertype/:sm_universalid", get(handle_sign_in))
        .route("/authentication/headers", get(handle_get_headers))
        .with_state(application)
}

#[debug_handler]
async fn handle_sign_in(
    State(application): State<Arc<Application>>,
    path_params: Option<Path<HashMap<String, String>>>,
    Query(query_params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let error_path = &application.redirect().error_path;
    let current_session_id = parse_cookie(&headers, &application.session_config().cookie_name);
    let path_params = path_params.map(|Path(params)| params).unwrap_or_default();
    let metadata = RequestMetadata::new(headers, path_params, query_params);

    let authentication = application.authentication();
    let assertion = match authentication.parse_assertion(&metadata) {
        Ok(assertion) => assertion,
        Err(e) => {
            warn!(error_code = e.code(), error = %e, "sign in rejected.");
            return error_redirect(error_path, None);
        }
    };

    match authentication.sign_in(&assertion, current_session_id.as_deref()).await {
        Ok(session) => signed_in_redirect(&application, &session, error_path),
        Err(e) => {
            warn!(error_code = e.code(), error = %e, "sign in failed.");
            error_redirect(error_path, assertion.user_type.as_deref())
        }
    }
}

/// Redirects to the success page with the session cookie set.
pub(super) fn signed_in_redirect(application: &Application, session: &Session, error_path: &str) -> Response {
    match session_cookie(application.session_config(), &session.id) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to(&application.redirect().success_path)).into_response(),
        Err(e) => {
            error!(error = %e, "session cookie could not be built.");
            Redirect::to(error_path).into_response()
        }
    }
}

#[debug_handler]
async fn handle_get_headers(headers: HeaderMap) -> impl IntoResponse {
    let mut payload: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        payload
            .entry(name.as_str().to_owned())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    Json(payload)
}

#[cfg(test)]
mod test {
    use std::{collections::BTreeSet, str::FromStr, sync::Arc};

    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{LOCATION, SET_COOKIE},
            Request, StatusCode,
        },
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;
    use ulid::Ulid;

    use super::router;
    use crate::{
        domain::{
            self,
            session::Session,
            user::{MockUserService, User},
        },
        server::router::fixture::{application, Mocks},
    };

    const USER_ID: &str = "01JACZ44MJDY5GD21X2W910CFV";

    fn bound_user() -> User {
        User {
            id: Ulid::from_str(USER_ID).unwrap(),
            user_guid: "abc123".to_owned(),
            user_type: Some("BCEID".to_owned()),
            username: "jdoe".to_owned(),
            roles: BTreeSet::from(["user".to_owned()]),
            organization: None,
        }
    }

    #[tokio::test]
    async fn when_user_guid_header_is_missing_then_sign_in_redirects_to_error_page_without_touching_database() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mock_user_service = MockUserService::new();
        mock_user_service.expect_find_by_user_guid().times(0);

        let mocks = Mocks { user_service: mock_user_service, ..Default::default() };
        let app = router(application(mock_connection.clone(), mocks).await);

        let response = app
            .oneshot(Request::get("/authentication/signin").body(Body::empty()).unwrap())
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/smerr");
        assert!(response.headers().get(SET_COOKIE).is_none());

        let mock_connection = Arc::try_unwrap(mock_connection).map_err(|_| ()).expect("connection should be unique");
        assert!(mock_connection.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn when_user_is_not_found_then_sign_in_redirects_to_error_page_with_user_type() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mock_user_service = MockUserService::new();
        mock_user_service.expect_find_by_user_guid().times(1).returning(|_, user_guid| {
            Err(domain::user::Error::UserNotFound { user_guid: user_guid.to_owned() })
        });

        let mocks = Mocks { user_service: mock_user_service, ..Default::default() };
        let app = router(application(mock_connection, mocks).await);

        let response = app
            .oneshot(
                Request::get("/authentication/signin")
                    .header("smgov_userguid", "ABC123")
                    .header("smgov_usertype", "BCEID")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/smerr?t=bceid");
    }

    #[tokio::test]
    async fn when_user_exists_then_sign_in_sets_session_cookie_and_redirects_to_dashboard() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mocks = Mocks::default();
        mocks.user_service.expect_find_by_user_guid().times(1).returning(|_, _| Ok(bound_user()));
        mocks
            .session_service
            .expect_terminate()
            .withf(|_, session_id| session_id == "old-session")
            .times(1)
            .returning(|_, _| Ok(()));
        mocks
            .session_service
            .expect_establish()
            .times(1)
            .returning(|_, user| Ok(Session { id: "new-session".to_owned(), user_id: user.id }));

        let app = router(application(mock_connection, mocks).await);

        let response = app
            .oneshot(
                Request::get("/authentication/signin")
                    .header("smgov_userguid", "ABC123")
                    .header("cookie", "esm_session=old-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard");
        assert_eq!(
            response.headers()[SET_COOKIE],
            "esm_session=new-session; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600; Secure"
        );
    }

    #[tokio::test]
    async fn when_override_is_disabled_then_identity_in_path_is_ignored() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mock_user_service = MockUserService::new();
        mock_user_service.expect_find_by_user_guid().times(0);

        let mocks = Mocks { user_service: mock_user_service, ..Default::default() };
        let app = router(application(mock_connection, mocks).await);

        let response = app
            .oneshot(Request::get("/authentication/signin/ABC123/IDIR/jdoe").body(Body::empty()).unwrap())
            .await
            .expect("request should be handled");

        assert_eq!(response.headers()[LOCATION], "/smerr");
    }

    #[tokio::test]
    async fn when_requesting_headers_then_inbound_headers_are_echoed_as_json() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router(application(mock_connection, Mocks::default()).await);

        let response = app
            .oneshot(
                Request::get("/authentication/headers")
                    .header("smgov_userguid", "ABC123")
                    .header("x-forwarded-for", "10.0.0.1")
                    .header("x-forwarded-for", "10.0.0.2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("reading body should be successful");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(payload["smgov_userguid"], "ABC123");
        assert_eq!(payload["x-forwarded-for"], "10.0.0.1, 10.0.0.2");
    }
}
