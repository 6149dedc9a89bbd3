use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::{
    application::{
        document::{self, DocumentUseCase},
        Application,
    },
    server::{response::handle_internal_server_error, session::parse_cookie},
};

pub(crate) fn router(application: Arc<Application>) -> Router {
    Router::new().route("/documents/permissions", get(handle_get_permissions)).with_state(application)
}

impl IntoResponse for document::Error {
    fn into_response(self) -> Response {
        match self {
            document::Error::Anyhow(e) => handle_internal_server_error(&*e).into_response(),
        }
    }
}

#[debug_handler]
async fn handle_get_permissions(
    State(application): State<Arc<Application>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, document::Error> {
    let session_id = parse_cookie(&headers, &application.session_config().cookie_name);

    let permissions = application.document().permissions(session_id.as_deref()).await?;

    Ok(Json(permissions))
}

#[cfg(test)]
mod test {
    use std::{collections::BTreeSet, str::FromStr, sync::Arc};

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;
    use ulid::Ulid;

    use super::router;
    use crate::{
        domain::{self, user::User},
        server::router::fixture::{application, Mocks},
    };

    const USER_ID: &str = "01JACZ44MJDY5GD21X2W910CFV";

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("reading body should be successful");
        serde_json::from_slice(&body).expect("body should be json")
    }

    #[tokio::test]
    async fn when_no_session_cookie_then_guest_permissions_are_returned() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router(application(mock_connection, Mocks::default()).await);

        let response = app
            .oneshot(Request::get("/documents/permissions").body(Body::empty()).unwrap())
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "create": false, "read": false, "update": false, "delete": false })
        );
    }

    #[tokio::test]
    async fn when_session_belongs_to_admin_then_every_permission_is_returned() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mocks = Mocks::default();
        mocks.session_service.expect_resolve().times(1).returning(|_, _| Ok(Some(Ulid::from_str(USER_ID).unwrap())));
        mocks.user_service.expect_find_by_id().times(1).returning(|_, user_id| {
            Ok(User {
                id: user_id.to_owned(),
                user_guid: "abc123".to_owned(),
                user_type: None,
                username: "jdoe".to_owned(),
                roles: BTreeSet::from(["admin".to_owned()]),
                organization: None,
            })
        });

        let app = router(application(mock_connection, mocks).await);

        let response = app
            .oneshot(
                Request::get("/documents/permissions").header("cookie", "esm_session=session").body(Body::empty()).unwrap(),
            )
            .await
            .expect("request should be handled");

        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "create": true, "read": true, "update": true, "delete": true })
        );
    }

    #[tokio::test]
    async fn when_session_lookup_fails_then_internal_server_error_is_returned() {
        let mock_connection = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut mocks = Mocks::default();
        mocks
            .session_service
            .expect_resolve()
            .times(1)
            .returning(|_, _| Err(domain::session::Error::Anyhow(anyhow::anyhow!("some error"))));

        let app = router(application(mock_connection, mocks).await);

        let response = app
            .oneshot(
                Request::get("/documents/permissions").header("cookie", "esm_session=session").body(Body::empty()).unwrap(),
            )
            .await
            .expect("request should be handled");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
