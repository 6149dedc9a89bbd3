use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::{ApplicationConfig, RedirectConfig, SessionConfig},
    database::{self, connect_to_database},
    domain::{
        invitation::{InvitationService, PostgresInvitationService},
        policy::DocumentPolicy,
        role::{PostgresRoleService, RoleService},
        session::{PostgresSessionService, SessionService},
        siteminder::{assertion_extractor, AssertionExtractor},
        user::{PostgresUserService, UserService},
    },
};

use self::{
    authentication::{AuthenticationUseCase, AuthenticationUseCaseImpl},
    document::{DocumentUseCase, DocumentUseCaseImpl},
};

pub(crate) mod authentication;
pub(crate) mod document;

pub(crate) struct Application {
    database_connection: Arc<DatabaseConnection>,
    assertion_extractor: Arc<dyn AssertionExtractor>,
    user_service: Arc<dyn UserService + Sync + Send>,
    role_service: Arc<dyn RoleService + Sync + Send>,
    invitation_service: Arc<dyn InvitationService + Sync + Send>,
    session_service: Arc<dyn SessionService + Sync + Send>,
    document_policy: Arc<DocumentPolicy>,
    redirect: RedirectConfig,
    session: SessionConfig,
}

pub(crate) struct ApplicationServices {
    pub assertion_extractor: Arc<dyn AssertionExtractor>,
    pub user_service: Arc<dyn UserService + Sync + Send>,
    pub role_service: Arc<dyn RoleService + Sync + Send>,
    pub invitation_service: Arc<dyn InvitationService + Sync + Send>,
    pub session_service: Arc<dyn SessionService + Sync + Send>,
    pub document_policy: Arc<DocumentPolicy>,
}

impl Application {
    pub fn new(
        database_connection: Arc<DatabaseConnection>,
        services: ApplicationServices,
        redirect: RedirectConfig,
        session: SessionConfig,
    ) -> Self {
        Self {
            database_connection,
            assertion_extractor: services.assertion_extractor,
            user_service: services.user_service,
            role_service: services.role_service,
            invitation_service: services.invitation_service,
            session_service: services.session_service,
            document_policy: services.document_policy,
            redirect,
            session,
        }
    }

    pub fn authentication(&self) -> impl AuthenticationUseCase {
        AuthenticationUseCaseImpl::new(
            self.database_connection.clone(),
            self.assertion_extractor.clone(),
            self.user_service.clone(),
            self.role_service.clone(),
            self.invitation_service.clone(),
            self.session_service.clone(),
        )
    }

    pub fn document(&self) -> impl DocumentUseCase {
        DocumentUseCaseImpl::new(
            self.database_connection.clone(),
            self.user_service.clone(),
            self.session_service.clone(),
            self.document_policy.clone(),
        )
    }

    pub fn redirect(&self) -> &RedirectConfig {
        &self.redirect
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }
}

pub(super) async fn init(config: &ApplicationConfig) -> anyhow::Result<Application> {
    let database_connection = connect_to_database(&config.database).await?;
    database::migrate(database_connection.as_ref()).await?;

    let services = ApplicationServices {
        assertion_extractor: assertion_extractor(config.siteminder.allow_override),
        user_service: Arc::new(PostgresUserService {}),
        role_service: Arc::new(PostgresRoleService {}),
        invitation_service: Arc::new(PostgresInvitationService {}),
        session_service: Arc::new(PostgresSessionService::new(config.session.max_age)),
        document_policy: Arc::new(DocumentPolicy::new().await?),
    };

    Ok(Application::new(database_connection, services, config.redirect.clone(), config.session.clone()))
}
