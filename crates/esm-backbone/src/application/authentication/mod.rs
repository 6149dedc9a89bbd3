use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;
use ulid::Ulid;

use crate::domain::{
    self, identity,
    invitation::InvitationService,
    role::RoleService,
    session::{Session, SessionService},
    siteminder::{AssertionExtractor, RequestMetadata, SiteminderAssertion},
    user::UserService,
};

#[async_trait]
pub(crate) trait AuthenticationUseCase {
    fn parse_assertion(&self, metadata: &RequestMetadata) -> Result<SiteminderAssertion>;
    async fn sign_in(&self, assertion: &SiteminderAssertion, current_session_id: Option<&str>) -> Result<Session>;
    async fn accept_invitation(
        &self,
        invitation_id: &Ulid,
        metadata: &RequestMetadata,
        current_session_id: Option<&str>,
    ) -> Result<Session>;
}

pub(crate) struct AuthenticationUseCaseImpl {
    database_connection: Arc<DatabaseConnection>,
    assertion_extractor: Arc<dyn AssertionExtractor>,
    user_service: Arc<dyn UserService + Sync + Send>,
    role_service: Arc<dyn RoleService + Sync + Send>,
    invitation_service: Arc<dyn InvitationService + Sync + Send>,
    session_service: Arc<dyn SessionService + Sync + Send>,
}

impl AuthenticationUseCaseImpl {
    pub fn new(
        database_connection: Arc<DatabaseConnection>,
        assertion_extractor: Arc<dyn AssertionExtractor>,
        user_service: Arc<dyn UserService + Sync + Send>,
        role_service: Arc<dyn RoleService + Sync + Send>,
        invitation_service: Arc<dyn InvitationService + Sync + Send>,
        session_service: Arc<dyn SessionService + Sync + Send>,
    ) -> Self {
        Self { database_connection, assertion_extractor, user_service, role_service, invitation_service, session_service }
    }
}

#[async_trait]
impl AuthenticationUseCase for AuthenticationUseCaseImpl {
    fn parse_assertion(&self, metadata: &RequestMetadata) -> Result<SiteminderAssertion> {
        Ok(self.assertion_extractor.extract(metadata)?)
    }

    async fn sign_in(&self, assertion: &SiteminderAssertion, current_session_id: Option<&str>) -> Result<Session> {
        let transaction = self.database_connection.begin().await?;

        let user = self.user_service.find_by_user_guid(&transaction, &assertion.user_guid).await?;
        let session =
            identity::bind_session(self.session_service.as_ref(), &transaction, current_session_id, &user).await?;

        transaction.commit().await?;

        info!("user({}) signed in.", user.id);

        Ok(session)
    }

    async fn accept_invitation(
        &self,
        invitation_id: &Ulid,
        metadata: &RequestMetadata,
        current_session_id: Option<&str>,
    ) -> Result<Session> {
        let transaction = self.database_connection.begin().await?;

        let invitation = self.invitation_service.accept(&transaction, invitation_id).await?;
        let assertion = self.parse_assertion(metadata)?;

        let existing = match self.user_service.find_by_user_guid(&transaction, &assertion.user_guid).await {
            Ok(user) => Some(user),
            Err(domain::user::Error::UserNotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let user = identity::reconcile(&assertion, existing, Some(invitation.user))?;
        identity::rebind_roles(self.role_service.as_ref(), &transaction, &assertion, &user).await?;
        let user = identity::synchronize_profile(self.user_service.as_ref(), &transaction, &assertion, user).await?;
        let session =
            identity::bind_session(self.session_service.as_ref(), &transaction, current_session_id, &user).await?;

        transaction.commit().await?;

        info!("invitation({}) accepted, user({}) signed in.", invitation.id, user.id);

        Ok(session)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    MissingIdentity(#[from] domain::siteminder::Error),
    #[error("user not found for user guid({user_guid})")]
    UserNotFound { user_guid: String },
    #[error("no user to sign in")]
    NoUserToSignIn,
    #[error("asserted identity({asserted}) does not match bound identity({bound})")]
    IdentityMismatch { asserted: String, bound: String },
    #[error("siteminder assertion carries no login name")]
    MissingLoginName,
    #[error(transparent)]
    Session(domain::session::Error),
    #[error(transparent)]
    Invitation(domain::invitation::Error),
    #[error(transparent)]
    Persistence(anyhow::Error),
}

impl Error {
    /// Stable identifier of the failure kind, written to logs.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingIdentity(_) => "MISSING_IDENTITY",
            Error::UserNotFound { .. } => "USER_NOT_FOUND",
            Error::NoUserToSignIn => "NO_USER_TO_SIGN_IN",
            Error::IdentityMismatch { .. } => "IDENTITY_MISMATCH",
            Error::MissingLoginName => "MISSING_LOGIN_NAME",
            Error::Session(_) => "SESSION_FAILED",
            Error::Invitation(_) => "INVITATION_REJECTED",
            Error::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Error::Persistence(value.into())
    }
}

impl From<domain::user::Error> for Error {
    fn from(value: domain::user::Error) -> Self {
        match value {
            domain::user::Error::UserNotFound { user_guid } => Error::UserNotFound { user_guid },
            domain::user::Error::Anyhow(e) => Error::Persistence(e),
            e => Error::Persistence(e.into()),
        }
    }
}

impl From<domain::session::Error> for Error {
    fn from(value: domain::session::Error) -> Self {
        Error::Session(value)
    }
}

impl From<domain::invitation::Error> for Error {
    fn from(value: domain::invitation::Error) -> Self {
        match value {
            domain::invitation::Error::Anyhow(e) => Error::Persistence(e),
            e => Error::Invitation(e),
        }
    }
}

impl From<identity::Error> for Error {
    fn from(value: identity::Error) -> Self {
        match value {
            identity::Error::NoUserToSignIn => Error::NoUserToSignIn,
            identity::Error::IdentityMismatch { asserted, bound } => Error::IdentityMismatch { asserted, bound },
            identity::Error::MissingLoginName => Error::MissingLoginName,
            identity::Error::Role(domain::role::Error::Anyhow(e)) => Error::Persistence(e),
            identity::Error::User(e) => e.into(),
            identity::Error::Session(e) => Error::Session(e),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
