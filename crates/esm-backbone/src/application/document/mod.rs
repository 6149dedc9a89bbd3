use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;

use crate::domain::{
    self,
    policy::{CrudAction, DocumentPolicy, DOCUMENT_RESOURCE, GUEST_ROLE},
    session::SessionService,
    user::UserService,
};

#[async_trait]
pub(crate) trait DocumentUseCase {
    /// Document actions allowed to the user signed in with `session_id`, or to a guest.
    async fn permissions(&self, session_id: Option<&str>) -> Result<DocumentPermissions>;
}

pub(crate) struct DocumentUseCaseImpl {
    database_connection: Arc<DatabaseConnection>,
    user_service: Arc<dyn UserService + Sync + Send>,
    session_service: Arc<dyn SessionService + Sync + Send>,
    document_policy: Arc<DocumentPolicy>,
}

impl DocumentUseCaseImpl {
    pub fn new(
        database_connection: Arc<DatabaseConnection>,
        user_service: Arc<dyn UserService + Sync + Send>,
        session_service: Arc<dyn SessionService + Sync + Send>,
        document_policy: Arc<DocumentPolicy>,
    ) -> Self {
        Self { database_connection, user_service, session_service, document_policy }
    }
}

#[async_trait]
impl DocumentUseCase for DocumentUseCaseImpl {
    async fn permissions(&self, session_id: Option<&str>) -> Result<DocumentPermissions> {
        let roles = match session_id {
            Some(session_id) => {
                let transaction = self.database_connection.begin().await?;
                let roles = match self.session_service.resolve(&transaction, session_id).await? {
                    Some(user_id) => {
                        self.user_service.find_by_id(&transaction, &user_id).await?.roles.into_iter().collect()
                    }
                    None => vec![GUEST_ROLE.to_owned()],
                };
                transaction.commit().await?;
                roles
            }
            None => vec![GUEST_ROLE.to_owned()],
        };

        let is_allowed = |action| self.document_policy.is_allowed(&roles, DOCUMENT_RESOURCE, action);

        Ok(DocumentPermissions {
            create: is_allowed(CrudAction::Create)?,
            read: is_allowed(CrudAction::Read)?,
            update: is_allowed(CrudAction::Update)?,
            delete: is_allowed(CrudAction::Delete)?,
        })
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub(crate) struct DocumentPermissions {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Error::Anyhow(value.into())
    }
}

impl From<casbin::Error> for Error {
    fn from(value: casbin::Error) -> Self {
        Error::Anyhow(value.into())
    }
}

impl From<domain::session::Error> for Error {
    fn from(value: domain::session::Error) -> Self {
        Error::Anyhow(value.into())
    }
}

impl From<domain::user::Error> for Error {
    fn from(value: domain::user::Error) -> Self {
        Error::Anyhow(value.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
