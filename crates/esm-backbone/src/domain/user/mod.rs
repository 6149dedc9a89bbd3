use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, RuntimeErr,
    SqlxError,
};
use ulid::Ulid;

use crate::{
    database::{
        organization,
        user::{self, RoleNames},
        UlidId,
    },
    domain::siteminder::PLACEHOLDER_USER_GUID_PREFIX,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct User {
    pub id: Ulid,
    pub user_guid: String,
    pub user_type: Option<String>,
    pub username: String,
    pub roles: BTreeSet<String>,
    pub organization: Option<Organization>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Organization {
    pub id: Ulid,
    pub name: String,
}

impl User {
    pub fn has_placeholder_guid(&self) -> bool {
        self.user_guid.starts_with(PLACEHOLDER_USER_GUID_PREFIX)
    }

    /// Whether the user carries a guid issued by Siteminder.
    pub fn is_bound(&self) -> bool {
        !self.user_guid.is_empty() && !self.has_placeholder_guid()
    }
}

impl From<(user::Model, Option<organization::Model>)> for User {
    fn from((user, organization): (user::Model, Option<organization::Model>)) -> Self {
        Self {
            id: user.id.inner(),
            user_guid: user.user_guid,
            user_type: user.user_type,
            username: user.username,
            roles: user.roles.0,
            organization: organization.map(|organization| Organization {
                id: organization.id.inner(),
                name: organization.name,
            }),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait UserService {
    async fn find_by_user_guid(&self, transaction: &DatabaseTransaction, user_guid: &str) -> Result<User>;
    async fn find_by_id(&self, transaction: &DatabaseTransaction, user_id: &Ulid) -> Result<User>;
    async fn update_profile(&self, transaction: &DatabaseTransaction, user: &User) -> Result<()>;
}

pub(crate) struct PostgresUserService {}

#[async_trait]
impl UserService for PostgresUserService {
    async fn find_by_user_guid(&self, transaction: &DatabaseTransaction, user_guid: &str) -> Result<User> {
        user::Entity::find()
            .filter(user::Column::UserGuid.eq(user_guid.to_lowercase()))
            .find_also_related(organization::Entity)
            .one(transaction)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::UserNotFound { user_guid: user_guid.to_owned() })
    }

    async fn find_by_id(&self, transaction: &DatabaseTransaction, user_id: &Ulid) -> Result<User> {
        user::Entity::find_by_id(UlidId::from(user_id))
            .find_also_related(organization::Entity)
            .one(transaction)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::UserIdNotFound { user_id: user_id.to_owned() })
    }

    async fn update_profile(&self, transaction: &DatabaseTransaction, user: &User) -> Result<()> {
        user::ActiveModel {
            id: ActiveValue::Unchanged(user.id.into()),
            user_guid: ActiveValue::Set(user.user_guid.to_owned()),
            user_type: ActiveValue::Set(user.user_type.to_owned()),
            username: ActiveValue::Set(user.username.to_owned()),
            roles: ActiveValue::Set(RoleNames(user.roles.to_owned())),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .update(transaction)
        .await
        .map_err(|e| Error::from_update(e, &user.username))?;

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("user not found for user guid({user_guid})")]
    UserNotFound { user_guid: String },
    #[error("user({user_id}) not found")]
    UserIdNotFound { user_id: Ulid },
    #[error("username({username}) is already in use")]
    UsernameInUse { username: String },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    fn from_update(value: DbErr, username: &str) -> Self {
        if let DbErr::Query(RuntimeErr::SqlxError(SqlxError::Database(ref e)))
        | DbErr::Exec(RuntimeErr::SqlxError(SqlxError::Database(ref e))) = value
        {
            if e.code().as_deref() == Some("23505") {
                return Self::UsernameInUse { username: username.to_owned() };
            }
        }
        Self::from(value)
    }
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Anyhow(value.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
