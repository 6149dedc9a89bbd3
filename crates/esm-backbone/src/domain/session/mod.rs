use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{TimeDelta, Utc};
#[cfg(test)]
use mockall::automock;
use rand::{rngs::OsRng, RngCore as _};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseTransaction, DbErr, EntityTrait, ModelTrait};
use tracing::debug;
use ulid::Ulid;

use crate::{database::session, domain::user::User};

const SESSION_ID_BYTES: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Session {
    pub id: String,
    pub user_id: Ulid,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait SessionService {
    async fn establish(&self, transaction: &DatabaseTransaction, user: &User) -> Result<Session>;
    async fn terminate(&self, transaction: &DatabaseTransaction, session_id: &str) -> Result<()>;
    /// User of a live session. Sessions older than the configured max age are deleted and resolve to nothing.
    async fn resolve(&self, transaction: &DatabaseTransaction, session_id: &str) -> Result<Option<Ulid>>;
}

pub(crate) struct PostgresSessionService {
    max_age: TimeDelta,
}

impl PostgresSessionService {
    pub fn new(max_age_seconds: u32) -> Self {
        Self { max_age: TimeDelta::seconds(i64::from(max_age_seconds)) }
    }
}

#[async_trait]
impl SessionService for PostgresSessionService {
    async fn establish(&self, transaction: &DatabaseTransaction, user: &User) -> Result<Session> {
        let session_id = random_session_id();

        session::ActiveModel {
            id: ActiveValue::Set(session_id.to_owned()),
            user_id: ActiveValue::Set(user.id.into()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(transaction)
        .await?;

        Ok(Session { id: session_id, user_id: user.id })
    }

    async fn terminate(&self, transaction: &DatabaseTransaction, session_id: &str) -> Result<()> {
        session::Entity::delete_by_id(session_id.to_owned()).exec(transaction).await?;

        Ok(())
    }

    async fn resolve(&self, transaction: &DatabaseTransaction, session_id: &str) -> Result<Option<Ulid>> {
        let Some(session) = session::Entity::find_by_id(session_id.to_owned()).one(transaction).await? else {
            return Ok(None);
        };

        if session.created_at + self.max_age <= Utc::now() {
            debug!("session of user({}) expired.", session.user_id.inner());
            session.delete(transaction).await?;
            return Ok(None);
        }

        Ok(Some(session.user_id.inner()))
    }
}

fn random_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);

    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("user({user_id}) is not bound to a siteminder identity")]
    UnboundIdentity { user_id: Ulid },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Anyhow(value.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
