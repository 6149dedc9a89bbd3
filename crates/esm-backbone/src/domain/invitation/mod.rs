use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseTransaction, DbErr, EntityTrait};
use tracing::info;
use ulid::Ulid;

use crate::{
    database::{invitation, organization, user, UlidId},
    domain::user::User,
};

pub(crate) struct AcceptedInvitation {
    pub id: Ulid,
    pub user: User,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait InvitationService {
    /// Validates and consumes a pending invitation, yielding the user it was issued for.
    async fn accept(&self, transaction: &DatabaseTransaction, invitation_id: &Ulid) -> Result<AcceptedInvitation>;
}

pub(crate) struct PostgresInvitationService {}

#[async_trait]
impl InvitationService for PostgresInvitationService {
    async fn accept(&self, transaction: &DatabaseTransaction, invitation_id: &Ulid) -> Result<AcceptedInvitation> {
        let invitation = invitation::Entity::find_by_id(UlidId::from(invitation_id))
            .one(transaction)
            .await?
            .ok_or_else(|| Error::InvitationNotExists { invitation_id: invitation_id.to_owned() })?;

        if invitation.accepted_at.is_some() {
            return Err(Error::AlreadyAccepted { invitation_id: invitation_id.to_owned() });
        }

        let now = Utc::now();
        if invitation.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(Error::Expired { invitation_id: invitation_id.to_owned() });
        }

        let user = user::Entity::find_by_id(invitation.user_id)
            .find_also_related(organization::Entity)
            .one(transaction)
            .await?
            .map(User::from)
            .ok_or_else(|| Error::InvitedUserNotExists { invitation_id: invitation_id.to_owned() })?;

        invitation::ActiveModel {
            id: ActiveValue::Unchanged(invitation.id),
            accepted_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .update(transaction)
        .await?;

        info!("invitation({invitation_id}) accepted for user({}).", user.id);

        Ok(AcceptedInvitation { id: invitation_id.to_owned(), user })
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("invitation({invitation_id}) is not exists")]
    InvitationNotExists { invitation_id: Ulid },
    #[error("invitation({invitation_id}) is already accepted")]
    AlreadyAccepted { invitation_id: Ulid },
    #[error("invitation({invitation_id}) is expired")]
    Expired { invitation_id: Ulid },
    #[error("user of invitation({invitation_id}) is not exists")]
    InvitedUserNotExists { invitation_id: Ulid },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Anyhow(value.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
