use sea_orm::DatabaseTransaction;
use tracing::{debug, info};

use crate::domain::{
    role::{self, RoleService},
    session::{self, Session, SessionService},
    siteminder::SiteminderAssertion,
    user::{self, User, UserService},
};

/// Role granted to every user once bound to a Siteminder identity.
pub(crate) const BASELINE_ROLE: &str = "user";

/// Picks the authoritative user among the one found by guid and the one carried by an invitation.
pub(crate) fn reconcile(
    assertion: &SiteminderAssertion,
    existing: Option<User>,
    invited: Option<User>,
) -> Result<User> {
    match (existing, invited) {
        (None, None) => Err(Error::NoUserToSignIn),
        (None, Some(invited)) => {
            let conflicting = !invited.user_guid.is_empty()
                && !invited.has_placeholder_guid()
                && !invited.user_guid.eq_ignore_ascii_case(&assertion.user_guid);
            if conflicting {
                return Err(Error::IdentityMismatch {
                    asserted: assertion.user_guid.to_owned(),
                    bound: invited.user_guid,
                });
            }
            Ok(invited)
        }
        (Some(existing), None) => Ok(existing),
        (Some(existing), Some(invited)) => {
            if !existing.user_guid.is_empty() && existing.user_guid.eq_ignore_ascii_case(&invited.user_guid) {
                Ok(existing)
            } else {
                Err(Error::IdentityMismatch { asserted: assertion.user_guid.to_owned(), bound: invited.user_guid })
            }
        }
    }
}

fn asserted_login_name(assertion: &SiteminderAssertion) -> Result<String> {
    assertion.universal_id.as_deref().map(str::to_lowercase).ok_or(Error::MissingLoginName)
}

/// Moves role assignments to the asserted login name when it differs from the user's.
///
/// Must run before the profile is synchronized, while the user still carries the old login name.
/// Bound users keep their login name, so their role assignments stay where they are.
pub(crate) async fn rebind_roles(
    role_service: &(dyn RoleService + Sync + Send),
    transaction: &DatabaseTransaction,
    assertion: &SiteminderAssertion,
    user: &User,
) -> Result<()> {
    if user.is_bound() {
        debug!("user({}) already bound, no role rebinding.", user.id);
        return Ok(());
    }

    let login_name = asserted_login_name(assertion)?;
    if login_name.eq_ignore_ascii_case(&user.username) {
        debug!("login name of user({}) unchanged, no role rebinding.", user.id);
        return Ok(());
    }

    role_service.rename_subject(transaction, &user.username, &login_name).await?;

    Ok(())
}

/// Writes the asserted identity onto a user that has not been bound to Siteminder yet.
pub(crate) async fn synchronize_profile(
    user_service: &(dyn UserService + Sync + Send),
    transaction: &DatabaseTransaction,
    assertion: &SiteminderAssertion,
    mut user: User,
) -> Result<User> {
    if user.is_bound() {
        return Ok(user);
    }

    user.username = asserted_login_name(assertion)?;
    user.user_guid = assertion.user_guid.to_lowercase();
    user.user_type = assertion.user_type.to_owned();
    user.roles.insert(BASELINE_ROLE.to_owned());

    user_service.update_profile(transaction, &user).await?;

    info!("user({}) bound to siteminder identity({}).", user.id, user.user_guid);

    Ok(user)
}

/// Replaces the request's current session, if any, with a new one for `user`.
pub(crate) async fn bind_session(
    session_service: &(dyn SessionService + Sync + Send),
    transaction: &DatabaseTransaction,
    current_session_id: Option<&str>,
    user: &User,
) -> Result<Session> {
    if !user.is_bound() {
        return Err(session::Error::UnboundIdentity { user_id: user.id }.into());
    }

    if let Some(current_session_id) = current_session_id {
        session_service.terminate(transaction, current_session_id).await?;
    }

    Ok(session_service.establish(transaction, user).await?)
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("no user to sign in")]
    NoUserToSignIn,
    #[error("asserted identity({asserted}) does not match bound identity({bound})")]
    IdentityMismatch { asserted: String, bound: String },
    #[error("siteminder assertion carries no login name")]
    MissingLoginName,
    #[error(transparent)]
    Role(#[from] role::Error),
    #[error(transparent)]
    User(#[from] user::Error),
    #[error(transparent)]
    Session(#[from] session::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
