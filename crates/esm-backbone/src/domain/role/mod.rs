use async_trait::async_trait;
use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use sea_orm::{sea_query::Expr, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter};
use tracing::info;

use crate::database::role;

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait RoleService {
    /// Moves every role assignment of `from` onto `to`, returning how many rows moved.
    async fn rename_subject(&self, transaction: &DatabaseTransaction, from: &str, to: &str) -> Result<u64>;
}

pub(crate) struct PostgresRoleService {}

#[async_trait]
impl RoleService for PostgresRoleService {
    async fn rename_subject(&self, transaction: &DatabaseTransaction, from: &str, to: &str) -> Result<u64> {
        let result = role::Entity::update_many()
            .col_expr(role::Column::User, Expr::value(to))
            .col_expr(role::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(role::Column::User.eq(from))
            .exec(transaction)
            .await?;

        info!("role assignments of user({from}) moved to user({to}), {} rows.", result.rows_affected);

        Ok(result.rows_affected)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Error::Anyhow(value.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, TransactionTrait};

    use super::{Error, PostgresRoleService, RoleService};

    #[tokio::test]
    async fn when_renaming_is_successful_then_role_service_returns_rows_affected() {
        let mock_database = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 3 }]);
        let mock_connection = Arc::new(mock_database.into_connection());

        let role_service = PostgresRoleService {};

        let transaction = mock_connection.begin().await.expect("begining transaction should be successful");
        let result = role_service
            .rename_subject(&transaction, "tempuser", "jdoe")
            .await
            .expect("renaming role subject should be successful");
        transaction.commit().await.expect("commiting transaction should be successful");

        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn when_renaming_fails_then_role_service_returns_anyhow_err() {
        let mock_database = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("some error".to_owned())]);
        let mock_connection = Arc::new(mock_database.into_connection());

        let role_service = PostgresRoleService {};

        let transaction = mock_connection.begin().await.expect("begining transaction should be successful");
        let result = role_service.rename_subject(&transaction, "tempuser", "jdoe").await;
        transaction.commit().await.expect("commiting transaction should be successful");

        assert!(matches!(result, Err(Error::Anyhow(_))));
    }
}
