use std::{borrow::Borrow, fmt::Display, ops::Deref, sync::Arc};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, TryFromU64, TryGetError};
use ulid::Ulid;
use url::Url;

use crate::config::DatabaseConfig;

pub(crate) use migration::migrate;

pub(crate) mod invitation;
mod migration;
pub(crate) mod organization;
pub(crate) mod role;
pub(crate) mod session;
pub(crate) mod user;

pub async fn connect_to_database(config: &DatabaseConfig) -> anyhow::Result<Arc<DatabaseConnection>> {
    let mut conn_str = Url::parse(&format!(
        "postgres://{host}:{port}/{database_name}?sslmode=Prefer",
        host = config.host,
        port = config.port,
        database_name = config.database_name
    ))?;
    conn_str.set_username(&config.username).map_err(|_| anyhow::anyhow!("invalid database username"))?;
    conn_str.set_password(config.password.as_deref()).map_err(|_| anyhow::anyhow!("invalid database password"))?;

    let mut options = ConnectOptions::new(conn_str);
    options.sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Ok(Arc::new(Database::connect(options).await?))
}

#[derive(Clone, Debug, PartialEq, Eq, Copy)]
pub struct UlidId(Ulid);

impl UlidId {
    pub fn new(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn inner(self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for UlidId {
    fn from(value: Ulid) -> Self {
        Self::new(value)
    }
}

impl From<&Ulid> for UlidId {
    fn from(value: &Ulid) -> Self {
        Self::new(value.to_owned())
    }
}

impl AsRef<Ulid> for UlidId {
    fn as_ref(&self) -> &Ulid {
        &self.0
    }
}

impl Borrow<Ulid> for UlidId {
    fn borrow(&self) -> &Ulid {
        self.as_ref()
    }
}

impl Display for UlidId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UlidId {
    type Target = Ulid;

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl From<UlidId> for sea_orm::Value {
    fn from(value: UlidId) -> Self {
        Self::String(Some(Box::new(value.to_string())))
    }
}

// user.org_id is nullable
impl sea_orm::sea_query::Nullable for UlidId {
    fn null() -> sea_orm::Value {
        sea_orm::Value::String(None)
    }
}

impl sea_orm::TryGetable for UlidId {
    fn try_get_by<I: sea_orm::ColIdx>(
        res: &sea_orm::prelude::QueryResult,
        index: I,
    ) -> Result<Self, sea_orm::TryGetError> {
        let val = String::try_get_by(res, index)?;

        Ulid::from_string(&val)
            .map(Self::from)
            .map_err(|e| TryGetError::DbErr(DbErr::TryIntoErr { from: "String", into: "Ulid", source: Box::new(e) }))
    }
}

impl TryFromU64 for UlidId {
    fn try_from_u64(_: u64) -> Result<Self, DbErr> {
        Err(DbErr::ConvertFromU64("Ulid"))
    }
}

impl sea_orm::sea_query::ValueType for UlidId {
    fn try_from(v: sea_orm::prelude::Value) -> Result<Self, sea_orm::sea_query::ValueTypeErr> {
        match v {
            sea_orm::Value::String(Some(v)) => {
                Ulid::from_string(&v).map(Self::from).map_err(|_| sea_orm::sea_query::ValueTypeErr)
            }
            _ => Err(sea_orm::sea_query::ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "Ulid".to_owned()
    }

    fn array_type() -> sea_orm::sea_query::ArrayType {
        sea_orm::sea_query::ArrayType::String
    }

    fn column_type() -> sea_orm::prelude::ColumnType {
        sea_orm::prelude::ColumnType::Char(Some(26))
    }
}
