//! Gitea database store

use crate::queries::{self, LOCAL_LOGIN_TYPES, USER_TYPE_INDIVIDUAL, USER_TYPE_ORGANIZATION};
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;
use teabridge_core::config::DatabaseConfig;
use teabridge_core::{
    AuthError, Error, IdentityProvider, OrgRecord, Result, TeamRecord, UserRecord,
};
use tracing::{debug, info};

/// Database flavour behind the pool; decides placeholder syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(Error::ConfigError(format!(
                "Unsupported database scheme: '{}'",
                other
            ))),
        }
    }
}

type UserRow = (i64, String, String, String, i64, i64);

/// User columns followed by prohibit_login, login_type, passwd, passwd_hash_algo, salt
type CredentialRow = (
    i64,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    String,
    String,
    String,
);

fn user_from_row(row: UserRow) -> UserRecord {
    UserRecord {
        id: row.0,
        username: row.1,
        display_name: row.2,
        email: row.3,
        email_private: row.4 != 0,
        active: row.5 != 0,
    }
}

fn db_err(e: sqlx::Error) -> Error {
    Error::DatabaseError(Box::new(e))
}

pub struct GiteaStore {
    pool: AnyPool,
    backend: Backend,
}

impl GiteaStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let backend = Backend::from_url(&config.url)?;
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(db_err)?;

        info!(backend = ?backend, "Connected to Gitea database");
        Ok(Self::from_pool(pool, backend))
    }

    pub fn from_pool(pool: AnyPool, backend: Backend) -> Self {
        Self { pool, backend }
    }

    fn sql(&self, query: &str) -> String {
        match self.backend {
            Backend::Postgres => queries::numbered(query),
            Backend::Sqlite => query.to_string(),
        }
    }

    /// Look up a local account by login name, or by email when the login has an `@`
    async fn find_credentials(&self, login: &str) -> Result<Option<CredentialRow>> {
        let query = if login.contains('@') {
            self.sql(&queries::credentials_by_email())
        } else {
            self.sql(&queries::credentials_by_name())
        };

        sqlx::query_as::<_, CredentialRow>(&query)
            .bind(login)
            .bind(USER_TYPE_INDIVIDUAL)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl IdentityProvider for GiteaStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError> {
        let login = username.trim().to_lowercase();
        let row = self
            .find_credentials(&login)
            .await?
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        let (id, name, full_name, email, private, active, prohibited, login_type, hash, algo, salt) =
            row;

        if !LOCAL_LOGIN_TYPES.contains(&login_type) {
            return Err(AuthError::Provider(format!(
                "user {} signs in through external login source type {}",
                name, login_type
            )));
        }
        if prohibited != 0 || active == 0 {
            return Err(AuthError::LoginProhibited(name));
        }

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            teabridge_crypto::verify_password(&algo, &hash, &salt, &password)
        })
        .await
        .map_err(|e| AuthError::Provider(format!("password check aborted: {}", e)))?
        .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !verified {
            return Err(AuthError::InvalidPassword);
        }

        debug!(user = %name, "Credentials verified");
        Ok(user_from_row((id, name, full_name, email, private, active)))
    }

    async fn list_users(&self) -> Result<(Vec<UserRecord>, u64)> {
        let rows: Vec<UserRow> = sqlx::query_as(&self.sql(queries::LIST_USERS))
            .bind(USER_TYPE_INDIVIDUAL)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let users: Vec<UserRecord> = rows.into_iter().map(user_from_row).collect();
        let count = users.len() as u64;
        Ok((users, count))
    }

    async fn list_organizations(&self) -> Result<(Vec<OrgRecord>, u64)> {
        let rows: Vec<(i64, String)> = sqlx::query_as(&self.sql(queries::LIST_ORGANIZATIONS))
            .bind(USER_TYPE_ORGANIZATION)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let orgs: Vec<OrgRecord> = rows
            .into_iter()
            .map(|(id, name)| OrgRecord::new(id, name))
            .collect();
        let count = orgs.len() as u64;
        Ok((orgs, count))
    }

    async fn list_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRecord>> {
        let rows: Vec<(i64, i64, String)> =
            sqlx::query_as(&self.sql(queries::LIST_TEAMS_FOR_USER))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, org_id, name)| TeamRecord::new(id, org_id, name))
            .collect())
    }
}
