use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::{Subscription, User};
use crate::error::AppError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, username, password, name, surname, birthday";
const MIGRATIONS_TABLE: &str = "SELECT to_regclass('_sqlx_migrations')::text";
const APPLIED_VERSIONS: &str = "SELECT version FROM _sqlx_migrations WHERE success";

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(5);
        Self::new_with_options(&config.url(), config.max_connections, timeout).await
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Builds a pool without opening a connection; the first query connects.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(&config.url())?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Retries `connect` once per second, for freshly started containers.
    pub async fn wait_for(config: &DatabaseConfig, attempts: u32) -> Result<Self, AppError> {
        let mut last_error = None;
        for attempt in 1..=attempts.max(1) {
            match Self::connect(config).await {
                Ok(db) => {
                    info!("Database reachable after {} attempt(s)", attempt);
                    return Ok(db);
                }
                Err(e) => {
                    warn!("Database not ready ({}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        let no_attempt = || AppError::InternalError("no connection attempt made".into());
        Err(last_error.unwrap_or_else(no_attempt))
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn get_pool_status(&self) -> DbPoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DbPoolStatus {
            total_connections: size,
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
        }
    }

    /// Applies every pending migration and returns how many were applied.
    ///
    /// Running it again without new migrations applies nothing.
    pub async fn run_migrations(&self) -> Result<usize, AppError> {
        let before = self.applied_migrations().await?;
        MIGRATOR.run(self.pool()).await?;
        let after = self.applied_migrations().await?;

        Ok(after.difference(&before).count())
    }

    async fn applied_migrations(&self) -> Result<HashSet<i64>, AppError> {
        let table: Option<String> = sqlx::query_scalar(MIGRATIONS_TABLE)
            .fetch_one(self.pool())
            .await?;
        if table.is_none() {
            return Ok(HashSet::new());
        }

        let versions: Vec<i64> = sqlx::query_scalar(APPLIED_VERSIONS)
            .fetch_all(self.pool())
            .await?;

        Ok(versions.into_iter().collect())
    }

    pub async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let query = format!(
            r#"
            INSERT INTO "user" ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.name)
            .bind(&user.surname)
            .bind(user.birthday)
            .fetch_one(self.pool())
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let query = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE username = $1"#);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        surname: &str,
        birthday: NaiveDate,
    ) -> Result<User, AppError> {
        let query = format!(
            r#"
            UPDATE "user" SET name = $2, surname = $3, birthday = $4
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(name)
            .bind(surname)
            .bind(birthday)
            .fetch_one(self.pool())
            .await?;

        Ok(user)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(r#"UPDATE "user" SET password = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    /// Users whose birthdays `user_id` follows, ordered by username.
    pub async fn list_subscribed_users(&self, user_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.password, u.name, u.surname, u.birthday
            FROM subscription s
            JOIN "user" u ON u.id = s.user_sub_id
            WHERE s.user_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(users)
    }

    pub async fn find_subscription(
        &self,
        user_id: Uuid,
        user_sub_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, user_sub_id FROM subscription
            WHERE user_id = $1 AND user_sub_id = $2
            "#,
        )
        .bind(user_id)
        .bind(user_sub_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(sub)
    }

    pub async fn create_subscription(&self, sub: &Subscription) -> Result<Subscription, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscription (id, user_id, user_sub_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, user_sub_id
            "#,
        )
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.user_sub_id)
        .fetch_one(self.pool())
        .await?;

        Ok(sub)
    }

    pub async fn delete_subscription(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM subscription WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_migrations_are_embedded_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![20240605173536, 20240605173627]);

        let descriptions: Vec<&str> = MIGRATOR.iter().map(|m| m.description.as_ref()).collect();
        assert_eq!(descriptions, vec!["initial", "seed demo users"]);
    }

    #[tokio::test]
    async fn test_lazy_pool_starts_empty() {
        let settings = Settings::new_for_test().expect("Failed to load test config");
        let db = DbOperations::connect_lazy(&settings.database).expect("Failed to build lazy pool");

        let status = db.get_pool_status();
        assert_eq!(status.total_connections, 0);
        assert_eq!(status.active_connections, 0);
        assert_eq!(status.idle_connections, 0);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_database_fails() {
        let mut settings = Settings::new_for_test().expect("Failed to load test config");
        settings.database.host = "127.0.0.1".to_string();
        settings.database.port = 1;

        let url = settings.database.url();
        let timeout = Duration::from_millis(500);
        let result = DbOperations::new_with_options(&url, 1, timeout).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
