//! Postgres registry
//!
//! Uniqueness of active mappings is enforced by a partial unique index over
//! `(uri, language_id)`; inserts are conditional (`ON CONFLICT DO NOTHING`)
//! so two concurrent writers can never both activate the same uri, and the
//! composed retire-and-insert step runs in one transaction.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::languages::LanguageId;
use crate::mappings::ContentRef;
use crate::mappings::Mapping;

use super::Error;
use super::InsertMappingValues;
use super::InsertOutcome;
use super::MappingFilter;
use super::Registry;
use super::Result;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Conditional insert, loses silently against an existing active holder
const INSERT_SQL: &str = r"
    INSERT INTO uri_mappings (id, uri, language_id, content_type, content_id, query_fragment, status)
    VALUES ($1, $2, $3, $4, $5, $6, 'active')
    ON CONFLICT (uri, language_id) WHERE status = 'active' DO NOTHING
    RETURNING *
    ";

/// Postgres registry
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create a Postgres registry
    ///
    /// Uses the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    ///
    /// # Panics
    ///
    /// Panics without a valid `DATABASE_URL` or reachable database, the
    /// registry is unusable either way
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create a Postgres registry with an existing pool
    ///
    /// Migrations will be run
    ///
    /// # Panics
    ///
    /// Panics when migrations cannot run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }

    /// Resolve a lost conditional insert into its outcome
    ///
    /// The insert returned no row, so some record holds the uri: the same
    /// content item means a no-op success, anything else is a collision. The
    /// holder disappearing in between still reports a collision, the caller
    /// retries the whole operation.
    async fn losing_insert_outcome(&self, values: &InsertMappingValues<'_>) -> Result<InsertOutcome> {
        let holder = sqlx::query_as::<_, Mapping>(
            r"
            SELECT *
            FROM uri_mappings
            WHERE uri = $1 AND language_id = $2 AND status = 'active'
            LIMIT 1
            ",
        )
        .bind(values.uri)
        .bind(values.language_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(store_error)?;

        match holder {
            Some(holder) if holder.content_ref() == values.content => {
                Ok(InsertOutcome::Unchanged(holder))
            }
            _ => Err(Error::Collision {
                uri: values.uri.to_string(),
                language_id: values.language_id,
            }),
        }
    }
}

#[async_trait]
impl Registry for Postgres {
    async fn find_active(
        &self,
        content: ContentRef,
        language_id: LanguageId,
    ) -> Result<Option<Mapping>> {
        let mapping = sqlx::query_as::<_, Mapping>(
            r"
            SELECT *
            FROM uri_mappings
            WHERE content_type = $1 AND content_id = $2 AND language_id = $3
                AND status = 'active'
            LIMIT 1
            ",
        )
        .bind(content.content_type)
        .bind(content.content_id)
        .bind(language_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(store_error)?;

        Ok(mapping)
    }

    async fn find_by_uri(&self, uri: &str, language_id: LanguageId) -> Result<Option<Mapping>> {
        let mapping = sqlx::query_as::<_, Mapping>(
            r"
            SELECT *
            FROM uri_mappings
            WHERE uri = $1 AND language_id = $2
            ORDER BY (status = 'active') DESC, created_at DESC
            LIMIT 1
            ",
        )
        .bind(uri)
        .bind(language_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(store_error)?;

        Ok(mapping)
    }

    async fn insert(&self, values: &InsertMappingValues<'_>) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, Mapping>(INSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(values.uri)
            .bind(values.language_id)
            .bind(values.content.content_type)
            .bind(values.content.content_id)
            .bind(values.query_fragment)
            .fetch_optional(&self.connection_pool)
            .await
            .map_err(store_error)?;

        match inserted {
            Some(mapping) => Ok(InsertOutcome::Inserted(mapping)),
            None => self.losing_insert_outcome(values).await,
        }
    }

    async fn retire(&self, uri: &str, language_id: LanguageId) -> Result<()> {
        sqlx::query(
            r"
            UPDATE uri_mappings
            SET status = 'historical'
            WHERE uri = $1 AND language_id = $2 AND status = 'active'
            ",
        )
        .bind(uri)
        .bind(language_id)
        .execute(&self.connection_pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn replace(
        &self,
        previous: Option<&str>,
        values: &InsertMappingValues<'_>,
    ) -> Result<InsertOutcome> {
        let mut tx = self.connection_pool.begin().await.map_err(store_error)?;

        if let Some(previous) = previous {
            sqlx::query(
                r"
                UPDATE uri_mappings
                SET status = 'historical'
                WHERE uri = $1 AND language_id = $2 AND status = 'active'
                ",
            )
            .bind(previous)
            .bind(values.language_id)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }

        let inserted = sqlx::query_as::<_, Mapping>(INSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(values.uri)
            .bind(values.language_id)
            .bind(values.content.content_type)
            .bind(values.content.content_id)
            .bind(values.query_fragment)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        match inserted {
            Some(mapping) => {
                tx.commit().await.map_err(store_error)?;

                Ok(InsertOutcome::Inserted(mapping))
            }
            None => {
                // the retire must not survive a lost insert
                tx.rollback().await.map_err(store_error)?;

                self.losing_insert_outcome(values).await
            }
        }
    }

    async fn delete_all(&self, content: ContentRef) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM uri_mappings
            WHERE content_type = $1 AND content_id = $2
            ",
        )
        .bind(content.content_type)
        .bind(content.content_id)
        .execute(&self.connection_pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn list(&self, filter: &MappingFilter) -> Result<Vec<Mapping>> {
        let mappings = sqlx::query_as::<_, Mapping>(
            r"
            SELECT *
            FROM uri_mappings
            WHERE ($1::content_type IS NULL OR content_type = $1)
                AND ($2::integer IS NULL OR content_id = $2)
                AND ($3::integer IS NULL OR language_id = $3)
                AND ($4::mapping_status IS NULL OR status = $4)
            ORDER BY created_at DESC
            ",
        )
        .bind(filter.content_type)
        .bind(filter.content_id)
        .bind(filter.language_id)
        .bind(filter.status)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(store_error)?;

        Ok(mappings)
    }
}

/// Convert `SQLx` to registry store error
fn store_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Store(err.to_string())
}
