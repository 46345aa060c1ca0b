//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres
//! database. Uniqueness and parent-existence checks run inside the same
//! transaction as the write, and the unique indexes declared by the
//! migrations remain the authority when two transactions race.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::{
    CategoryRepository, ErrorContext, LineRepository, RepositoryError, RepositoryResult,
    StopRepository, UserRepository,
};
use crate::models::{
    default_end_time, default_start_time, Category, CategoryChanges, CategoryId, LineId,
    NewCategory, NewStop, NewTransportLine, NewUser, Stop, StopChanges, StopId, TransportLine,
    TransportLineChanges, User, UserChanges, UserId,
};

mod models;
mod schema;

use models::*;
use schema::{category, stop, transportline, users};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| {
                RepositoryError::internal(format!("Migration failed: {}", e))
                    .with_operation("run_migrations")
            })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal(format!("Task join error: {}", e))
                .with_operation("spawn_blocking")
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn email_in_use(
    conn: &mut PgConnection,
    email: &str,
    exclude: Option<UserId>,
) -> RepositoryResult<bool> {
    let mut query = users::table.filter(users::email.eq(email)).into_boxed();
    if let Some(id) = exclude {
        query = query.filter(users::user_id.ne(id.value()));
    }
    let count: i64 = query
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

fn username_in_use(
    conn: &mut PgConnection,
    username: &str,
    exclude: Option<UserId>,
) -> RepositoryResult<bool> {
    let mut query = users::table
        .filter(users::username.eq(username))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(users::user_id.ne(id.value()));
    }
    let count: i64 = query
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

fn category_exists(conn: &mut PgConnection, id: CategoryId) -> RepositoryResult<bool> {
    let count: i64 = category::table
        .filter(category::category_id.eq(id.value()))
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

fn line_exists(conn: &mut PgConnection, id: LineId) -> RepositoryResult<bool> {
    let count: i64 = transportline::table
        .filter(transportline::line_id.eq(id.value()))
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

fn category_name_in_use(
    conn: &mut PgConnection,
    name: &str,
    exclude: Option<CategoryId>,
) -> RepositoryResult<bool> {
    let mut query = category::table.filter(category::name.eq(name)).into_boxed();
    if let Some(id) = exclude {
        query = query.filter(category::category_id.ne(id.value()));
    }
    let count: i64 = query
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

fn line_name_in_use(
    conn: &mut PgConnection,
    name: &str,
    exclude: Option<LineId>,
) -> RepositoryResult<bool> {
    let mut query = transportline::table
        .filter(transportline::name.eq(name))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(transportline::line_id.ne(id.value()));
    }
    let count: i64 = query
        .count()
        .get_result(conn)
        .map_err(map_diesel_error)?;
    Ok(count > 0)
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if username_in_use(tx, &new_user.username, None)? {
                    return Err(RepositoryError::conflict_with_context(
                        "Username already in use",
                        ErrorContext::new("create_user").with_entity("user"),
                    ));
                }
                if email_in_use(tx, &new_user.email, None)? {
                    return Err(RepositoryError::conflict_with_context(
                        "Email already in use",
                        ErrorContext::new("create_user").with_entity("user"),
                    ));
                }

                let row: UserRow = diesel::insert_into(users::table)
                    .values(NewUserRow {
                        username: new_user.username.clone(),
                        email: new_user.email.clone(),
                        hashed_password: new_user.hashed_password.clone(),
                    })
                    .returning(UserRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            let row: UserRow = users::table
                .filter(users::user_id.eq(id.value()))
                .select(UserRow::as_select())
                .first(conn)
                .map_err(map_diesel_error)?;
            Ok(row.into())
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .filter(users::username.eq(&username))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let current: UserRow = users::table
                    .filter(users::user_id.eq(id.value()))
                    .select(UserRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                if changes.is_empty() {
                    return Ok(current.into());
                }

                if let Some(ref username) = changes.username {
                    if username_in_use(tx, username, Some(id))? {
                        return Err(RepositoryError::conflict_with_context(
                            "Username already in use",
                            ErrorContext::new("update_user").with_entity_id(id),
                        ));
                    }
                }
                if let Some(ref email) = changes.email {
                    if email_in_use(tx, email, Some(id))? {
                        return Err(RepositoryError::conflict_with_context(
                            "Email already in use",
                            ErrorContext::new("update_user").with_entity_id(id),
                        ));
                    }
                }

                let row: UserRow = diesel::update(users::table.filter(users::user_id.eq(id.value())))
                    .set(UserChangeset {
                        username: changes.username.clone(),
                        email: changes.email.clone(),
                        hashed_password: changes.hashed_password.clone(),
                    })
                    .returning(UserRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row: UserRow =
                    diesel::delete(users::table.filter(users::user_id.eq(id.value())))
                        .returning(UserRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.with_conn(|conn| {
            let rows: Vec<UserRow> = users::table
                .select(UserRow::as_select())
                .order(users::user_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}

#[async_trait]
impl CategoryRepository for PostgresRepository {
    async fn create_category(&self, new_category: NewCategory) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if category_name_in_use(tx, &new_category.name, None)? {
                    return Err(RepositoryError::conflict_with_context(
                        "Category name already in use",
                        ErrorContext::new("create_category").with_entity("category"),
                    ));
                }

                let row: CategoryRow = diesel::insert_into(category::table)
                    .values(NewCategoryRow {
                        name: new_category.name.clone(),
                    })
                    .returning(CategoryRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            let row: CategoryRow = category::table
                .filter(category::category_id.eq(id.value()))
                .select(CategoryRow::as_select())
                .first(conn)
                .map_err(map_diesel_error)?;
            Ok(row.into())
        })
        .await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let current: CategoryRow = category::table
                    .filter(category::category_id.eq(id.value()))
                    .select(CategoryRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                if changes.is_empty() {
                    return Ok(current.into());
                }

                if let Some(ref name) = changes.name {
                    if category_name_in_use(tx, name, Some(id))? {
                        return Err(RepositoryError::conflict_with_context(
                            "Category name already in use",
                            ErrorContext::new("update_category").with_entity_id(id),
                        ));
                    }
                }

                let row: CategoryRow =
                    diesel::update(category::table.filter(category::category_id.eq(id.value())))
                        .set(CategoryChangeset {
                            name: changes.name.clone(),
                        })
                        .returning(CategoryRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                // No FK constraint on transportline.category_id: dependent
                // lines are orphaned, not blocked or removed.
                let row: CategoryRow =
                    diesel::delete(category::table.filter(category::category_id.eq(id.value())))
                        .returning(CategoryRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.with_conn(|conn| {
            let rows: Vec<CategoryRow> = category::table
                .select(CategoryRow::as_select())
                .order(category::category_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}

#[async_trait]
impl LineRepository for PostgresRepository {
    async fn create_line(&self, new_line: NewTransportLine) -> RepositoryResult<TransportLine> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if !category_exists(tx, new_line.category_id)? {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Category {} not found", new_line.category_id),
                        ErrorContext::new("create_line").with_entity("category"),
                    ));
                }
                if line_name_in_use(tx, &new_line.name, None)? {
                    return Err(RepositoryError::conflict_with_context(
                        "Line name already in use",
                        ErrorContext::new("create_line").with_entity("line"),
                    ));
                }

                let row: TransportLineRow = diesel::insert_into(transportline::table)
                    .values(NewTransportLineRow {
                        name: new_line.name.clone(),
                        category_id: new_line.category_id.value(),
                        start_time: new_line.start_time.unwrap_or_else(default_start_time),
                        end_time: new_line.end_time.unwrap_or_else(default_end_time),
                    })
                    .returning(TransportLineRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn get_line(&self, id: LineId) -> RepositoryResult<TransportLine> {
        self.with_conn(move |conn| {
            let row: TransportLineRow = transportline::table
                .filter(transportline::line_id.eq(id.value()))
                .select(TransportLineRow::as_select())
                .first(conn)
                .map_err(map_diesel_error)?;
            Ok(row.into())
        })
        .await
    }

    async fn update_line(
        &self,
        id: LineId,
        changes: TransportLineChanges,
    ) -> RepositoryResult<TransportLine> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let current: TransportLineRow = transportline::table
                    .filter(transportline::line_id.eq(id.value()))
                    .select(TransportLineRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                if changes.is_empty() {
                    return Ok(current.into());
                }

                if let Some(ref name) = changes.name {
                    if line_name_in_use(tx, name, Some(id))? {
                        return Err(RepositoryError::conflict_with_context(
                            "Line name already in use",
                            ErrorContext::new("update_line").with_entity_id(id),
                        ));
                    }
                }
                if let Some(category_id) = changes.category_id {
                    if !category_exists(tx, category_id)? {
                        return Err(RepositoryError::not_found_with_context(
                            format!("Category {} not found", category_id),
                            ErrorContext::new("update_line").with_entity_id(id),
                        ));
                    }
                }

                let row: TransportLineRow =
                    diesel::update(transportline::table.filter(transportline::line_id.eq(id.value())))
                        .set(TransportLineChangeset {
                            name: changes.name.clone(),
                            category_id: changes.category_id.map(|c| c.value()),
                            start_time: changes.start_time,
                            end_time: changes.end_time,
                        })
                        .returning(TransportLineRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn delete_line(&self, id: LineId) -> RepositoryResult<TransportLine> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                // No FK constraint on stop.line_id: stops on the line are
                // orphaned, not blocked or removed.
                let row: TransportLineRow =
                    diesel::delete(transportline::table.filter(transportline::line_id.eq(id.value())))
                        .returning(TransportLineRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn list_lines(&self) -> RepositoryResult<Vec<TransportLine>> {
        self.with_conn(|conn| {
            let rows: Vec<TransportLineRow> = transportline::table
                .select(TransportLineRow::as_select())
                .order(transportline::line_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}

#[async_trait]
impl StopRepository for PostgresRepository {
    async fn create_stop(&self, new_stop: NewStop) -> RepositoryResult<Stop> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if !line_exists(tx, new_stop.line_id)? {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Line {} not found", new_stop.line_id),
                        ErrorContext::new("create_stop").with_entity("line"),
                    ));
                }

                let row: StopRow = diesel::insert_into(stop::table)
                    .values(NewStopRow {
                        line_id: new_stop.line_id.value(),
                        name: new_stop.name.clone(),
                        latitude: new_stop.latitude,
                        longitude: new_stop.longitude,
                        stop_order: new_stop.stop_order,
                    })
                    .returning(StopRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn get_stop(&self, id: StopId) -> RepositoryResult<Stop> {
        self.with_conn(move |conn| {
            let row: StopRow = stop::table
                .filter(stop::stop_id.eq(id.value()))
                .select(StopRow::as_select())
                .first(conn)
                .map_err(map_diesel_error)?;
            Ok(row.into())
        })
        .await
    }

    async fn update_stop(&self, id: StopId, changes: StopChanges) -> RepositoryResult<Stop> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let current: StopRow = stop::table
                    .filter(stop::stop_id.eq(id.value()))
                    .select(StopRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                if changes.is_empty() {
                    return Ok(current.into());
                }

                if let Some(line_id) = changes.line_id {
                    if !line_exists(tx, line_id)? {
                        return Err(RepositoryError::not_found_with_context(
                            format!("Line {} not found", line_id),
                            ErrorContext::new("update_stop").with_entity_id(id),
                        ));
                    }
                }

                let row: StopRow = diesel::update(stop::table.filter(stop::stop_id.eq(id.value())))
                    .set(StopChangeset {
                        line_id: changes.line_id.map(|l| l.value()),
                        name: changes.name.clone(),
                        latitude: changes.latitude,
                        longitude: changes.longitude,
                        stop_order: changes.stop_order,
                    })
                    .returning(StopRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(row.into())
            })
        })
        .await
    }

    async fn delete_stop(&self, id: StopId) -> RepositoryResult<Stop> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row: StopRow =
                    diesel::delete(stop::table.filter(stop::stop_id.eq(id.value())))
                        .returning(StopRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                Ok(row.into())
            })
        })
        .await
    }

    async fn list_stops(&self) -> RepositoryResult<Vec<Stop>> {
        self.with_conn(|conn| {
            let rows: Vec<StopRow> = stop::table
                .select(StopRow::as_select())
                .order(stop::stop_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}
