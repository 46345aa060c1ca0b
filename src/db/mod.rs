//! Database module for catalog data storage.
//!
//! This module provides abstractions for database operations via the
//! Repository pattern, allowing different storage backends to be swapped
//! easily.
//!
//! # Repository Pattern
//! The module includes:
//! - `repository`: Trait definitions for database operations
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `repositories::local`: In-memory implementation for unit testing and
//!   local development
//! - `factory`: Factory for creating repository instances
//! - `repo_config`: TOML configuration file support
//!
//! # Usage
//!
//! ```ignore
//! use transit_catalog::db::{RepositoryFactory, RepositoryType};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let categories = repo.list_categories().await?;
//!     Ok(())
//! }
//! ```

// Feature flag priority: postgres > local
// When multiple features are enabled (e.g., --all-features), postgres takes precedence.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use repo_config::RepositoryConfig;

// Repository traits and implementations
pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CategoryRepository, ErrorContext, FullRepository, LineRepository, RepositoryError,
    RepositoryResult, StopRepository, UserRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Drive an init future to completion from a sync context.
///
/// When called from within a running tokio runtime (the server binary's
/// `#[tokio::main]`), blocking in place on the current handle avoids the
/// panic that creating a nested runtime would trigger. Outside a runtime,
/// a throwaway one is built for the call.
#[cfg_attr(not(feature = "postgres-repo"), allow(dead_code))]
fn block_on_init<F, T>(fut: F) -> Result<T>
where
    F: std::future::Future<Output = RepositoryResult<T>>,
{
    let result = match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
        Err(_) => tokio::runtime::Runtime::new()
            .context("Failed to create async runtime for repository init")?
            .block_on(fut),
    };
    Ok(result?)
}

// Priority: postgres > local (when --all-features is used)
#[cfg(feature = "postgres-repo")]
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
    let repo = RepositoryFactory::create_postgres(&config).await?;
    Ok(repo as Arc<dyn FullRepository>)
}

#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository singleton for the selected backend.
#[cfg(feature = "postgres-repo")]
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = block_on_init(create_selected_repository())?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Initialize the global repository singleton for the selected backend.
#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_selected_repository()?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = init_repository();
    }

    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    // The server binary calls init from inside #[tokio::main]; the init
    // driver must not panic there.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_on_init_inside_a_runtime() {
        let value = block_on_init(async { Ok::<_, RepositoryError>(42) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_block_on_init_without_a_runtime() {
        let value = block_on_init(async { Ok::<_, RepositoryError>(42) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_block_on_init_propagates_errors() {
        let result =
            block_on_init(async { Err::<(), _>(RepositoryError::configuration("bad url")) });
        assert!(result.is_err());
    }
}
