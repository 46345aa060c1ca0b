//! Repository trait definitions for catalog storage.
//!
//! Database operations are split across four focused traits, one per
//! entity kind, so implementations stay testable and callers can depend
//! on exactly the capability they need:
//!
//! - [`UserRepository`]: user accounts (also hosts the health probe)
//! - [`CategoryRepository`]: transport categories
//! - [`LineRepository`]: transport lines
//! - [`StopRepository`]: stops
//!
//! All four share the same contract shape:
//!
//! - `create` runs the pre-insert uniqueness checks (User.username,
//!   User.email, Category.name, TransportLine.name) and the foreign-key
//!   existence check (line -> category, stop -> line). The storage-level
//!   unique index remains the authority under concurrency.
//! - `update` accepts a changeset of optional fields; absent fields are
//!   left unmodified and an all-empty changeset is a no-op. Uniqueness
//!   re-checks exclude the record's own id.
//! - `delete` returns the pre-delete snapshot and never cascades;
//!   dependent records are orphaned, not removed.
//! - `list` returns every record ordered by id.
//!
//! For code that needs all of them, use the [`FullRepository`] bound.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::models::{
    Category, CategoryChanges, CategoryId, LineId, NewCategory, NewStop, NewTransportLine,
    NewUser, Stop, StopChanges, StopId, TransportLine, TransportLineChanges, User, UserChanges,
    UserId,
};

/// Repository for user accounts.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Create a user. Fails with `Conflict` when the username or email is
    /// in use.
    ///
    /// `new_user.hashed_password` is the stored digest; callers hash
    /// before invoking the repository.
    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User>;

    /// Fetch a user by primary key.
    async fn get_user(&self, id: UserId) -> RepositoryResult<User>;

    /// Look a user up by username. `Ok(None)` when absent - credential
    /// verification maps that to an authentication error itself.
    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// Apply a partial update.
    ///
    /// Fails `NotFound` for an unknown id and `Conflict` when the new
    /// username or email is held by another user.
    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User>;

    /// Delete a user and return the pre-delete snapshot.
    async fn delete_user(&self, id: UserId) -> RepositoryResult<User>;

    /// List all users ordered by id.
    async fn list_users(&self) -> RepositoryResult<Vec<User>>;
}

/// Repository for transport categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a category. Fails with `Conflict` when the name is in use.
    async fn create_category(&self, new_category: NewCategory) -> RepositoryResult<Category>;

    /// Fetch a category by primary key.
    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category>;

    /// Apply a partial update; the name re-check excludes this id.
    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> RepositoryResult<Category>;

    /// Delete a category and return the snapshot. Lines referencing the
    /// category are left in place (orphaned).
    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<Category>;

    /// List all categories ordered by id.
    async fn list_categories(&self) -> RepositoryResult<Vec<Category>>;
}

/// Repository for transport lines.
#[async_trait]
pub trait LineRepository: Send + Sync {
    /// Create a line.
    ///
    /// Fails `NotFound` when the referenced category does not exist and
    /// `Conflict` when the name is in use. Missing service window bounds
    /// default to 05:00 / 23:00.
    async fn create_line(&self, new_line: NewTransportLine) -> RepositoryResult<TransportLine>;

    /// Fetch a line by primary key.
    async fn get_line(&self, id: LineId) -> RepositoryResult<TransportLine>;

    /// Apply a partial update; a new `category_id` must reference an
    /// existing category.
    async fn update_line(
        &self,
        id: LineId,
        changes: TransportLineChanges,
    ) -> RepositoryResult<TransportLine>;

    /// Delete a line and return the snapshot. Stops on the line are left
    /// in place (orphaned).
    async fn delete_line(&self, id: LineId) -> RepositoryResult<TransportLine>;

    /// List all lines ordered by id.
    async fn list_lines(&self) -> RepositoryResult<Vec<TransportLine>>;
}

/// Repository for stops.
#[async_trait]
pub trait StopRepository: Send + Sync {
    /// Create a stop. Fails `NotFound` when the referenced line does not
    /// exist.
    async fn create_stop(&self, new_stop: NewStop) -> RepositoryResult<Stop>;

    /// Fetch a stop by primary key.
    async fn get_stop(&self, id: StopId) -> RepositoryResult<Stop>;

    /// Apply a partial update; a new `line_id` must reference an existing
    /// line.
    async fn update_stop(&self, id: StopId, changes: StopChanges) -> RepositoryResult<Stop>;

    /// Delete a stop and return the snapshot.
    async fn delete_stop(&self, id: StopId) -> RepositoryResult<Stop>;

    /// List all stops ordered by id.
    async fn list_stops(&self) -> RepositoryResult<Vec<Stop>>;
}

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four entity
/// repositories; use it where a caller needs the whole catalog.
pub trait FullRepository:
    UserRepository + CategoryRepository + LineRepository + StopRepository
{
}

impl<T> FullRepository for T where
    T: UserRepository + CategoryRepository + LineRepository + StopRepository
{
}
