//! In-memory local repository implementation.
//!
//! Implements all repository traits over `HashMap`s behind an `RwLock`,
//! for unit tests and local development: fast, deterministic, isolated.
//! The uniqueness and foreign-key rules are enforced exactly as in the
//! Postgres backend so tests exercise the same contract.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::db::repository::{
    CategoryRepository, LineRepository, RepositoryError, RepositoryResult, StopRepository,
    UserRepository,
};
use crate::models::{
    default_end_time, default_start_time, Category, CategoryChanges, CategoryId, LineId,
    NewCategory, NewStop, NewTransportLine, NewUser, Stop, StopChanges, StopId, TransportLine,
    TransportLineChanges, User, UserChanges, UserId,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use transit_catalog::db::repositories::LocalRepository;
/// use transit_catalog::db::repository::CategoryRepository;
/// use transit_catalog::models::NewCategory;
///
/// # async fn example() {
/// let repo = LocalRepository::new();
/// let category = repo
///     .create_category(NewCategory { name: "Bus".to_string() })
///     .await
///     .unwrap();
/// assert_eq!(category.id.value(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    lines: HashMap<LineId, TransportLine>,
    stops: HashMap<StopId, Stop>,

    // ID counters
    next_user_id: i64,
    next_category_id: i64,
    next_line_id: i64,
    next_stop_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            categories: HashMap::new(),
            lines: HashMap::new(),
            stops: HashMap::new(),
            next_user_id: 1,
            next_category_id: 1,
            next_line_id: 1,
            next_stop_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        let mut data = self.data.write().unwrap();
        data.is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Number of users stored.
    pub fn user_count(&self) -> usize {
        self.data.read().unwrap().users.len()
    }

    /// Number of stops stored.
    pub fn stop_count(&self) -> usize {
        self.data.read().unwrap().stops.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        let data = self.data.read().unwrap();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_id<T, K: Ord>(map: &HashMap<K, T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    T: Clone,
{
    let mut items: Vec<T> = map.values().cloned().collect();
    items.sort_by_key(key);
    items
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let data = self.data.read().unwrap();
        Ok(data.is_healthy)
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if data
            .users
            .values()
            .any(|u| u.username == new_user.username)
        {
            return Err(RepositoryError::conflict("Username already in use"));
        }
        if data.users.values().any(|u| u.email == new_user.email) {
            return Err(RepositoryError::conflict("Email already in use"));
        }

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;

        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            created_at: Utc::now(),
        };
        data.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("User {} not found", id)))
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.users.contains_key(&id) {
            return Err(RepositoryError::not_found(format!("User {} not found", id)));
        }

        if let Some(ref username) = changes.username {
            if data
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(RepositoryError::conflict("Username already in use"));
            }
        }
        if let Some(ref email) = changes.email {
            if data.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(RepositoryError::conflict("Email already in use"));
            }
        }

        let user = data.users.get_mut(&id).expect("existence checked above");
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hashed_password) = changes.hashed_password {
            user.hashed_password = hashed_password;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<User> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        data.users
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("User {} not found", id)))
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(sorted_by_id(&data.users, |u| u.id))
    }
}

#[async_trait]
impl CategoryRepository for LocalRepository {
    async fn create_category(&self, new_category: NewCategory) -> RepositoryResult<Category> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if data
            .categories
            .values()
            .any(|c| c.name == new_category.name)
        {
            return Err(RepositoryError::conflict("Category name already in use"));
        }

        let id = CategoryId::new(data.next_category_id);
        data.next_category_id += 1;

        let category = Category {
            id,
            name: new_category.name,
        };
        data.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.categories
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Category {} not found", id)))
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> RepositoryResult<Category> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.categories.contains_key(&id) {
            return Err(RepositoryError::not_found(format!(
                "Category {} not found",
                id
            )));
        }

        if let Some(ref name) = changes.name {
            if data
                .categories
                .values()
                .any(|c| c.id != id && &c.name == name)
            {
                return Err(RepositoryError::conflict("Category name already in use"));
            }
        }

        let category = data
            .categories
            .get_mut(&id)
            .expect("existence checked above");
        if let Some(name) = changes.name {
            category.name = name;
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        // No cascade: lines keep their category_id and become orphans.
        data.categories
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Category {} not found", id)))
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(sorted_by_id(&data.categories, |c| c.id))
    }
}

#[async_trait]
impl LineRepository for LocalRepository {
    async fn create_line(&self, new_line: NewTransportLine) -> RepositoryResult<TransportLine> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.categories.contains_key(&new_line.category_id) {
            return Err(RepositoryError::not_found(format!(
                "Category {} not found",
                new_line.category_id
            )));
        }
        if data.lines.values().any(|l| l.name == new_line.name) {
            return Err(RepositoryError::conflict("Line name already in use"));
        }

        let id = LineId::new(data.next_line_id);
        data.next_line_id += 1;

        let line = TransportLine {
            id,
            name: new_line.name,
            category_id: new_line.category_id,
            created_at: Utc::now(),
            start_time: new_line.start_time.unwrap_or_else(default_start_time),
            end_time: new_line.end_time.unwrap_or_else(default_end_time),
        };
        data.lines.insert(id, line.clone());
        Ok(line)
    }

    async fn get_line(&self, id: LineId) -> RepositoryResult<TransportLine> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.lines
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Line {} not found", id)))
    }

    async fn update_line(
        &self,
        id: LineId,
        changes: TransportLineChanges,
    ) -> RepositoryResult<TransportLine> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.lines.contains_key(&id) {
            return Err(RepositoryError::not_found(format!("Line {} not found", id)));
        }

        if let Some(ref name) = changes.name {
            if data.lines.values().any(|l| l.id != id && &l.name == name) {
                return Err(RepositoryError::conflict("Line name already in use"));
            }
        }
        if let Some(category_id) = changes.category_id {
            if !data.categories.contains_key(&category_id) {
                return Err(RepositoryError::not_found(format!(
                    "Category {} not found",
                    category_id
                )));
            }
        }

        let line = data.lines.get_mut(&id).expect("existence checked above");
        if let Some(name) = changes.name {
            line.name = name;
        }
        if let Some(category_id) = changes.category_id {
            line.category_id = category_id;
        }
        if let Some(start_time) = changes.start_time {
            line.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            line.end_time = end_time;
        }
        Ok(line.clone())
    }

    async fn delete_line(&self, id: LineId) -> RepositoryResult<TransportLine> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        // No cascade: stops keep their line_id and become orphans.
        data.lines
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Line {} not found", id)))
    }

    async fn list_lines(&self) -> RepositoryResult<Vec<TransportLine>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(sorted_by_id(&data.lines, |l| l.id))
    }
}

#[async_trait]
impl StopRepository for LocalRepository {
    async fn create_stop(&self, new_stop: NewStop) -> RepositoryResult<Stop> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.lines.contains_key(&new_stop.line_id) {
            return Err(RepositoryError::not_found(format!(
                "Line {} not found",
                new_stop.line_id
            )));
        }

        let id = StopId::new(data.next_stop_id);
        data.next_stop_id += 1;

        let stop = Stop {
            id,
            line_id: new_stop.line_id,
            name: new_stop.name,
            latitude: new_stop.latitude,
            longitude: new_stop.longitude,
            stop_order: new_stop.stop_order,
        };
        data.stops.insert(id, stop.clone());
        Ok(stop)
    }

    async fn get_stop(&self, id: StopId) -> RepositoryResult<Stop> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.stops
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Stop {} not found", id)))
    }

    async fn update_stop(&self, id: StopId, changes: StopChanges) -> RepositoryResult<Stop> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        if !data.stops.contains_key(&id) {
            return Err(RepositoryError::not_found(format!("Stop {} not found", id)));
        }

        if let Some(line_id) = changes.line_id {
            if !data.lines.contains_key(&line_id) {
                return Err(RepositoryError::not_found(format!(
                    "Line {} not found",
                    line_id
                )));
            }
        }

        let stop = data.stops.get_mut(&id).expect("existence checked above");
        if let Some(line_id) = changes.line_id {
            stop.line_id = line_id;
        }
        if let Some(name) = changes.name {
            stop.name = name;
        }
        if let Some(latitude) = changes.latitude {
            stop.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            stop.longitude = longitude;
        }
        if let Some(stop_order) = changes.stop_order {
            stop.stop_order = stop_order;
        }
        Ok(stop.clone())
    }

    async fn delete_stop(&self, id: StopId) -> RepositoryResult<Stop> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        data.stops
            .remove(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Stop {} not found", id)))
    }

    async fn list_stops(&self) -> RepositoryResult<Vec<Stop>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(sorted_by_id(&data.stops, |s| s.id))
    }
}
