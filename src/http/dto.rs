//! Data transfer objects for the HTTP API.
//!
//! Request and response bodies are kept separate from the domain models so
//! the wire format can evolve without touching the repository layer. The
//! only response that exposes the stored password digest is the `/allusers`
//! listing; everything else uses [`UserResponse`].

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, CategoryId, LineId, Stop, TransportLine, User};

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// =============================================================================
// Auth
// =============================================================================

/// Form body for `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User representation without the password digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Full user row for the `/allusers` listing, digest included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithHashResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserWithHashResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            created_at: user.created_at,
        }
    }
}

/// Partial update for a user. Absent fields are left unchanged; a new
/// password is digested before it reaches storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub message: String,
    pub user: UserResponse,
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.value(),
            name: category.name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCategoryResponse {
    pub message: String,
    pub category: CategoryResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCategoryResponse {
    pub message: String,
    pub category: CategoryResponse,
}

// =============================================================================
// Transport lines
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLineRequest {
    pub name: String,
    pub category_id: i64,
    /// Defaults to 05:00 when omitted.
    pub start_time: Option<NaiveTime>,
    /// Defaults to 23:00 when omitted.
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineResponse {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<TransportLine> for LineResponse {
    fn from(line: TransportLine) -> Self {
        Self {
            id: line.id.value(),
            name: line.name,
            category_id: line.category_id.value(),
            created_at: line.created_at,
            start_time: line.start_time,
            end_time: line.end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLineRequest {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLineResponse {
    pub message: String,
    pub line: LineResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteLineResponse {
    pub message: String,
    pub line: LineResponse,
}

// =============================================================================
// Stops
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStopRequest {
    pub line_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub id: i64,
    pub line_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

impl From<Stop> for StopResponse {
    fn from(stop: Stop) -> Self {
        Self {
            id: stop.id.value(),
            line_id: stop.line_id.value(),
            name: stop.name,
            latitude: stop.latitude,
            longitude: stop.longitude,
            stop_order: stop.stop_order,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStopRequest {
    pub line_id: Option<i64>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stop_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStopResponse {
    pub message: String,
    pub stop: StopResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStopResponse {
    pub message: String,
    pub stop: StopResponse,
}

// Conversion helpers for path parameters.

impl UpdateLineRequest {
    pub fn category_id_typed(&self) -> Option<CategoryId> {
        self.category_id.map(CategoryId::new)
    }
}

impl UpdateStopRequest {
    pub fn line_id_typed(&self) -> Option<LineId> {
        self.line_id.map(LineId::new)
    }
}
