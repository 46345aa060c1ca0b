//! Catalog entity types shared by the repository and HTTP layers.
//!
//! All types derive Serialize/Deserialize for JSON serialization. The
//! catalog graph is `Category -> TransportLine -> Stop`; `User` stands
//! alone and carries the password digest for authentication.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

/// Transport line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(pub i64);

/// Stop identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StopId(pub i64);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

impl_id!(UserId);
impl_id!(CategoryId);
impl_id!(LineId);
impl_id!(StopId);

/// Default service window start for a transport line (05:00).
pub fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(5, 0, 0).expect("05:00 is a valid time")
}

/// Default service window end for a transport line (23:00).
pub fn default_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 0, 0).expect("23:00 is a valid time")
}

// =============================================================================
// Users
// =============================================================================

/// A registered user as stored by the repository.
///
/// `hashed_password` is a one-way digest; the plaintext never reaches
/// the repository layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user. The password is already hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

/// Partial update for a user. Absent fields are left unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.hashed_password.is_none()
    }
}

// =============================================================================
// Categories
// =============================================================================

/// A transport category (bus, metro, tram, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Fields required to create a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

/// Partial update for a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryChanges {
    pub name: Option<String>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

// =============================================================================
// Transport lines
// =============================================================================

/// A transport line belonging to a category.
///
/// `start_time` and `end_time` are times of day bounding the service
/// window, independent of `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLine {
    pub id: LineId,
    pub name: String,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Fields required to create a transport line.
///
/// Missing service window bounds fall back to 05:00 / 23:00.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransportLine {
    pub name: String,
    pub category_id: CategoryId,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Partial update for a transport line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportLineChanges {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl TransportLineChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category_id.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

// =============================================================================
// Stops
// =============================================================================

/// A stop on a transport line.
///
/// `stop_order` is a caller-supplied position hint within the line; no
/// uniqueness or contiguity is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub line_id: LineId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

/// Fields required to create a stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStop {
    pub line_id: LineId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

/// Partial update for a stop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopChanges {
    pub line_id: Option<LineId>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stop_order: Option<i32>,
}

impl StopChanges {
    pub fn is_empty(&self) -> bool {
        self.line_id.is_none()
            && self.name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.stop_order.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_value_roundtrip() {
        let id = UserId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_ids_are_hashable() {
        let mut set = std::collections::HashSet::new();
        set.insert(CategoryId::new(1));
        set.insert(CategoryId::new(2));
        set.insert(CategoryId::new(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_default_service_window() {
        assert_eq!(default_start_time(), NaiveTime::from_hms_opt(5, 0, 0).unwrap());
        assert_eq!(default_end_time(), NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_changesets() {
        assert!(UserChanges::default().is_empty());
        assert!(CategoryChanges::default().is_empty());
        assert!(TransportLineChanges::default().is_empty());
        assert!(StopChanges::default().is_empty());

        let changes = UserChanges {
            email: Some("a@b.c".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
