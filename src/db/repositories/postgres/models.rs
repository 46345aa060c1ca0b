use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{category, stop, transportline, users};
use crate::models::{Category, CategoryId, LineId, Stop, StopId, TransportLine, User, UserId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.user_id),
            username: row.username,
            email: row.email,
            hashed_password: row.hashed_password,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub username: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = category)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub category_id: i64,
    pub name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.category_id),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = category)]
pub struct NewCategoryRow {
    pub name: String,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = category)]
pub struct CategoryChangeset {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transportline)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransportLineRow {
    pub line_id: i64,
    pub name: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<TransportLineRow> for TransportLine {
    fn from(row: TransportLineRow) -> Self {
        TransportLine {
            id: LineId::new(row.line_id),
            name: row.name,
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transportline)]
pub struct NewTransportLineRow {
    pub name: String,
    pub category_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = transportline)]
pub struct TransportLineChangeset {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stop)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StopRow {
    pub stop_id: i64,
    pub line_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

impl From<StopRow> for Stop {
    fn from(row: StopRow) -> Self {
        Stop {
            id: StopId::new(row.stop_id),
            line_id: LineId::new(row.line_id),
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            stop_order: row.stop_order,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stop)]
pub struct NewStopRow {
    pub line_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_order: i32,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = stop)]
pub struct StopChangeset {
    pub line_id: Option<i64>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stop_order: Option<i32>,
}
