//! # Transit Catalog Backend
//!
//! Backend service for a public-transit catalog: categories, transport
//! lines, and stops, plus the user accounts that manage them. The service
//! exposes a REST API via Axum with bearer-token authentication.
//!
//! ## Features
//!
//! - **Catalog CRUD**: Categories, lines, and stops with uniqueness and
//!   referential checks at write time
//! - **Accounts**: User registration with digest-stored passwords
//! - **Auth**: Signed, time-limited bearer tokens
//! - **Storage backends**: PostgreSQL (Diesel) or in-memory, behind a
//!   repository trait
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain entities and changesets
//! - [`auth`]: Password hashing, credential verification, token service
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod auth;
pub mod db;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
