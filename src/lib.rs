//! Mabratech API - backend for the PT Mabra Technology Solutions website
//!
//! Serves the marketing site's catalog content, takes contact form
//! submissions and collects page-view analytics, all stored in MongoDB.
//!
//! ## Components
//!
//! - **Store**: generic document access with MongoDB and in-memory backends
//! - **Validation**: field rules for submitted entities
//! - **Content**: catalog listings with built-in fallback data
//! - **Contacts**: submission pipeline and administration
//! - **Analytics**: event recording and the activity dashboard
//! - **Worker**: notification and tracking off the request path

pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod validation;
pub mod worker;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
