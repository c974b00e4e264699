//! HTTP server

pub mod http;

pub use http::{client_ip, run, AppState, BoxBody, MAX_BODY_BYTES};
