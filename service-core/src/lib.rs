//! service-core: Shared infrastructure for the billing services.
//!
//! Layered configuration, the HTTP error envelope, request-id and metrics
//! middleware, and tracing set-up.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
