//! HTTP API: configuration, auth middleware, routes and the response envelope.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
