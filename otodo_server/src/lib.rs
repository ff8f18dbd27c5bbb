//! HTTP server for the otodo session and delegated-login core.

pub mod api;
pub mod config;
pub mod logging;
