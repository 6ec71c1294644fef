//! AgriSense alert service: phone-number accounts and crop advisory SMS.
//!
//! Exposed as a library so the router can be driven in tests without a
//! listening socket.

pub mod config;
pub mod core;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
