//! Test Trend Server library.
//!
//! Ingests JSON test reports produced by CI pipelines, keeps an ordered
//! in-memory history of runs, and derives run-level and per-suite trend
//! series from it. The HTTP layer in [`api`] is a thin shell over
//! [`services`].

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
