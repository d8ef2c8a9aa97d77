//! Gateway between the medical chat client and the medical RAG service.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
