//! linkshrink - a URL shortener with rolling visit statistics.
//!
//! The core lives in [`services`]: [`services::SlugGenerator`] and
//! [`services::Shortener`] create collision-free slugs, and
//! [`services::VisitAggregator`] records visits and computes windowed counts.
//! Both work against the [`store::Store`] trait; everything else is the HTTP
//! and CLI plumbing around them.

pub mod admin;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod middleware_impls;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
