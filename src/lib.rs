//! tinylink - a URL shortener service
//!
//! Maps URLs to short codes, resolves codes through a cache-aside read path
//! and records click analytics.
//!
//! # Architecture
//! - `services`: `ShortenerService` (code generation with collision retry,
//!   cache-aside resolution, click recording), background task pool, health checks
//! - `storage`: `UrlStore` / `AnalyticsStore` backends (SeaORM, in-memory)
//! - `cache`: `UrlCache` backends (moka, Redis, disabled)
//! - `analytics`: click models, aggregation helpers and device detection
//! - `api`: HTTP handlers, validation and middleware
//! - `config`: configuration loading and CLI arguments
//! - `runtime`: startup wiring, server mode and graceful shutdown
//! - `system`: logging

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
