//! Application lifecycle
//!
//! - `lifetime`: startup wiring and graceful shutdown
//! - `modes`: execution modes (HTTP server)

pub mod lifetime;
pub mod modes;
