//! Service layer
//!
//! `ShortenerService` owns the create / resolve / click policies; HTTP handlers
//! only translate requests into calls on it.

pub mod background;
pub mod health;
mod shortener;

pub use background::BackgroundTasks;
pub use health::{HealthProbe, HealthReport, HealthService, ProbeStatus};
pub use shortener::*;
