//! Configuration loading
//!
//! `AppConfig` is loaded once in `main` and handed to constructors explicitly.

mod cli;
mod structs;

pub use cli::{Cli, Commands};
pub use structs::*;
