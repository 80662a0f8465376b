//! quotalink - user-scoped URL shortener core
//!
//! Short codes are deterministic per owner and URL, links expire after a
//! fixed window and stop resolving once their click quota is used up. All
//! state lives in memory.
//!
//! # Features
//! - **cli**: interactive shell front end (default)
//!
//! # Architecture
//! - `storage`: link and user records, the indexed link store, the user directory
//! - `services`: code generation, the link registry, notifications, the expiry sweeper
//! - `config`: configuration loading
//! - `interfaces`: the interactive CLI
//! - `runtime`: startup wiring, shutdown, execution modes
//! - `system`: logging and panic handling

pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
