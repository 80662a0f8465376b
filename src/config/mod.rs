//! Application configuration
//!
//! Loaded once by the binary and handed to constructors; the core never
//! reads files or the environment itself.

mod structs;

pub use structs::*;
