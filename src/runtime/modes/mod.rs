//! Mode routing
//!
//! Only the interactive CLI mode exists today; it is gated behind the `cli`
//! feature so the library can be used without terminal code.

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::{CliExit, run_cli};
