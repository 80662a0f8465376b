//! Service layer for business logic
//!
//! Front ends (the interactive CLI, tests) only talk to these types; the
//! storage layer stays behind them.

pub mod code_generator;
pub mod expiry_sweeper;
pub mod link_service;
pub mod notification;

pub use code_generator::{CodeStrategy, ShortCodeGenerator};
pub use expiry_sweeper::{ExpirySweeper, SweepReport, SweeperHandle};
pub use link_service::*;
pub use notification::{LinkNotifier, NoopNotifier, TracingNotifier};
