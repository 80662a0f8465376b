//! System-level modules
//!
//! Process plumbing that is not part of the link core: logging setup and
//! the panic hook.

pub mod logging;
pub mod panic_handler;

pub use logging::init_logging;
pub use panic_handler::install_panic_hook;
