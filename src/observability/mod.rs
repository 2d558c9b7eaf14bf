//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stderr)
//!
//! Consumers:
//!     → Operator terminal (pretty)
//!     → Log aggregation (json)
//! ```

pub mod logging;

pub use logging::init_logging;
