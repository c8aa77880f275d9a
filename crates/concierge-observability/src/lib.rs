//! Concierge Observability
//!
//! 基于 tracing 的统一日志初始化与 span 工具。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LoggingConfig};
pub use error::{ObservabilityError, Result};
pub use logging::{create_session_span, create_turn_span, LogManager};
