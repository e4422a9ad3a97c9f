//! Core domain types for Herogate.

pub mod app;
pub mod log;

// Re-exports
pub use app::{validate_app_name, AppInfo, Application, Container, LifecycleState, StackStatus};
pub use log::{LogEntry, LogFilter, Process, HEROGATE_SOURCE};
