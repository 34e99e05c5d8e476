//! Application wiring: settings, tracing and the HTTP server lifecycle

pub mod app;
pub mod telemetry;

pub use app::Application;
