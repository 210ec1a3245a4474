pub mod admin_handlers;
pub mod app;
pub mod config;
pub mod metrics;
pub mod password;
pub mod session_handlers;
pub mod store;

pub use app::{build_router, AppState};
