mod app;
mod commands;
mod effects;
mod logging;
mod presenter;

pub use app::run_app;
pub use logging::LogDestination;
