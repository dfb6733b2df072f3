pub mod app;
pub mod auth;
pub mod config;
pub mod defaults;
pub mod errors;
pub mod export;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod records;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod upload;

pub use app::router;
pub use config::Config;
pub use state::AppState;
