pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod settings;
pub mod state;
pub mod store;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use store::{DocumentStore, JsonStore};
