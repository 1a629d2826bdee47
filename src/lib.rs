pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod password;
pub mod repo;
pub mod routes;
pub mod token;

// Re-export commonly used items for tests / external users
pub use config::AppConfig;
pub use middleware::RequestTimeout;
pub use routes::{config, AppState};
