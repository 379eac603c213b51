//! Inventory management service: employees, company assets and who holds them

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod validation;
pub mod views;

pub use routes::create_router;
pub use state::AppState;
