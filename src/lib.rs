pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod forms;
pub mod lifecycle;
pub mod listing;
pub mod location;
pub mod models;
pub mod notify;
pub mod observability;
pub mod preferences;
pub mod session;
pub mod state;
