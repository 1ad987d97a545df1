//! Everything that talks to the external ride-booking API.

pub mod cache;
pub mod client;
pub mod payloads;

pub use client::BackendClient;
