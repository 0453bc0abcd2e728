pub mod auth;
pub mod browse;
pub mod health;
pub mod listings;
