pub mod config;
pub mod geo;
pub mod location;
pub mod server;
