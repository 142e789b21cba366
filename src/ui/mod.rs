//! HTTP control module

pub mod handlers;
pub mod server;

pub use server::WebServer;
