pub mod config;
pub mod endpoints;
pub mod platform;
pub mod protocol;

pub use config::Config;
pub use endpoints::{Endpoint, Method};
pub use protocol::Outcome;
