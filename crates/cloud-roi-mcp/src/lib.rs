pub mod config;
pub mod protocol;
pub mod server;

mod http;
mod stdio;

pub use config::{BackendKind, ConfigError, ServerConfig, Transport};
pub use server::{RoiServer, ServerError};
