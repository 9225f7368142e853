//! Thread-safe key server facade

mod builder;
mod key_server;

pub use builder::KeyServerBuilder;
pub use key_server::KeyServer;
