pub mod builder;
pub mod cli;
pub mod config;
pub mod country;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod profile;
pub mod scheduler;
pub mod service;
pub mod source;
pub mod store;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
