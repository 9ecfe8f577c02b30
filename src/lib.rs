pub mod app;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod delivery;
pub mod highlight;
pub mod message;
pub mod resolver;
pub mod search;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
