pub mod config;
pub mod data;
pub mod translate;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
