pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, OutputFormat, ProfileColumnArgs};
pub use config::{load_config, StoroptConfig};
