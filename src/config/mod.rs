//! Configuration module that handles all application settings

mod background;
mod cli;
mod env;

pub use background::BackgroundConfig;
pub use cli::CliArgs;
pub use env::{load_env_vars, EnvVars};

/// Initialize configuration from all sources (CLI, environment, etc.)
pub fn init_config() -> BackgroundConfig {
    let cli_args = CliArgs::parse();
    let env_vars = load_env_vars();

    BackgroundConfig::new(cli_args, env_vars)
}
