//! Background configuration structure and methods

use super::{CliArgs, EnvVars};
use crate::background::EngineSettings;
use crate::models::viewport::ContentLayout;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration structure that stores all background settings
#[derive(Clone, Debug)]
pub struct BackgroundConfig {
    // Web server configuration
    pub port: u16,
    pub interface: String,

    pub catalog_path: Option<PathBuf>,
    pub media_dir: PathBuf,
    pub reduced_motion: bool,
    pub layout: ContentLayout,

    pub initial_delay_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub warm_up_delay_ms: u64,
    pub frame_rate: u32,
    pub seed: Option<u64>,
}

impl BackgroundConfig {
    /// Create a new configuration by combining CLI arguments and environment variables
    pub fn new(cli_args: CliArgs, env_vars: EnvVars) -> Self {
        let port = env_vars.port.unwrap_or(cli_args.port);

        let interface = env_vars
            .interface
            .unwrap_or(cli_args.interface)
            .to_lowercase();
        let interface = if interface == "localhost" {
            "127.0.0.1".to_string()
        } else {
            interface
        };

        let catalog_path = env_vars.catalog.or(cli_args.catalog).map(PathBuf::from);
        let media_dir = PathBuf::from(env_vars.media_dir.unwrap_or(cli_args.media_dir));
        let reduced_motion = env_vars.reduced_motion.unwrap_or(cli_args.reduced_motion);

        let layout = ContentLayout {
            max_width: env_vars
                .content_max_width
                .unwrap_or(cli_args.content_max_width),
            padding: env_vars.content_padding.unwrap_or(cli_args.content_padding),
            top: env_vars.content_top.unwrap_or(cli_args.content_top),
        };

        Self {
            port,
            interface,
            catalog_path,
            media_dir,
            reduced_motion,
            layout,
            initial_delay_ms: env_vars.initial_delay.unwrap_or(cli_args.initial_delay),
            min_interval_ms: env_vars.min_interval.unwrap_or(cli_args.min_interval),
            max_interval_ms: env_vars.max_interval.unwrap_or(cli_args.max_interval),
            warm_up_delay_ms: env_vars.warm_up_delay.unwrap_or(cli_args.warm_up_delay),
            frame_rate: env_vars.frame_rate.unwrap_or(cli_args.frame_rate),
            seed: env_vars.seed.or(cli_args.seed),
        }
    }

    /// Timing and layout handed to every engine run
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            layout: self.layout,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            min_interval_ms: self.min_interval_ms,
            max_interval_ms: self.max_interval_ms,
            warm_up_delay: Duration::from_millis(self.warm_up_delay_ms),
            frame_interval: Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64),
            seed: self.seed,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.min_interval_ms == 0 {
            errors.push("Minimum interval must be greater than 0".to_string());
        }

        if self.min_interval_ms > self.max_interval_ms {
            errors.push(format!(
                "Minimum interval ({} ms) must not exceed maximum interval ({} ms)",
                self.min_interval_ms, self.max_interval_ms
            ));
        }

        if self.frame_rate == 0 || self.frame_rate > 240 {
            errors.push("Frame rate must be between 1 and 240".to_string());
        }

        if self.layout.max_width.is_nan() || self.layout.max_width <= 0.0 {
            errors.push("Content max width must be greater than 0".to_string());
        }

        if self.layout.padding < 0.0 || self.layout.top < 0.0 {
            errors.push("Content padding and top offset must not be negative".to_string());
        }

        if let Err(e) = self.interface.parse::<std::net::IpAddr>() {
            errors.push(format!(
                "Invalid network interface address '{}': {}. Use a valid IP address or 'localhost'",
                self.interface, e
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
