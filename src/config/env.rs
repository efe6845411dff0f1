//! Environment variable handling

/// Environment variables for the background configuration
#[derive(Debug, Default, Clone)]
pub struct EnvVars {
    pub port: Option<u16>,
    pub interface: Option<String>,
    pub catalog: Option<String>,
    pub media_dir: Option<String>,
    pub reduced_motion: Option<bool>,
    pub content_max_width: Option<f32>,
    pub content_padding: Option<f32>,
    pub content_top: Option<f32>,
    pub initial_delay: Option<u64>,
    pub min_interval: Option<u64>,
    pub max_interval: Option<u64>,
    pub warm_up_delay: Option<u64>,
    pub frame_rate: Option<u32>,
    pub seed: Option<u64>,
}

// Accepts true/false as well as 1/0
fn parse_flag(value: &str) -> Option<bool> {
    if let Ok(enabled) = value.parse::<bool>() {
        Some(enabled)
    } else if let Ok(enabled) = value.parse::<u8>() {
        Some(enabled != 0)
    } else {
        None
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|value| value.parse().ok())
}

/// Load configuration from environment variables
pub fn load_env_vars() -> EnvVars {
    load_from(|name| std::env::var(name).ok())
}

fn load_from(lookup: impl Fn(&str) -> Option<String>) -> EnvVars {
    let mut env = EnvVars::default();

    // Web server settings
    env.port = parsed(&lookup, "BG_PORT");
    env.interface = lookup("BG_INTERFACE");

    // Content sources
    env.catalog = lookup("BG_CATALOG");
    env.media_dir = lookup("BG_MEDIA_DIR");

    if let Some(value) = lookup("BG_REDUCED_MOTION") {
        env.reduced_motion = parse_flag(&value);
    }

    // Layout of the page content column
    env.content_max_width = parsed(&lookup, "BG_CONTENT_MAX_WIDTH");
    env.content_padding = parsed(&lookup, "BG_CONTENT_PADDING");
    env.content_top = parsed(&lookup, "BG_CONTENT_TOP");

    // Timing
    env.initial_delay = parsed(&lookup, "BG_INITIAL_DELAY_MS");
    env.min_interval = parsed(&lookup, "BG_MIN_INTERVAL_MS");
    env.max_interval = parsed(&lookup, "BG_MAX_INTERVAL_MS");
    env.warm_up_delay = parsed(&lookup, "BG_WARM_UP_DELAY_MS");
    env.frame_rate = parsed(&lookup, "BG_FRAME_RATE");
    env.seed = parsed(&lookup, "BG_SEED");

    env
}
