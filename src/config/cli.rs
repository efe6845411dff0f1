//! Command-line argument parsing

/// Command-line arguments for the background media server
#[derive(argh::FromArgs, Debug, Clone)]
/// Random Background Media
///
/// Serves a portfolio page background of randomly surfacing project media.
pub struct CliArgs {
    #[argh(option, short = 'p', default = "3000")]
    /// port of the web server. Default: 3000
    pub port: u16,

    #[argh(option, short = 'i', default = "String::from(\"127.0.0.1\")")]
    /// network interface to bind, e.g. "0.0.0.0" or "localhost". Default: 127.0.0.1
    pub interface: String,

    #[argh(option, short = 'c')]
    /// path of the catalog JSON file. Default: built-in catalog
    pub catalog: Option<String>,

    #[argh(option, short = 'm', default = "String::from(\"media\")")]
    /// directory served under /media and used for relative media URLs. Default: media
    pub media_dir: String,

    #[argh(switch)]
    /// start with reduced motion, the background stays empty. Default: false
    pub reduced_motion: bool,

    #[argh(option, default = "768.0")]
    /// maximum width of the page content column in pixels. Default: 768
    pub content_max_width: f32,

    #[argh(option, default = "16.0")]
    /// horizontal padding around the content column in pixels. Default: 16
    pub content_padding: f32,

    #[argh(option, default = "80.0")]
    /// distance from the top of the page to the content column. Default: 80
    pub content_top: f32,

    #[argh(option, default = "2000")]
    /// delay before the first item appears in milliseconds. Default: 2000
    pub initial_delay: u64,

    #[argh(option, default = "4000")]
    /// shortest time between two transitions in milliseconds. Default: 4000
    pub min_interval: u64,

    #[argh(option, default = "10000")]
    /// longest time between two transitions in milliseconds. Default: 10000
    pub max_interval: u64,

    #[argh(option, default = "2000")]
    /// delay before the remaining catalog media is fetched in milliseconds. Default: 2000
    pub warm_up_delay: u64,

    #[argh(option, default = "60")]
    /// frames per second of the render loop (1-240). Default: 60
    pub frame_rate: u32,

    #[argh(option)]
    /// seed for all random choices, for reproducible runs. Default: random
    pub seed: Option<u64>,
}

impl CliArgs {
    /// Parse CLI arguments
    pub fn parse() -> Self {
        argh::from_env()
    }
}
