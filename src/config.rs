// Command line / environment configuration.

use clap::Parser;
use reqwest::Url;
use std::time::Duration;

/// Fetch a captioned cat picture and upload it to Yandex.Disk together with
/// a small JSON info file. Values that are not given on the command line
/// are asked for interactively.
#[derive(Parser)]
#[command(name = "catdisk", version, about)]
pub struct Cli {
    /// Text the cat should say
    #[arg(long)]
    pub caption: Option<String>,

    /// Destination folder on the disk
    #[arg(long)]
    pub folder: Option<String>,

    /// OAuth token for the disk API
    #[arg(long, env = "YANDEX_DISK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base url of the cat picture service
    #[arg(long, env = "CATAAS_URL", default_value = "https://cataas.com")]
    pub image_host: Url,

    /// Base url of the disk REST API
    #[arg(long, env = "YANDEX_DISK_API_URL", default_value = "https://cloud-api.yandex.net")]
    pub disk_api: Url,

    /// Timeout applied to every HTTP request, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Log debug output of this tool to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default log filter, used when `RUST_LOG` is not set.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "catdisk_cli=debug,warn"
        } else {
            "warn"
        }
    }
}
