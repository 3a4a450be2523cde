pub mod cli;
pub mod display;
pub mod types;
pub mod yaml;

pub use cli::Args;
pub use types::Config;

use std::time::Duration;

use crate::error::Result;
use yaml::ConfigOverlay;

impl Config {
    /// Builds a `Config` from parsed CLI args, then applies the
    /// `config.yaml` overlay (if one sits in the current directory) on
    /// top. CLI-derived values are only replaced by fields the overlay
    /// actually sets.
    pub fn load(args: Args) -> Result<Config> {
        let mut config = Config {
            port: args.port,
            idle_timeout: Duration::from_secs(args.conn_timeout),
            webroot: args.webroot,
            directory_listing: !args.no_browse,
            ..Config::default()
        };

        if let Some(overlay) = ConfigOverlay::load(std::path::Path::new("config.yaml"))? {
            if let Some(default_file) = overlay.default_file {
                config.default_file = default_file;
            }
            if let Some(listing) = overlay.directory_listing {
                // An explicit `-b/--no-browse` on the command line always
                // wins over the overlay; the overlay only raises or lowers
                // the default when the flag was not given.
                if !args.no_browse {
                    config.directory_listing = listing;
                }
            }
            if let Some(overrides) = overlay.mime_overrides {
                config.mime_overrides = overrides;
            }
        }

        Ok(config)
    }
}
