use clap::Parser;

use webserv::config::{cli::Args, display::display_config, Config};
use webserv::error::Result;
use webserv::server::Server;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args)?;
    display_config(&config);

    let mut server = Server::new(config)?;
    server.run()
}
