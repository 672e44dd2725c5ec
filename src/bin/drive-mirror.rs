//! drive-mirror CLI - mirror a cloud-drive folder tree through a browser.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::env;

use drive_mirror::cli::{self, Command};

#[tokio::main]
async fn main() -> drive_mirror::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let command = match cli::parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            cli::print_usage();
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => {
            cli::print_usage();
            Ok(())
        }
        Command::Run(args) => cli::run(args).await,
    }
}
