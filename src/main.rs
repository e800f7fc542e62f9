use clap::Parser;
use log::error;

use nodetrix_order::cli::{run, Cli};
use nodetrix_order::utils::activate_logging;

fn main() {
    let cli = Cli::parse();
    activate_logging(cli.verbose.log_level_filter());

    match run(cli) {
        Ok(order) => println!("{order}"),
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
