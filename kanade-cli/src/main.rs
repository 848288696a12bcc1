//! # Kanade Play
//!
//! A command-line front end for the Kanade track mixer.

mod cli;
mod logging;
mod runner;

fn main() {
    logging::init();

    let args = cli::build_cli().get_matches();
    let code = runner::run(&args);

    std::process::exit(code)
}
