//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use trailmap_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match trailmap_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("trailmap: {err}");
            std::process::exit(1);
        }
    }
}
