#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

#[cfg(debug_assertions)]
extern crate better_panic;

use colored::Colorize;
use utils::app_config::AppConfig;
use utils::error::Result;

/// The main entry point of the application.
#[tokio::main]
async fn main() -> Result<()> {
    // Human Panic. Only enabled when *not* debugging.
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    let cli = cli::parse_args();

    // Embedded defaults, then environment, then the user file and flags
    let config_contents = include_str!("resources/default_config.toml");
    AppConfig::init(Some(config_contents))?;
    cli::load_config(&cli)?;

    let guard = utils::logger::setup_logging()?;
    log::debug!("Logging initialized");

    let result = cli::cli_match(cli).await;

    // Flush the async log drains before a possible early exit
    drop(guard);

    if let Err(err) = result {
        eprintln!("{} {}", "error:".red().bold(), err.chain());
        std::process::exit(1);
    }

    Ok(())
}
