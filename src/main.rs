use clap::Parser;
use pulseboard::arguments::Arguments;
use pulseboard::logger::{self, LogTag};
use pulseboard::{config, run, shutdown};

#[tokio::main]
async fn main() {
    let args = Arguments::parse();

    logger::init();

    if let Err(e) = config::load_config_from_path(args.config.as_deref()) {
        logger::error(LogTag::Config, &format!("Failed to load config: {}", e));
        std::process::exit(1);
    }

    if let Err(e) = shutdown::install_ctrlc_handler() {
        logger::warning(
            LogTag::System,
            &format!("Could not install Ctrl-C handler: {}", e),
        );
    }

    if let Err(e) = run::start(&args).await {
        logger::error(LogTag::System, &format!("Fatal: {}", e));
        std::process::exit(1);
    }
}
