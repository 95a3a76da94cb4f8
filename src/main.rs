// for the quick data allocation on memory
#[global_allocator]
static ALLOC: rpmalloc::RpMalloc = rpmalloc::RpMalloc;

use std::sync::Arc;

use anyhow::{ Context, Result };
use rust_decimal_macros::dec;

use depth_ladder::app::{ headless_mode, tui_mode };
use depth_ladder::config::Config;
use depth_ladder::exchange::{
    binance::BinanceClient,
    client::DepthSource,
    synthetic::SyntheticDepthSource,
};
use depth_ladder::utils::logging;

// Define command line arguments enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Headless,
    Once,
    Demo,
}

impl Command {
    fn from_arg(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("tui") => Ok(Command::Tui),
            Some("headless") => Ok(Command::Headless),
            Some("once") => Ok(Command::Once),
            Some("demo") => Ok(Command::Demo),
            Some(other) =>
                anyhow::bail!("Unknown command {:?}; expected one of tui, headless, once, demo", other),
        }
    }

    /// The alternate screen must not be shared with console log output
    fn owns_terminal(self) -> bool {
        matches!(self, Command::Tui | Command::Demo)
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let command = Command::from_arg(std::env::args().nth(1).as_deref())?;

    // Load configuration with helpful error messages
    let config = Config::from_env().context(
        "Failed to load configuration from environment. Check the DL_* variables in your .env file."
    )?;

    // Initialize logging system
    logging
        ::init_logging(
            config.log_level,
            config.debug && !command.owns_terminal(),
            &config.log_config
        )
        .context("Failed to initialize logging system")?;

    let source: Arc<dyn DepthSource> = match command {
        Command::Demo => Arc::new(SyntheticDepthSource::new(dec!(2500), dec!(0.01))),
        _ =>
            Arc::new(
                BinanceClient::new(&config.api_url, config.request_timeout()).context(
                    "Failed to create Binance client"
                )?
            ),
    };

    match command {
        Command::Tui | Command::Demo => tui_mode::run_tui_mode(config, source)?,
        Command::Headless => headless_mode::run_headless_mode(config, source)?,
        Command::Once => headless_mode::run_once_mode(config, source)?,
    }

    Ok(())
}
