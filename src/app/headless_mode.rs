use std::sync::{ atomic::{ AtomicBool, Ordering }, Arc };
use std::time::Duration;

use crate::{
    app::{ check_operational, refresher::Refresher, runtime },
    config::Config,
    display::DepthView,
    exchange::client::DepthSource,
    utils::console::{ print_banner, print_config, render_ladder },
};
use anyhow::{ anyhow, Context, Result };
use colored::Colorize;
use tracing::{ error, info };

/// Print a fresh ladder to stdout on every tick until Ctrl+C
pub fn run_headless_mode(config: Config, source: Arc<dyn DepthSource>) -> Result<()> {
    print_banner(&config.symbol);
    print_config(&config);

    // Create shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    ctrlc
        ::set_handler(move || {
            info!("Received Ctrl+C, shutting down...");
            shutdown_clone.store(true, Ordering::Relaxed);
        })
        .context("Error setting Ctrl-C handler")?;

    let rt = runtime()?;

    rt.block_on(async {
        check_operational(source.as_ref()).await;

        let settings = config.display_settings();
        let (refresher, _) = Refresher::new(source.clone(), config.refresh_config(), settings);
        let mut handle = refresher.spawn();
        let mut printed_ticks = 0;

        while !shutdown.load(Ordering::Relaxed) {
            // Wake up regularly to notice Ctrl+C
            let changed = tokio::time::timeout(
                Duration::from_millis(200),
                handle.state.changed()
            ).await;
            match changed {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    error!("Refresher stopped unexpectedly");
                    break;
                }
                Err(_) => {
                    continue;
                }
            }

            let state = handle.state.borrow_and_update().clone();
            if state.ticks == printed_ticks {
                continue;
            }
            printed_ticks = state.ticks;

            match (&state.view, &state.last_error) {
                (_, Some(err)) => println!("{} {}", "stale:".yellow(), err),
                (Some(view), None) => println!("{}", render_ladder(&config.symbol, view, &state.settings)),
                (None, None) => {}
            }
        }

        handle.shutdown().await;
    });

    info!("Depth ladder stopped");
    Ok(())
}

/// Fetch a single snapshot, print its ladder and exit
pub fn run_once_mode(config: Config, source: Arc<dyn DepthSource>) -> Result<()> {
    let rt = runtime()?;
    let settings = config.display_settings();

    let snapshot = rt
        .block_on(async {
            tokio::time::timeout(
                config.request_timeout(),
                source.fetch_snapshot(&config.symbol, config.depth_limit)
            ).await
        })
        .map_err(|_| anyhow!("Timed out while fetching {} depth", config.symbol))?
        .with_context(|| format!("Failed to fetch {} depth from {}", config.symbol, source.name()))?;

    let view = DepthView::from_snapshot(&snapshot, &settings).context("Failed to aggregate snapshot")?;
    println!("{}", render_ladder(&config.symbol, &view, &settings));

    Ok(())
}
