use std::sync::Arc;

use crate::{
    app::{ check_operational, refresher::Refresher, runtime },
    config::Config,
    exchange::client::DepthSource,
    tui::{ app::TuiApp, run::run_tui },
};
use anyhow::{ Context, Result };
use tracing::info;

pub fn run_tui_mode(config: Config, source: Arc<dyn DepthSource>) -> Result<()> {
    let rt = runtime()?;

    rt.block_on(async {
        // Not fatal: the ladder shows the fetch error and keeps polling
        check_operational(source.as_ref()).await;

        let settings = config.display_settings();
        let (refresher, _) = Refresher::new(source.clone(), config.refresh_config(), settings);
        let handle = refresher.spawn();

        let app = TuiApp::new(&config.symbol, source.name(), settings);
        run_tui(handle, app).await.context("Terminal UI failed")
    })?;

    info!("Depth ladder stopped");
    Ok(())
}
