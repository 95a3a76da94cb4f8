pub mod headless_mode;
pub mod refresher;
pub mod tui_mode;

use std::time::Duration;
use anyhow::{ Context, Result };
use tokio::runtime::Runtime;
use tracing::{ info, warn };

use crate::exchange::client::DepthSource;

pub const API_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime shared by the long-running modes
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder
        ::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
}

/// Log whether the depth source answers; never fails
pub async fn check_operational(source: &dyn DepthSource) -> bool {
    match tokio::time::timeout(API_TIMEOUT, source.is_operational()).await {
        Ok(true) => {
            info!("✓ {} is operational", source.name());
            true
        }
        _ => {
            warn!("{} is not operational or timed out; polling anyway", source.name());
            false
        }
    }
}
