use std::sync::Arc;
use std::time::Duration;
use chrono::{ DateTime, Utc };
use tokio::sync::{ mpsc, watch };
use tokio::task::JoinHandle;
use tokio::time::{ self, MissedTickBehavior };
use tracing::{ debug, info, warn };

use crate::display::{ DepthView, DisplaySettings };
use crate::error::FetchError;
use crate::exchange::client::DepthSource;
use crate::models::snapshot::Snapshot;

/// Everything the presentation layer needs to draw the latest frame
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    /// Last successfully assembled ladder; kept across failed ticks
    pub view: Option<DepthView>,
    /// Settings the view was built with
    pub settings: DisplaySettings,
    pub last_update_id: Option<u64>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub ticks: u64,
    pub failures: u64,
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub symbol: String,
    pub depth_limit: u16,
    pub interval: Duration,
    pub request_timeout: Duration,
}

/// Tick-driven fetch, aggregate and assemble pass.
///
/// Fetches are awaited inside the loop, so ticks never overlap: a tick that comes due while a
/// fetch is still running is skipped, not queued.
pub struct Refresher {
    source: Arc<dyn DepthSource>,
    config: RefreshConfig,
    settings: DisplaySettings,
    last_snapshot: Option<Snapshot>,
    state_tx: watch::Sender<RefreshState>,
}

/// Control side of a spawned refresher
pub struct RefresherHandle {
    pub state: watch::Receiver<RefreshState>,
    pub settings: watch::Sender<DisplaySettings>,
    refresh_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Ask for an out-of-band fetch; ignored when one is already pending
    pub fn refresh_now(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        drop(self.settings);
        drop(self.refresh_tx);
        if let Err(e) = self.task.await {
            warn!("Refresher task ended abnormally: {}", e);
        }
    }
}

impl Refresher {
    pub fn new(
        source: Arc<dyn DepthSource>,
        config: RefreshConfig,
        settings: DisplaySettings
    ) -> (Self, watch::Receiver<RefreshState>) {
        let (state_tx, state_rx) = watch::channel(RefreshState {
            settings,
            ..RefreshState::default()
        });

        (
            Self {
                source,
                config,
                settings,
                last_snapshot: None,
                state_tx,
            },
            state_rx,
        )
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self) -> RefresherHandle {
        let (settings_tx, settings_rx) = watch::channel(self.settings);
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let state = self.state_tx.subscribe();

        let task = tokio::spawn(self.run(settings_rx, refresh_rx));

        RefresherHandle { state, settings: settings_tx, refresh_tx, task }
    }

    /// Runs until the settings sender is dropped
    pub async fn run(
        mut self,
        mut settings_rx: watch::Receiver<DisplaySettings>,
        mut refresh_rx: mpsc::Receiver<()>
    ) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            source = self.source.name(),
            symbol = %self.config.symbol,
            interval = ?self.config.interval,
            "Refresh loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                changed = settings_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let settings = *settings_rx.borrow_and_update();
                    if self.apply_settings(settings) {
                        self.tick().await;
                        interval.reset();
                    }
                }
                Some(()) = refresh_rx.recv() => {
                    self.tick().await;
                    interval.reset();
                }
            }
        }

        info!(symbol = %self.config.symbol, "Refresh loop stopped");
    }

    /// One fetch → aggregate → assemble pass. On failure the previous view is kept.
    pub async fn tick(&mut self) {
        let fetched = time::timeout(
            self.config.request_timeout,
            self.source.fetch_snapshot(&self.config.symbol, self.config.depth_limit)
        ).await.unwrap_or_else(|_| Err(FetchError::Timeout(self.config.request_timeout)));

        match fetched {
            Ok(snapshot) => {
                debug!(
                    last_update_id = snapshot.last_update_id,
                    best_bid = ?snapshot.best_bid(),
                    best_ask = ?snapshot.best_ask(),
                    "Snapshot received"
                );
                self.last_snapshot = Some(snapshot);
                self.rebuild(true);
            }
            Err(e) => {
                warn!(symbol = %self.config.symbol, "Skipping tick, keeping last view: {}", e);
                self.state_tx.send_modify(|state| {
                    state.ticks += 1;
                    state.failures += 1;
                    state.last_error = Some(e.to_string());
                });
            }
        }
    }

    /// Re-aggregate the last snapshot with new settings so the ladder reacts before the
    /// follow-up fetch returns. Returns false when nothing changed.
    pub fn apply_settings(&mut self, settings: DisplaySettings) -> bool {
        if settings == self.settings {
            return false;
        }
        info!(step = %settings.step, levels = settings.levels_to_show, "Display settings changed");
        self.settings = settings;
        self.rebuild(false);
        true
    }

    fn rebuild(&mut self, counts_as_tick: bool) {
        let settings = self.settings;
        let Some(snapshot) = self.last_snapshot.as_ref() else {
            self.state_tx.send_modify(|state| state.settings = settings);
            return;
        };

        let built = DepthView::from_snapshot(snapshot, &settings);
        let update_id = snapshot.last_update_id;
        let fetched_at = snapshot.fetched_at;

        self.state_tx.send_modify(|state| {
            if counts_as_tick {
                state.ticks += 1;
            }
            match built {
                Ok(view) => {
                    state.view = Some(view);
                    state.settings = settings;
                    state.last_update_id = Some(update_id);
                    state.last_success_at = Some(fetched_at);
                    state.last_error = None;
                }
                Err(e) => {
                    warn!("Aggregation failed, keeping last view: {}", e);
                    state.failures += 1;
                    state.last_error = Some(e.to_string());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;

    use crate::aggregation::AggregationStep;
    use crate::models::level::Level;

    /// Replays a fixed script of fetch outcomes, then fails forever
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Snapshot, FetchError>>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Snapshot, FetchError>>) -> Self {
            Self { script: Mutex::new(script.into()), delay: Duration::ZERO }
        }
    }

    #[async_trait]
    impl DepthSource for ScriptedSource {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn fetch_snapshot(&self, _symbol: &str, _limit: u16) -> Result<Snapshot, FetchError> {
            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
            self.script
                .lock().await
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Request("script exhausted".to_string())))
        }

        async fn is_operational(&self) -> bool {
            true
        }
    }

    fn snapshot(update_id: u64) -> Snapshot {
        Snapshot {
            symbol: "ETHUSDT".to_string(),
            last_update_id: update_id,
            bids: vec![Level::new(dec!(100.03), dec!(2)), Level::new(dec!(100.07), dec!(3))],
            asks: vec![Level::new(dec!(100.11), dec!(1)), Level::new(dec!(100.26), dec!(4))],
            fetched_at: Utc::now(),
        }
    }

    fn config(request_timeout: Duration) -> RefreshConfig {
        RefreshConfig {
            symbol: "ETHUSDT".to_string(),
            depth_limit: 100,
            interval: Duration::from_millis(20),
            request_timeout,
        }
    }

    #[tokio::test]
    async fn failed_tick_keeps_last_view() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(snapshot(1)), Err(FetchError::Request("boom".to_string()))])
        );
        let (mut refresher, state) = Refresher::new(
            source,
            config(Duration::from_secs(1)),
            DisplaySettings::default()
        );

        refresher.tick().await;
        let first = state.borrow().view.clone().unwrap();
        assert_eq!(state.borrow().last_update_id, Some(1));

        refresher.tick().await;
        let current = state.borrow().clone();
        assert_eq!(current.view, Some(first));
        assert_eq!(current.ticks, 2);
        assert_eq!(current.failures, 1);
        assert!(current.last_error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let mut source = ScriptedSource::new(vec![Ok(snapshot(1))]);
        source.delay = Duration::from_millis(200);
        let (mut refresher, state) = Refresher::new(
            Arc::new(source),
            config(Duration::from_millis(10)),
            DisplaySettings::default()
        );

        refresher.tick().await;
        let current = state.borrow().clone();
        assert!(current.view.is_none());
        assert!(current.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn settings_change_reaggregates_last_snapshot() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(1))]));
        let (mut refresher, state) = Refresher::new(
            source,
            config(Duration::from_secs(1)),
            DisplaySettings::default()
        );

        refresher.tick().await;
        assert_eq!(state.borrow().view.as_ref().unwrap().bids.len(), 2);

        let coarse = DisplaySettings {
            step: AggregationStep::new(dec!(0.1)).unwrap(),
            ..DisplaySettings::default()
        };
        assert!(refresher.apply_settings(coarse));
        assert!(!refresher.apply_settings(coarse));

        let current = state.borrow().clone();
        let view = current.view.unwrap();
        assert_eq!(current.settings, coarse);
        assert_eq!(view.bids.len(), 1);
        assert_eq!(view.bids[0].price, dec!(100.0));
        assert_eq!(view.bids[0].quantity, dec!(5));
        assert_eq!(view.asks.len(), 2);
        assert_eq!(current.ticks, 1);
    }

    #[tokio::test]
    async fn spawned_loop_publishes_and_stops() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(1)), Ok(snapshot(2))]));
        let (refresher, _) = Refresher::new(
            source,
            config(Duration::from_secs(1)),
            DisplaySettings::default()
        );
        let mut handle = refresher.spawn();

        time::timeout(Duration::from_secs(2), async {
            loop {
                handle.state.changed().await.unwrap();
                if handle.state.borrow().last_update_id.is_some() {
                    break;
                }
            }
        }).await.unwrap();

        let finer = DisplaySettings { levels_to_show: 1, ..DisplaySettings::default() };
        handle.settings.send(finer).unwrap();

        time::timeout(Duration::from_secs(2), async {
            loop {
                if handle.state.borrow().settings == finer {
                    break;
                }
                handle.state.changed().await.unwrap();
            }
        }).await.unwrap();
        assert_eq!(handle.state.borrow().view.as_ref().unwrap().bids.len(), 1);

        time::timeout(Duration::from_secs(2), handle.shutdown()).await.unwrap();
    }

    #[tokio::test]
    async fn settings_change_fetches_without_waiting_for_the_interval() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(1)), Ok(snapshot(2))]));
        let config = RefreshConfig {
            interval: Duration::from_secs(60),
            ..config(Duration::from_secs(1))
        };
        let (refresher, _) = Refresher::new(source, config, DisplaySettings::default());
        let mut handle = refresher.spawn();

        // the first interval tick fires at once, the next one only after a minute
        time::timeout(Duration::from_secs(2), async {
            while handle.state.borrow().last_update_id != Some(1) {
                handle.state.changed().await.unwrap();
            }
        }).await.unwrap();

        let coarse = DisplaySettings {
            step: AggregationStep::new(dec!(0.1)).unwrap(),
            ..DisplaySettings::default()
        };
        handle.settings.send(coarse).unwrap();

        time::timeout(Duration::from_secs(2), async {
            while handle.state.borrow().last_update_id != Some(2) {
                handle.state.changed().await.unwrap();
            }
        }).await.unwrap();

        let current = handle.state.borrow().clone();
        assert_eq!(current.settings, coarse);
        assert_eq!(current.ticks, 2);
        assert_eq!(current.view.unwrap().bids.len(), 1);

        time::timeout(Duration::from_secs(2), handle.shutdown()).await.unwrap();
    }
}
