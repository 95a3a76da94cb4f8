use std::io::{ self, stdout };
use std::thread;
use std::time::Duration;
use ratatui::{ Terminal, backend::CrosstermBackend };
use ratatui::crossterm::{ terminal, execute };
use ratatui::crossterm::event::{ self, Event, KeyEvent };
use tokio::sync::mpsc;
use tracing::{ debug, warn };

use crate::app::refresher::RefresherHandle;
use crate::tui::app::{ key_action, Action, TuiApp };
use crate::tui::ui::draw;

/// Drive the terminal until the user quits. The refresher owns fetching; this loop only
/// forwards setting changes and redraws whenever a new frame is published.
pub async fn run_tui(mut handle: RefresherHandle, mut app: TuiApp) -> anyhow::Result<()> {
    let (key_tx, mut key_rx) = mpsc::channel::<KeyEvent>(64);
    let input = spawn_input_reader(key_tx)?;

    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let res: anyhow::Result<()> = async {
        loop {
            app.state = handle.state.borrow_and_update().clone();
            terminal.draw(|f| draw(f, &app))?;

            tokio::select! {
                key = key_rx.recv() => {
                    let Some(key) = key else {
                        break;
                    };
                    let Some(action) = key_action(key) else {
                        continue;
                    };
                    debug!(?action, "Key action");
                    if action == Action::Refresh {
                        handle.refresh_now();
                    }
                    if app.handle(action) {
                        handle.settings.send_replace(app.settings);
                    }
                    if app.should_quit {
                        break;
                    }
                }
                changed = handle.state.changed() => {
                    if changed.is_err() {
                        warn!("Refresher stopped unexpectedly");
                        break;
                    }
                }
            }
        }
        Ok(())
    }.await;

    terminal::disable_raw_mode()?;
    execute!(stdout(), terminal::LeaveAlternateScreen)?;

    // Dropping the receiver tells the input thread to exit
    drop(key_rx);
    handle.shutdown().await;
    if input.join().is_err() {
        warn!("Input thread panicked");
    }

    res
}

/// Blocking crossterm reads live on their own thread so the runtime never stalls
fn spawn_input_reader(tx: mpsc::Sender<KeyEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder
        ::new()
        .name("tui-input".to_string())
        .spawn(move || {
            while !tx.is_closed() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key)) = event::read() {
                            if tx.blocking_send(key).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                }
            }
        })
}
