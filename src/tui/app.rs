use ratatui::crossterm::event::{ KeyCode, KeyEvent, KeyEventKind, KeyModifiers };

use crate::app::refresher::RefreshState;
use crate::display::{ DisplaySettings, SettingsChange };

/// What a key press asks the UI to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    Change(SettingsChange),
}

/// UI-owned state: the latest published frame plus the user's current settings
pub struct TuiApp {
    pub symbol: String,
    pub source: String,
    pub settings: DisplaySettings,
    pub state: RefreshState,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(symbol: &str, source: &str, settings: DisplaySettings) -> Self {
        Self {
            symbol: symbol.to_string(),
            source: source.to_string(),
            settings,
            state: RefreshState { settings, ..RefreshState::default() },
            should_quit: false,
        }
    }

    /// Apply an action; returns true when the settings changed and must be republished
    pub fn handle(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => {
                self.should_quit = true;
                false
            }
            Action::Refresh => false,
            Action::Change(change) => self.settings.apply(change),
        }
    }
}

pub fn key_action(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char(']') => Action::Change(SettingsChange::CoarserStep),
        KeyCode::Char('[') => Action::Change(SettingsChange::FinerStep),
        KeyCode::Char('p') => Action::Change(SettingsChange::MorePricePrecision),
        KeyCode::Char('P') => Action::Change(SettingsChange::LessPricePrecision),
        KeyCode::Char('o') => Action::Change(SettingsChange::MoreQuantityPrecision),
        KeyCode::Char('O') => Action::Change(SettingsChange::LessQuantityPrecision),
        KeyCode::Char('+') | KeyCode::Char('=') => Action::Change(SettingsChange::MoreLevels),
        KeyCode::Char('-') => Action::Change(SettingsChange::FewerLevels),
        _ => {
            return None;
        }
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_keys_to_actions() {
        assert_eq!(key_action(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(
            key_action(press(KeyCode::Char(']'))),
            Some(Action::Change(SettingsChange::CoarserStep))
        );
        assert_eq!(key_action(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn handle_reports_settings_changes() {
        let mut app = TuiApp::new("ETHUSDT", "Synthetic", DisplaySettings::default());
        assert!(app.handle(Action::Change(SettingsChange::CoarserStep)));
        assert!(app.handle(Action::Change(SettingsChange::LessPricePrecision)));
        assert_eq!(app.settings.price_precision.digits(), 1);
        assert!(!app.handle(Action::Refresh));
        assert!(!app.should_quit);
        app.handle(Action::Quit);
        assert!(app.should_quit);
    }
}
