use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::event::Event;
use crate::log::EventLog;
use crate::network::manager::ConnectionManager;
use crate::network::types::JoinRequest;
use crate::ui::components::text_input::TextInput;
use crate::ui::theme::Theme;

/// How long a toast stays on screen
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Log lines moved per PageUp/PageDown
const LOG_PAGE: usize = 10;

/// Focusable widgets, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Ssid,
    Password,
    Connect,
    Preset(usize),
}

// ── Application State ─────────────────────────────────────────────────

pub struct App {
    pub should_quit: bool,
    pub theme: Theme,
    pub focus: Focus,

    pub ssid_input: TextInput,
    pub password_input: TextInput,

    pub manager: ConnectionManager,
    pub log: EventLog,
    /// Lines scrolled back from the newest entry (0 = follow)
    pub log_scroll: usize,

    preset_keys: Vec<String>,

    // Toast notification
    pub toast_message: Option<String>,
    pub toast_is_error: bool,
    toast_ticks: u16,
    toast_duration_ticks: u16,
}

impl App {
    pub fn new(manager: ConnectionManager, log: EventLog, tick_rate: Duration) -> Self {
        let preset_keys = manager.presets().keys().map(str::to_string).collect();
        let tick_ms = tick_rate.as_millis().max(1);
        let toast_duration_ticks = (TOAST_DURATION.as_millis() / tick_ms).clamp(1, u16::MAX as u128) as u16;

        Self {
            should_quit: false,
            theme: Theme::default(),
            focus: Focus::Ssid,
            ssid_input: TextInput::new("SSID", false),
            password_input: TextInput::new("Password", true),
            manager,
            log,
            log_scroll: 0,
            preset_keys,
            toast_message: None,
            toast_is_error: false,
            toast_ticks: 0,
            toast_duration_ticks,
        }
    }

    pub fn preset_keys(&self) -> &[String] {
        &self.preset_keys
    }

    /// Handle events from the event loop
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Tick => self.tick_toast(),
            Event::Resize(_w, _h) => {
                // ratatui redraws on the next frame
            }
            Event::Association(event) => {
                self.manager.handle_event(event, &mut self.log);
            }
        }
    }

    // ── Key Handling ──────────────────────────────────────────────────

    /// Handle a key event, dispatching to the focused widget
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Global keybindings
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('v') if ctrl => {
                self.password_input.toggle_mask();
                return;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next();
                return;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_prev();
                return;
            }
            KeyCode::PageUp => {
                self.scroll_log_up(LOG_PAGE);
                return;
            }
            KeyCode::PageDown => {
                self.scroll_log_down(LOG_PAGE);
                return;
            }
            KeyCode::Enter => {
                self.activate_focused();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Ssid => Self::edit_field(&mut self.ssid_input, key),
            Focus::Password => Self::edit_field(&mut self.password_input, key),
            Focus::Connect | Focus::Preset(_) => match key.code {
                KeyCode::Left => self.focus_prev(),
                KeyCode::Right => self.focus_next(),
                KeyCode::Char(' ') => self.activate_focused(),
                _ => {}
            },
        }
    }

    fn edit_field(input: &mut TextInput, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                input.insert_char(c)
            }
            KeyCode::Backspace => input.delete_char(),
            KeyCode::Delete => input.delete_forward(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_start(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Ssid, Focus::Password, Focus::Connect];
        order.extend((0..self.preset_keys.len()).map(Focus::Preset));
        order
    }

    fn focus_next(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + 1) % order.len()];
    }

    fn focus_prev(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + order.len() - 1) % order.len()];
    }

    fn activate_focused(&mut self) {
        match self.focus {
            Focus::Ssid | Focus::Password | Focus::Connect => self.connect_typed(),
            Focus::Preset(idx) => {
                if let Some(key) = self.preset_keys.get(idx).cloned() {
                    self.connect(JoinRequest::Preset(key));
                }
            }
        }
    }

    // ── Connect Actions ───────────────────────────────────────────────

    fn connect_typed(&mut self) {
        let request = JoinRequest::Credentials {
            ssid: self.ssid_input.value().to_string(),
            passphrase: self.password_input.value().to_string(),
        };
        self.connect(request);
    }

    pub fn connect(&mut self, request: JoinRequest) {
        self.log
            .append(format!("connect requested ({})", request.describe()));

        match self.manager.join(request, &mut self.log) {
            Ok(()) => {
                self.show_toast("Connection requested", false);
            }
            Err(e) if e.is_rejection() => {
                self.log.append(format!("rejected: {e}"));
                self.show_toast(&e.to_string(), true);
            }
            Err(e) => {
                warn!("Join failed: {}", e);
                self.log.append(format!("request failed: {e}"));
                self.show_toast(&e.to_string(), true);
            }
        }
        self.log_scroll = 0;
    }

    // ── Log Scrolling ─────────────────────────────────────────────────

    fn scroll_log_up(&mut self, lines: usize) {
        let max = self.log.len().saturating_sub(1);
        self.log_scroll = (self.log_scroll + lines).min(max);
    }

    fn scroll_log_down(&mut self, lines: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(lines);
    }

    // ── Toast Management ──────────────────────────────────────────────

    pub fn show_toast(&mut self, message: &str, is_error: bool) {
        self.toast_message = Some(message.to_string());
        self.toast_is_error = is_error;
        self.toast_ticks = self.toast_duration_ticks;
    }

    pub fn tick_toast(&mut self) {
        if self.toast_ticks > 0 {
            self.toast_ticks -= 1;
            if self.toast_ticks == 0 {
                self.toast_message = None;
            }
        }
    }

    /// Release every registration before exit
    pub fn shutdown(&mut self) {
        let released = self.manager.release_all();
        if released > 0 {
            self.log
                .append(format!("released {released} request(s) on exit"));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::PresetTable;
    use crate::network::association::mock::MockAssociation;
    use crate::network::types::{AssociationEvent, AssociationEventKind, RegistrationState};

    fn app() -> (Arc<MockAssociation>, App) {
        let mock = Arc::new(MockAssociation::default());
        let presets =
            PresetTable::from_pairs([("UNS WiFi 5G", "uns1234567!"), ("VITA_S20", "qqqqwwww")])
                .unwrap();
        let manager = ConnectionManager::new(mock.clone(), presets);
        let app = App::new(manager, EventLog::new(100), Duration::from_millis(250));
        (mock, app)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        text.chars().for_each(|c| press(app, KeyCode::Char(c)));
    }

    fn messages(app: &App) -> Vec<String> {
        app.log.entries().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn typed_credentials_connect() {
        let (mock, mut app) = app();
        type_text(&mut app, "home");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "hunter22");
        press(&mut app, KeyCode::Enter);

        let requests = mock.requests.lock().unwrap().clone();
        assert_eq!(requests[0].0, "home");
        assert_eq!(requests[0].1, "hunter22");
        assert_eq!(
            messages(&app),
            vec!["connect requested (typed, ssid: \"home\")", "[home] requested"]
        );
        assert!(!app.toast_is_error);
    }

    #[test]
    fn empty_form_shows_error_toast() {
        let (mock, mut app) = app();
        press(&mut app, KeyCode::Enter);

        assert_eq!(mock.request_count(), 0);
        assert!(app.toast_is_error);
        assert!(messages(&app)[1].starts_with("rejected: Invalid credential"));
    }

    #[test]
    fn preset_buttons_follow_connect_in_tab_order() {
        let (mock, mut app) = app();
        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focus, Focus::Preset(0));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        assert_eq!(mock.request_count(), 1);
        assert_eq!(app.manager.state("UNS WiFi 5G"), RegistrationState::Registered);
        assert!(messages(&app)
            .last()
            .unwrap()
            .contains("already has a registered request"));

        press(&mut app, KeyCode::Right);
        assert_eq!(app.focus, Focus::Preset(1));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(mock.requests.lock().unwrap()[1].1, "qqqqwwww");

        // Wraps back to the SSID field
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Ssid);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Preset(1));
    }

    #[test]
    fn backend_events_reach_the_log() {
        let (_mock, mut app) = app();
        app.connect(JoinRequest::Preset("VITA_S20".into()));
        let handle = app.manager.handle("VITA_S20").unwrap();

        for kind in [AssociationEventKind::Available, AssociationEventKind::Lost] {
            app.handle_event(Event::Association(AssociationEvent {
                handle,
                ssid: "VITA_S20".into(),
                kind,
            }));
        }

        let log = messages(&app);
        assert_eq!(&log[log.len() - 2..], ["[VITA_S20] available", "[VITA_S20] lost"]);
        assert_eq!(app.manager.state("VITA_S20"), RegistrationState::Unregistered);
    }

    #[test]
    fn toast_expires_after_three_seconds() {
        let (_mock, mut app) = app();
        app.show_toast("hello", false);
        for _ in 0..11 {
            app.handle_event(Event::Tick);
        }
        assert!(app.toast_message.is_some());
        app.handle_event(Event::Tick);
        assert!(app.toast_message.is_none());
    }

    #[test]
    fn log_scroll_is_bounded() {
        let (_mock, mut app) = app();
        for i in 0..5 {
            app.log.append(format!("line {i}"));
        }
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.log_scroll, 4);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn ctrl_keys_do_not_type() {
        let (_mock, mut app) = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::CONTROL));
        assert_eq!(app.ssid_input.value(), "");
        assert!(!app.password_input.masked);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn shutdown_releases_requests() {
        let (mock, mut app) = app();
        app.connect(JoinRequest::Preset("VITA_S20".into()));
        app.shutdown();
        assert_eq!(mock.released().len(), 1);
        assert!(app.manager.registered().is_empty());
    }
}
