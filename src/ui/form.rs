use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, Focus};
use crate::network::types::RegistrationState;
use crate::ui::theme::{ICON_LOCK, ICON_WIFI};

/// Rows taken by the form, borders included
pub const HEIGHT: u16 = 7;

/// Render the SSID/password fields and the Connect + preset buttons
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;

    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(format!(" {ICON_WIFI}"), t.style_accent()),
            Span::styled("WiFi Connect ", t.style_accent_bold()),
        ]))
        .borders(Borders::ALL)
        .border_type(t.border_type)
        .border_style(t.style_border(false));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Inputs
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Buttons
        ])
        .split(inner);

    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    app.ssid_input
        .render(f, fields[0], t, app.focus == Focus::Ssid);
    app.password_input
        .render(f, fields[1], t, app.focus == Focus::Password);

    f.render_widget(Paragraph::new(button_line(app)), rows[2]);
}

fn button_line(app: &App) -> Line<'static> {
    let t = &app.theme;
    let mut spans = vec![Span::raw(" ")];

    spans.push(button(
        format!("{ICON_LOCK}Connect"),
        app.focus == Focus::Connect,
        app,
    ));

    if !app.preset_keys().is_empty() {
        spans.push(Span::styled("   presets: ", t.style_dim()));
    }
    for (idx, key) in app.preset_keys().iter().enumerate() {
        let label = match app.manager.state(key) {
            RegistrationState::Registered => format!("● {key}"),
            RegistrationState::Unregistered => key.clone(),
        };
        spans.push(button(label, app.focus == Focus::Preset(idx), app));
        spans.push(Span::raw(" "));
    }

    Line::from(spans)
}

fn button(label: String, focused: bool, app: &App) -> Span<'static> {
    let style = if focused {
        app.theme.style_selected()
    } else {
        app.theme.style_accent()
    };
    Span::styled(format!("[ {label} ]"), style)
}
