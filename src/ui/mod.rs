pub mod components;
pub mod form;
pub mod log_view;
pub mod theme;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::ui::theme::Theme;

/// Render the full screen: form + log + status bar, then the toast overlay
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(form::HEIGHT), // Credential form + buttons
            Constraint::Min(3),               // Event log
            Constraint::Length(1),            // Status bar
        ])
        .split(f.area());

    form::render(f, app, chunks[0]);
    log_view::render(f, app, chunks[1]);
    components::status_bar::render(f, app, &app.theme, chunks[2]);

    if let Some(ref msg) = app.toast_message {
        render_toast(f, msg, app.toast_is_error, &app.theme);
    }
}

/// Render a temporary toast notification at the top-right
fn render_toast(f: &mut Frame, message: &str, is_error: bool, theme: &Theme) {
    let area = f.area();
    let width = (message.chars().count() as u16 + 6).min(area.width.saturating_sub(4));
    let x = area.width.saturating_sub(width + 2);
    let toast_area = Rect::new(x, 1, width, 3).intersection(area);

    f.render_widget(Clear, toast_area);

    let color = if is_error { theme.error } else { theme.success };
    let icon = if is_error { " ✗ " } else { " ✓ " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(theme.style_border(false).fg(color));

    let text = Paragraph::new(Line::from(vec![
        Span::styled(icon, theme.style_default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(message, theme.style_default()),
    ]))
    .block(block);

    f.render_widget(text, toast_area);
}

