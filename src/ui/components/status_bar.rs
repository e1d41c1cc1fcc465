use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Focus};
use crate::ui::theme::Theme;

/// Render the bottom status bar with contextual keybindings and registrations
pub fn render(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    // Left: keybindings
    let key_spans: Vec<Span> = get_keybindings(app)
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(format!(" {} ", key), theme.style_key_hint()),
                Span::styled(format!("{} ", desc), theme.style_key_desc()),
                Span::styled("│", theme.style_border(false)),
            ]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(key_spans)), chunks[0]);

    // Right: registered networks
    let registered = app.manager.registered();
    let status = if registered.is_empty() {
        Span::styled(" no requests ", theme.style_dim())
    } else {
        Span::styled(format!(" ● {} ", registered.join(", ")), theme.style_success())
    };
    f.render_widget(
        Paragraph::new(Line::from(status)).alignment(Alignment::Right),
        chunks[1],
    );
}

fn get_keybindings(app: &App) -> Vec<(&'static str, &'static str)> {
    let mut keys = vec![("Tab", "Next"), ("Enter", "Connect")];
    match app.focus {
        Focus::Password => {
            let toggle = if app.password_input.masked { "Show" } else { "Hide" };
            keys.push(("^V", toggle));
        }
        Focus::Connect | Focus::Preset(_) => keys.push(("←→", "Select")),
        Focus::Ssid => {}
    }
    keys.push(("PgUp/PgDn", "Scroll"));
    keys.push(("Esc", "Quit"));
    keys
}
