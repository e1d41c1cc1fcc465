use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::ui::theme::ICON_LOG;

/// Render the event log, pinned to the newest entry unless scrolled back
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let total = app.log.len();

    let title = if app.log_scroll > 0 {
        format!(" {ICON_LOG}Log ({total}/{}, ↑{}) ", app.log.capacity(), app.log_scroll)
    } else {
        format!(" {ICON_LOG}Log ({total}/{}) ", app.log.capacity())
    };

    let block = Block::default()
        .title(Span::styled(title, t.style_accent_bold()))
        .borders(Borders::ALL)
        .border_type(t.border_type)
        .border_style(t.style_border(false));

    if app.log.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No events yet. Enter an SSID and password, or pick a preset.",
            t.style_dim(),
        )))
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let visible = block.inner(area).height as usize;
    let top = scroll_top(total, visible, app.log_scroll);

    let lines: Vec<Line> = app
        .log
        .entries()
        .skip(top)
        .take(visible)
        .map(|entry| {
            Line::from(vec![
                Span::styled(format!("[{}] ", entry.timestamp), t.style_dim()),
                Span::styled(entry.message.clone(), t.log_line_style(&entry.message)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Index of the first visible entry
fn scroll_top(total: usize, visible: usize, scrolled_back: usize) -> usize {
    total.saturating_sub(visible).saturating_sub(scrolled_back)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_tail_by_default() {
        assert_eq!(scroll_top(100, 10, 0), 90);
        assert_eq!(scroll_top(5, 10, 0), 0);
    }

    #[test]
    fn scrolled_back_stops_at_top() {
        assert_eq!(scroll_top(100, 10, 30), 60);
        assert_eq!(scroll_top(100, 10, 500), 0);
    }
}
