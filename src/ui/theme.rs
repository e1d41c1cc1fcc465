use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

// ─── Icons ───────────────────────────────────────────────────────────────
pub const ICON_WIFI: &str = "󰤨 ";
pub const ICON_LOCK: &str = "󰌾 ";
pub const ICON_LOG: &str = " ";

/// Colors and styles for the whole screen (terminal-adaptive, transparency-friendly)
#[derive(Debug, Clone)]
pub struct Theme {
    /// Always Reset so the terminal background shows through
    pub bg: Color,
    pub fg: Color,
    /// Labels, inactive elements
    pub fg_dim: Color,
    /// Focused widgets, keybinding hints
    pub accent: Color,
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub selected_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            fg_dim: Color::DarkGray,
            accent: Color::Cyan,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            border_type: BorderType::Rounded,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            selected_bg: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style_default(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn style_dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    pub fn style_accent(&self) -> Style {
        Style::default().fg(self.accent).bg(self.bg)
    }

    pub fn style_accent_bold(&self) -> Style {
        self.style_accent().add_modifier(Modifier::BOLD)
    }

    pub fn style_selected(&self) -> Style {
        Style::default()
            .fg(self.fg)
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn style_border(&self, focused: bool) -> Style {
        let color = if focused { self.border_focused } else { self.border };
        Style::default().fg(color).bg(self.bg)
    }

    pub fn style_key_hint(&self) -> Style {
        self.style_accent_bold()
    }

    pub fn style_key_desc(&self) -> Style {
        self.style_dim()
    }

    pub fn style_success(&self) -> Style {
        Style::default().fg(self.success).bg(self.bg)
    }

    pub fn style_warning(&self) -> Style {
        Style::default().fg(self.warning).bg(self.bg)
    }

    pub fn style_error(&self) -> Style {
        Style::default().fg(self.error).bg(self.bg)
    }

    /// Color a log line by the event it records
    pub fn log_line_style(&self, message: &str) -> Style {
        if message.ends_with("] available") {
            self.style_success()
        } else if message.contains("] unavailable") || message.starts_with("rejected") {
            self.style_error()
        } else if message.ends_with("] lost") || message.starts_with("request failed") {
            self.style_warning()
        } else {
            self.style_default()
        }
    }
}
