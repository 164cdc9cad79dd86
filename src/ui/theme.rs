use ratatui::style::{Color, Style};

/// Color theme for laneboard.
///
/// Text and chrome use the terminal's default foreground (Color::Reset).
/// Only drag feedback and error notifications get color.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;

    // Column
    pub const COLUMN_HEADER: Color = Color::Reset;
    pub const COLUMN_BORDER: Color = Color::Reset;
    /// Border of a column the held item is over.
    pub const DROP_CANDIDATE: Color = Color::Cyan;

    // Item
    pub const ITEM_BORDER: Color = Color::Reset;
    pub const ITEM_TEXT: Color = Color::Reset;
    pub const ITEM_DRAGGED: Color = Color::Cyan;

    // Status bar
    pub const STATUS_ERROR: Color = Color::Red;
    pub const DRAG_BADGE: Color = Color::Cyan;

    pub fn dim_style() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn status_style() -> Style {
        Style::default().fg(Self::FG)
    }
}
