pub mod board_view;
pub mod help;
pub mod status_bar;
pub mod theme;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::board::storage::KvStore;
use crate::board::sync::Synchronizer;

/// Create a centered rect within `area` using percentage-based sizing with minimums.
pub fn centered_rect(area: Rect, w_pct: u16, h_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * w_pct / 100).max(min_w).min(area.width);
    let height = (area.height * h_pct / 100).max(min_h).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn split(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area)
}

/// The part of the screen the columns occupy (everything above the status bar).
pub fn board_area(area: Rect) -> Rect {
    split(area)[0]
}

pub fn render<S: KvStore>(f: &mut Frame, sync: &Synchronizer<S>, state: &AppState) {
    let [board, status] = split(f.area());

    board_view::render_board(f, board, sync, state);
    status_bar::render_status_bar(f, status, sync, state);

    if state.mode == Mode::Help {
        help::render_help(f, f.area());
    }
}
