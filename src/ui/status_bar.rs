use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode, NotificationLevel};
use crate::board::storage::KvStore;
use crate::board::sync::{DragState, Synchronizer};

pub fn render_status_bar<S: KvStore>(f: &mut Frame, area: Rect, sync: &Synchronizer<S>, state: &AppState) {
    let left = build_left_zone(state, sync);
    let right = build_right_zone(state, sync);

    let left_width: usize = left.iter().map(|s| s.content.width()).sum();
    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let center_avail = (area.width as usize).saturating_sub(left_width + right_width);
    let center = build_center_zone(state, center_avail);

    let mut spans = left;
    spans.extend(center);
    spans.extend(right);

    f.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_style()), area);
}

fn mode_label(mode: &Mode) -> &'static str {
    match mode {
        Mode::Normal => "NORMAL",
        Mode::Add { .. } => "ADD",
        Mode::Edit { .. } => "EDIT",
        Mode::Drag => "DRAG",
        Mode::Help => "HELP",
    }
}

/// Mode badge, plus where the held item comes from and is headed.
fn build_left_zone<S: KvStore>(state: &AppState, sync: &Synchronizer<S>) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode_label(&state.mode)),
            Style::default()
                .fg(Theme::FG)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        ),
        Span::raw(" "),
    ];

    if let DragState::Dragging { node, target } = sync.drag() {
        let from = sync.tree().parent_of(node).map(|c| c.title()).unwrap_or("?");
        let label = match target {
            Some(col) => format!("⇄ {from} → {} ", col.title()),
            None => format!("⇄ {from} "),
        };
        spans.push(Span::styled(label, Style::default().fg(Theme::DRAG_BADGE)));
    }

    spans
}

/// Column name + item count + position.
fn build_right_zone<S: KvStore>(state: &AppState, sync: &Synchronizer<S>) -> Vec<Span<'static>> {
    let col = state.focused_column;
    let count = sync.tree().children(col).len();
    let pos = if count > 0 {
        format!(" {}/{}", state.selected_item + 1, count)
    } else {
        " 0".to_string()
    };
    vec![
        Span::styled(format!("{}[{count}]", col.title()), Style::default().fg(Theme::DIM)),
        Span::styled(pos, Style::default().fg(Theme::FG)),
        Span::raw(" "),
    ]
}

/// Notification text centered in the available width.
fn build_center_zone(state: &AppState, avail_width: usize) -> Vec<Span<'_>> {
    let Some(ref notif) = state.notification else {
        return vec![Span::raw(" ".repeat(avail_width))];
    };
    let color = match state.notification_level {
        NotificationLevel::Info => Theme::FG,
        NotificationLevel::Error => Theme::STATUS_ERROR,
    };

    let notif_width = notif.width();
    if notif_width >= avail_width {
        let truncated = super::board_view::truncate(notif, avail_width);
        return vec![Span::styled(truncated, Style::default().fg(color))];
    }

    let pad_total = avail_width - notif_width;
    let pad_left = pad_total / 2;
    vec![
        Span::raw(" ".repeat(pad_left)),
        Span::styled(notif.as_str(), Style::default().fg(color)),
        Span::raw(" ".repeat(pad_total - pad_left)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::storage::MemoryStore;
    use crate::board::ColumnId;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn left_zone_shows_mode_and_held_item() {
        let mut sync = Synchronizer::open(MemoryStore::new()).unwrap();
        let mut state = AppState::new();
        assert_eq!(text(&build_left_zone(&state, &sync)), " NORMAL  ");

        let node = sync.tree().child_at(ColumnId::Backlog, 0).unwrap();
        sync.drag_start(node);
        sync.drag_enter(ColumnId::OnHold);
        state.mode = Mode::Drag;
        assert_eq!(
            text(&build_left_zone(&state, &sync)),
            " DRAG  ⇄ Backlog → On Hold "
        );
    }

    #[test]
    fn right_zone_shows_position() {
        let sync = Synchronizer::open(MemoryStore::new()).unwrap();
        let state = AppState::new();
        assert_eq!(text(&build_right_zone(&state, &sync)), "Backlog[1] 1/1 ");
    }

    #[test]
    fn center_zone_pads_notification() {
        let mut state = AppState::new();
        state.notify("hi");
        let spans = build_center_zone(&state, 10);
        assert_eq!(text(&spans), "    hi    ");
    }

    #[test]
    fn center_zone_empty_without_notification() {
        let state = AppState::new();
        assert_eq!(text(&build_center_zone(&state, 3)), "   ");
    }
}
