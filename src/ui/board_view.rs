use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState,
};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode};
use crate::board::storage::KvStore;
use crate::board::sync::{DragState, Synchronizer};
use crate::board::ColumnId;

/// 1 text line + 2 border lines.
pub const ITEM_HEIGHT: u16 = 3;

/// Where things sit inside one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub items: Rect,
    /// Add box when open, one-line hint otherwise.
    pub footer: Rect,
    pub scroll_offset: usize,
    pub max_visible: usize,
}

/// What a screen position lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub column: ColumnId,
    /// Position among the column's children, if the point is on an item.
    pub item: Option<usize>,
}

/// Split the board area evenly into the four columns.
pub fn column_areas(area: Rect) -> [Rect; 4] {
    Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(area)
}

fn column_frame() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .padding(Padding::new(1, 1, 0, 0))
}

/// Compute the layout of a column holding `len` items.
///
/// `selected` is the selected position when the column has focus; the view
/// scrolls just far enough to keep it visible.
pub fn layout_column(area: Rect, input_open: bool, len: usize, selected: Option<usize>) -> ColumnLayout {
    let inner = column_frame().inner(area);
    let footer_height = if input_open { 3 } else { 1 }.min(inner.height);
    let items = Rect::new(inner.x, inner.y, inner.width, inner.height - footer_height);
    let footer = Rect::new(inner.x, items.y + items.height, inner.width, footer_height);

    let max_visible = (items.height / ITEM_HEIGHT) as usize;
    let selected = selected.unwrap_or(0);
    let scroll_offset = if len > max_visible && selected >= max_visible {
        selected - max_visible + 1
    } else {
        0
    };
    ColumnLayout { items, footer, scroll_offset, max_visible }
}

impl ColumnLayout {
    /// Screen rect of the item at `pos`, if it is scrolled into view.
    pub fn item_rect(&self, pos: usize) -> Option<Rect> {
        if pos < self.scroll_offset || pos - self.scroll_offset >= self.max_visible {
            return None;
        }
        let y = self.items.y + (pos - self.scroll_offset) as u16 * ITEM_HEIGHT;
        Some(Rect::new(self.items.x, y, self.items.width, ITEM_HEIGHT))
    }
}

fn layout_for<S: KvStore>(area: Rect, sync: &Synchronizer<S>, state: &AppState, col: ColumnId) -> ColumnLayout {
    let selected = (state.focused_column == col).then_some(state.selected_item);
    layout_column(area, sync.is_input_open(col), sync.tree().children(col).len(), selected)
}

/// Screen rect of the item at `pos` in `col`, as the last render drew it.
pub fn item_rect<S: KvStore>(
    board_area: Rect,
    sync: &Synchronizer<S>,
    state: &AppState,
    col: ColumnId,
    pos: usize,
) -> Option<Rect> {
    if pos >= sync.tree().children(col).len() {
        return None;
    }
    let area = column_areas(board_area)[col.index()];
    layout_for(area, sync, state, col).item_rect(pos)
}

/// Find the column, and the item within it, under screen position `(x, y)`.
pub fn hit_test<S: KvStore>(
    board_area: Rect,
    sync: &Synchronizer<S>,
    state: &AppState,
    x: u16,
    y: u16,
) -> Option<Hit> {
    let point = Position::new(x, y);
    let areas = column_areas(board_area);
    let col = ColumnId::ALL.into_iter().find(|c| areas[c.index()].contains(point))?;
    let layout = layout_for(areas[col.index()], sync, state, col);
    let item = (0..sync.tree().children(col).len())
        .find(|&pos| layout.item_rect(pos).is_some_and(|r| r.contains(point)));
    Some(Hit { column: col, item })
}

/// Truncate `text` to `max_width` display columns, ending in `…` when cut.
pub(crate) fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let avail = max_width.saturating_sub(1);
    let truncated: String = text
        .graphemes(true)
        .scan(0, |w, g| {
            let gw = g.width();
            (*w + gw <= avail).then(|| {
                *w += gw;
                g
            })
        })
        .collect();
    format!("{truncated}…")
}

pub fn render_board<S: KvStore>(f: &mut Frame, area: Rect, sync: &Synchronizer<S>, state: &AppState) {
    let areas = column_areas(area);
    for col in ColumnId::ALL {
        render_column(f, areas[col.index()], col, sync, state);
    }
}

fn render_column<S: KvStore>(
    f: &mut Frame,
    area: Rect,
    col: ColumnId,
    sync: &Synchronizer<S>,
    state: &AppState,
) {
    let tree = sync.tree();
    let children = tree.children(col);
    let is_focused = state.focused_column == col;
    let is_candidate = tree.is_candidate(col);

    let header_line = Line::from(vec![
        Span::styled(
            format!(" {} ", col.title()),
            Style::default()
                .fg(Theme::COLUMN_HEADER)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("({}) ", children.len()), Theme::dim_style()),
    ]);

    let focused_mod = if is_focused { Modifier::BOLD } else { Modifier::empty() };
    let (border_color, border_type) = if is_candidate {
        (Theme::DROP_CANDIDATE, BorderType::Thick)
    } else {
        (Theme::COLUMN_BORDER, BorderType::Rounded)
    };
    let block = column_frame()
        .border_type(border_type)
        .border_style(Style::default().fg(border_color).add_modifier(focused_mod))
        .title(header_line);
    f.render_widget(block, area);

    let layout = layout_for(area, sync, state, col);
    if layout.items.width == 0 {
        return;
    }

    let dragged = match sync.drag() {
        DragState::Dragging { node, .. } => Some(node),
        DragState::Idle => None,
    };

    for (pos, &id) in children.iter().enumerate().skip(layout.scroll_offset) {
        let Some(rect) = layout.item_rect(pos) else { break };
        let Some(node) = tree.node(id) else { continue };
        let is_selected = is_focused && state.selected_item == pos;
        let editing = match &state.mode {
            Mode::Edit { column, index, buf } if *column == col && *index == pos => Some(buf.cursor),
            _ => None,
        };
        render_item(f, rect, &node.text, is_selected, dragged == Some(id), editing);
    }

    if children.len() > layout.max_visible {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        let mut scrollbar_state = ScrollbarState::new(children.len()).position(layout.scroll_offset);
        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }

    render_footer(f, layout.footer, col, sync, state, is_focused);
}

/// Draw one item. `editing` carries the cursor when the item is being edited.
fn render_item(
    f: &mut Frame,
    area: Rect,
    text: &str,
    is_selected: bool,
    is_dragged: bool,
    editing: Option<usize>,
) {
    if area.width < 4 || area.height < ITEM_HEIGHT {
        return;
    }

    let selected_mod = if is_selected { Modifier::BOLD } else { Modifier::empty() };
    let (color, border_type) = if is_dragged {
        (Theme::ITEM_DRAGGED, BorderType::Double)
    } else if is_selected {
        (Theme::ITEM_BORDER, BorderType::Thick)
    } else {
        (Theme::ITEM_BORDER, BorderType::Rounded)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(color).add_modifier(selected_mod));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let max_width = (inner.width as usize).saturating_sub(1);
    let prefix = if is_dragged { "⇄ " } else { "" };
    let shown = if editing.is_some() {
        text.to_string()
    } else {
        truncate(&format!("{prefix}{text}"), max_width)
    };
    let text_color = if is_dragged { Theme::ITEM_DRAGGED } else { Theme::ITEM_TEXT };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {shown}"),
            Style::default().fg(text_color).add_modifier(selected_mod),
        ))),
        inner,
    );

    if let Some(cursor) = editing {
        set_cursor(f, inner, text, cursor);
    }
}

/// Place the terminal cursor `cursor` chars into `text` drawn at `area` after one space.
fn set_cursor(f: &mut Frame, area: Rect, text: &str, cursor: usize) {
    let before: String = text.chars().take(cursor).collect();
    let offset = (1 + before.width()).min(area.width.saturating_sub(1) as usize) as u16;
    f.set_cursor_position(Position::new(area.x + offset, area.y));
}

fn render_footer<S: KvStore>(
    f: &mut Frame,
    area: Rect,
    col: ColumnId,
    sync: &Synchronizer<S>,
    state: &AppState,
    is_focused: bool,
) {
    if area.height == 0 {
        return;
    }
    if !sync.is_input_open(col) {
        let hint = if is_focused { " + add item (a)" } else { " + add item" };
        f.render_widget(Paragraph::new(Span::styled(hint, Theme::dim_style())), area);
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Theme::FG))
        .title(Span::styled(" new item ", Theme::dim_style()));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let pending = sync.pending(col);
    f.render_widget(Paragraph::new(format!(" {pending}")), inner);
    if let Mode::Add { column, buf } = &state.mode {
        if *column == col {
            set_cursor(f, inner, pending, buf.cursor);
        }
    }
}
