use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, warn};
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;

use crate::board::storage::{KvStore, StorageError};
use crate::board::sync::{DragState, Synchronizer};
use crate::board::tree::NodeId;
use crate::board::ColumnId;
use crate::input::action::Action;
use crate::input::keymap::map_key;

/// Reusable text editing buffer with cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(input: String) -> Self {
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    pub fn empty() -> Self {
        Self { input: String::new(), cursor: 0 }
    }

    /// Convert a char index to a byte index.
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn delete_word(&mut self) {
        let byte_pos = self.byte_offset(self.cursor);
        let before = &self.input[..byte_pos];
        let trimmed = before.trim_end();
        let start_byte = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let start_char = self.input[..start_byte].chars().count();
        self.input.drain(start_byte..byte_pos);
        self.cursor = start_char;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Apply a text-editing action. Returns true if the text changed.
    fn apply(&mut self, action: &Action) -> bool {
        match action {
            Action::InputChar(c) => self.insert(*c),
            Action::InputBackspace => self.backspace(),
            Action::InputDeleteWord => self.delete_word(),
            Action::InputLeft => {
                self.move_left();
                return false;
            }
            Action::InputRight => {
                self.move_right();
                return false;
            }
            Action::InputHome => {
                self.home();
                return false;
            }
            Action::InputEnd => {
                self.end();
                return false;
            }
            _ => return false,
        }
        true
    }
}

/// Current interaction mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing into a column's add box.
    Add { column: ColumnId, buf: TextBuffer },
    /// Editing an item in place. Leaving this mode is the blur.
    Edit { column: ColumnId, index: usize, buf: TextBuffer },
    /// Holding an item; h/l and the mouse choose where it lands.
    Drag,
    Help,
}

/// Mouse button state between a press on an item and the first drag motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Up,
    Pressed(NodeId),
    Dragging,
}

/// Notification severity for statusbar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Global application state.
pub struct AppState {
    pub mode: Mode,
    pub focused_column: ColumnId,
    pub selected_item: usize,
    /// Column the held item is currently over, as last reported to the board.
    pub drag_over: Option<ColumnId>,
    pub pointer: Pointer,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            focused_column: ColumnId::Backlog,
            selected_item: 0,
            drag_over: None,
            pointer: Pointer::Up,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
            should_quit: false,
        }
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Clear expired notifications.
    pub fn tick_notification(&mut self) {
        if let Some(expires) = self.notification_expires {
            if Instant::now() >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
    }

    /// Clamp the selected item to the focused column's length.
    pub fn clamp_selection<S: KvStore>(&mut self, sync: &Synchronizer<S>) {
        let len = sync.tree().children(self.focused_column).len();
        if len == 0 {
            self.selected_item = 0;
        } else if self.selected_item >= len {
            self.selected_item = len - 1;
        }
    }

    fn focus(&mut self, column: ColumnId) {
        self.focused_column = column;
    }

    /// Focus `column` and select its last item.
    fn focus_last<S: KvStore>(&mut self, sync: &Synchronizer<S>, column: ColumnId) {
        self.focused_column = column;
        self.selected_item = sync.tree().children(column).len().saturating_sub(1);
    }

    fn selected_node<S: KvStore>(&self, sync: &Synchronizer<S>) -> Option<NodeId> {
        sync.tree().child_at(self.focused_column, self.selected_item)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Main TUI application loop.
pub fn run<S: KvStore>(
    terminal: &mut DefaultTerminal,
    sync: &mut Synchronizer<S>,
    mouse: bool,
) -> color_eyre::Result<()> {
    let mut state = AppState::new();
    state.clamp_selection(sync);

    loop {
        state.tick_notification();

        terminal.draw(|f| crate::ui::render(f, sync, &state))?;

        if event::poll(Duration::from_millis(100))? {
            let result = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let action = map_key(key, &state.mode);
                    process_action(sync, &mut state, action)
                }
                Event::Mouse(m) if mouse => {
                    let size = terminal.size()?;
                    handle_mouse(sync, &mut state, m, Rect::new(0, 0, size.width, size.height))
                }
                _ => Ok(()),
            };
            if let Err(e) = result {
                warn!("save failed: {e}");
                state.notify_error(format!("Save failed: {e}"));
            }
            if state.should_quit {
                break;
            }
        }
    }

    Ok(())
}

pub fn process_action<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    action: Action,
) -> Result<(), StorageError> {
    match action {
        Action::None => {}

        Action::FocusPrevColumn
        | Action::FocusNextColumn
        | Action::SelectPrevItem
        | Action::SelectNextItem
        | Action::JumpToColumn(_)
        | Action::JumpToFirstItem
        | Action::JumpToLastItem => {
            handle_navigation(sync, state, action);
        }

        Action::AddItem | Action::EditItem | Action::ClearItem | Action::PickUpItem => {
            handle_item_action(sync, state, action)?;
        }

        Action::DragPrevColumn | Action::DragNextColumn | Action::DropItem | Action::LeaveDrag => {
            handle_drag(sync, state, action)?;
        }

        Action::InputChar(_)
        | Action::InputBackspace
        | Action::InputLeft
        | Action::InputRight
        | Action::InputHome
        | Action::InputEnd
        | Action::InputDeleteWord
        | Action::InputConfirm
        | Action::InputCancel => {
            handle_input(sync, state, action)?;
        }

        Action::ShowHelp => state.mode = Mode::Help,
        Action::Quit => match state.mode {
            Mode::Normal => state.should_quit = true,
            Mode::Help => state.mode = Mode::Normal,
            // Ctrl-C while typing: blur first so nothing typed is lost.
            Mode::Add { .. } | Mode::Edit { .. } => {
                handle_input(sync, state, Action::InputConfirm)?;
                state.should_quit = true;
            }
            Mode::Drag => state.should_quit = true,
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Navigation
// ---------------------------------------------------------------------------

fn handle_navigation<S: KvStore>(sync: &Synchronizer<S>, state: &mut AppState, action: Action) {
    match action {
        Action::FocusPrevColumn => {
            if let Some(col) = state.focused_column.prev() {
                state.focus(col);
            }
        }
        Action::FocusNextColumn => {
            if let Some(col) = state.focused_column.next() {
                state.focus(col);
            }
        }
        Action::SelectPrevItem => {
            state.selected_item = state.selected_item.saturating_sub(1);
        }
        Action::SelectNextItem => {
            if state.selected_item + 1 < sync.tree().children(state.focused_column).len() {
                state.selected_item += 1;
            }
        }
        Action::JumpToColumn(idx) => {
            if let Some(col) = ColumnId::from_index(idx) {
                state.focus(col);
            }
        }
        Action::JumpToFirstItem => state.selected_item = 0,
        Action::JumpToLastItem => {
            state.selected_item = sync.tree().children(state.focused_column).len().saturating_sub(1);
        }
        _ => unreachable!(),
    }
    state.clamp_selection(sync);
}

// ---------------------------------------------------------------------------
// Handler: Item actions (add box, inline edit, delete, pick up)
// ---------------------------------------------------------------------------

fn handle_item_action<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    action: Action,
) -> Result<(), StorageError> {
    match action {
        Action::AddItem => {
            let column = state.focused_column;
            sync.show_input_box(column);
            state.mode = Mode::Add {
                column,
                buf: TextBuffer::new(sync.pending(column).to_string()),
            };
        }
        Action::EditItem => {
            if let Some(node) = state.selected_node(sync).and_then(|id| sync.tree().node(id)) {
                state.mode = Mode::Edit {
                    column: node.column,
                    index: node.index,
                    buf: TextBuffer::new(node.text.clone()),
                };
            }
        }
        Action::ClearItem => {
            if let Some(node) = state.selected_node(sync) {
                let (column, index) = (state.focused_column, state.selected_item);
                sync.edit_node_text(node, "");
                blur(sync, state, column, index)?;
                if !sync.is_dragging() {
                    state.notify("Item deleted");
                }
            }
        }
        Action::PickUpItem => {
            if let Some(node) = state.selected_node(sync) {
                let column = state.focused_column;
                if let Some(old) = state.drag_over.take() {
                    sync.drag_leave(old);
                }
                sync.drag_start(node);
                sync.drag_enter(column);
                state.drag_over = Some(column);
                state.mode = Mode::Drag;
            }
        }
        _ => unreachable!(),
    }
    Ok(())
}

/// The edited node lost focus: commit it unless a drag is in progress.
fn blur<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    column: ColumnId,
    index: usize,
) -> Result<(), StorageError> {
    if !sync.apply_edit(column, index)? && sync.is_dragging() {
        state.notify_error("Edit not saved: an item is being dragged");
    }
    state.clamp_selection(sync);
    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Keyboard drag
// ---------------------------------------------------------------------------

fn handle_drag<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    action: Action,
) -> Result<(), StorageError> {
    match action {
        Action::DragPrevColumn | Action::DragNextColumn => {
            let from = state.drag_over.unwrap_or(state.focused_column);
            let to = if action == Action::DragPrevColumn { from.prev() } else { from.next() };
            if let Some(to) = to {
                drag_over(sync, state, Some(to));
                state.focus(to);
                state.clamp_selection(sync);
            }
        }
        Action::DropItem => drop_held(sync, state)?,
        Action::LeaveDrag => {
            // Letting go away from a column: nothing is dropped and the
            // board stays in its dragging state.
            if let Some(col) = state.drag_over.take() {
                sync.drag_leave(col);
            }
            state.mode = Mode::Normal;
            state.notify("Item not dropped");
        }
        _ => unreachable!(),
    }
    Ok(())
}

/// Report the column under the held item, emitting leave/enter on change.
fn drag_over<S: KvStore>(sync: &mut Synchronizer<S>, state: &mut AppState, over: Option<ColumnId>) {
    if over == state.drag_over {
        return;
    }
    if let Some(old) = state.drag_over {
        sync.drag_leave(old);
    }
    if let Some(new) = over {
        sync.drag_enter(new);
    }
    state.drag_over = over;
}

fn drop_held<S: KvStore>(sync: &mut Synchronizer<S>, state: &mut AppState) -> Result<(), StorageError> {
    let target = match sync.drag() {
        DragState::Dragging { target, .. } => target,
        DragState::Idle => None,
    };
    state.drag_over = None;
    state.mode = Mode::Normal;
    if sync.drop_dragged()? {
        if let Some(col) = target {
            state.focus_last(sync, col);
        }
        state.notify("Item moved");
    }
    state.clamp_selection(sync);
    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Text input (add box and inline edit)
// ---------------------------------------------------------------------------

fn handle_input<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    action: Action,
) -> Result<(), StorageError> {
    match action {
        Action::InputConfirm | Action::InputCancel => {
            let old_mode = std::mem::replace(&mut state.mode, Mode::Normal);
            match old_mode {
                Mode::Add { column, buf } => {
                    sync.set_pending(column, buf.input);
                    if action == Action::InputConfirm {
                        let before = sync.board().len(column);
                        sync.hide_input_box(column)?;
                        if sync.board().len(column) > before {
                            state.focus_last(sync, column);
                            state.notify("Item added");
                        }
                    } else {
                        sync.cancel_input_box(column);
                    }
                }
                // Esc has no cancel semantics for an in-place edit: any way
                // out of the node is a blur.
                Mode::Edit { column, index, .. } => blur(sync, state, column, index)?,
                other => state.mode = other,
            }
        }
        _ => match &mut state.mode {
            Mode::Add { column, buf } => {
                if buf.apply(&action) {
                    sync.set_pending(*column, buf.input.clone());
                }
            }
            Mode::Edit { column, index, buf } => {
                if buf.apply(&action) {
                    if let Some(node) = sync.tree().child_at(*column, *index) {
                        sync.edit_node_text(node, buf.input.clone());
                    }
                }
            }
            _ => {}
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mouse: click to select, press-and-move to drag, release to drop
// ---------------------------------------------------------------------------

pub fn handle_mouse<S: KvStore>(
    sync: &mut Synchronizer<S>,
    state: &mut AppState,
    mouse: MouseEvent,
    area: Rect,
) -> Result<(), StorageError> {
    if !matches!(state.mode, Mode::Normal | Mode::Drag) {
        return Ok(());
    }
    let board_area = crate::ui::board_area(area);
    let hit = crate::ui::board_view::hit_test(board_area, sync, state, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            state.pointer = Pointer::Up;
            if let Some(hit) = hit {
                state.focus(hit.column);
                if let Some(pos) = hit.item {
                    state.selected_item = pos;
                    if let Some(node) = sync.tree().child_at(hit.column, pos) {
                        state.pointer = Pointer::Pressed(node);
                    }
                }
                state.clamp_selection(sync);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            match state.pointer {
                Pointer::Up => return Ok(()),
                Pointer::Pressed(node) => {
                    if let Some(old) = state.drag_over.take() {
                        sync.drag_leave(old);
                    }
                    sync.drag_start(node);
                    state.pointer = Pointer::Dragging;
                    state.mode = Mode::Drag;
                    debug!("mouse drag started");
                }
                Pointer::Dragging => {}
            }
            drag_over(sync, state, hit.map(|h| h.column));
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let was_dragging = state.pointer == Pointer::Dragging;
            state.pointer = Pointer::Up;
            if was_dragging {
                if hit.is_some() {
                    drop_held(sync, state)?;
                } else {
                    // Released outside every column: no drop fires.
                    state.drag_over = None;
                    state.mode = Mode::Normal;
                    state.notify("Item not dropped");
                }
            }
        }
        _ => {}
    }
    Ok(())
}
