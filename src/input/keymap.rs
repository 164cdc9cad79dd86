use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action::Action;
use crate::app::Mode;

/// Map a key event to a semantic action based on current mode.
pub fn map_key(key: KeyEvent, mode: &Mode) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    match mode {
        Mode::Normal => map_normal(key),
        Mode::Add { .. } | Mode::Edit { .. } => map_input(key),
        Mode::Drag => map_drag(key),
        Mode::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Action::Quit,
            _ => Action::None,
        },
    }
}

fn map_normal(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => Action::FocusPrevColumn,
        KeyCode::Char('l') | KeyCode::Right => Action::FocusNextColumn,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNextItem,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrevItem,
        KeyCode::Char(c @ '1'..='4') => Action::JumpToColumn(c as usize - '1' as usize),
        KeyCode::Char('g') | KeyCode::Home => Action::JumpToFirstItem,
        KeyCode::Char('G') | KeyCode::End => Action::JumpToLastItem,
        KeyCode::Char('a') | KeyCode::Char('n') => Action::AddItem,
        KeyCode::Char('e') | KeyCode::Enter => Action::EditItem,
        KeyCode::Char('d') | KeyCode::Delete => Action::ClearItem,
        KeyCode::Char('m') | KeyCode::Char(' ') => Action::PickUpItem,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

fn map_drag(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => Action::DragPrevColumn,
        KeyCode::Char('l') | KeyCode::Right => Action::DragNextColumn,
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => Action::DropItem,
        KeyCode::Esc => Action::LeaveDrag,
        _ => Action::None,
    }
}

fn map_input(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter | KeyCode::Tab => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputHome,
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputEnd,
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::InputDeleteWord
        }
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

/// A key binding for display in the help overlay.
pub struct Binding {
    pub key: &'static str,
    pub description: &'static str,
}

pub const NORMAL_BINDINGS: &[Binding] = &[
    Binding { key: "h / l", description: "Switch columns" },
    Binding { key: "j / k", description: "Select item" },
    Binding { key: "1-4", description: "Jump to column" },
    Binding { key: "g / G", description: "First / last item" },
    Binding { key: "a", description: "Add item to column" },
    Binding { key: "e", description: "Edit item in place" },
    Binding { key: "d", description: "Delete item" },
    Binding { key: "m", description: "Pick up item to drag" },
    Binding { key: "?", description: "Help" },
    Binding { key: "q", description: "Quit" },
];

pub const DRAG_BINDINGS: &[Binding] = &[
    Binding { key: "h / l", description: "Drag over neighbour column" },
    Binding { key: "Enter", description: "Drop at end of column" },
    Binding { key: "Esc", description: "Let go without dropping" },
];

pub const INPUT_BINDINGS: &[Binding] = &[
    Binding { key: "Enter", description: "Save" },
    Binding { key: "Esc", description: "Leave (edit) / cancel (add)" },
    Binding { key: "C-w", description: "Delete word" },
    Binding { key: "C-a / C-e", description: "Start / end of line" },
];
