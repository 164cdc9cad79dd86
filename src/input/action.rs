/// All possible semantic actions in laneboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusPrevColumn,
    FocusNextColumn,
    SelectPrevItem,
    SelectNextItem,
    JumpToColumn(usize),
    JumpToFirstItem,
    JumpToLastItem,

    // Item actions
    AddItem,
    EditItem,
    ClearItem,
    PickUpItem,

    // Keyboard drag
    DragPrevColumn,
    DragNextColumn,
    DropItem,
    LeaveDrag,

    // Text input (add box and inline edit)
    InputConfirm,
    InputCancel,
    InputChar(char),
    InputBackspace,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    InputDeleteWord,

    // Board
    ShowHelp,
    Quit,

    // No-op
    None,
}
