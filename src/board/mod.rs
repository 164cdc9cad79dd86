pub mod storage;
pub mod sync;
pub mod tree;

/// One of the four fixed board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnId {
    Backlog,
    Progress,
    Complete,
    OnHold,
}

impl ColumnId {
    pub const ALL: [ColumnId; 4] = [Self::Backlog, Self::Progress, Self::Complete, Self::OnHold];

    pub fn index(self) -> usize {
        match self {
            Self::Backlog => 0,
            Self::Progress => 1,
            Self::Complete => 2,
            Self::OnHold => 3,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Key under which this column's items are persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Backlog => "backlogItems",
            Self::Progress => "progressItems",
            Self::Complete => "completeItems",
            Self::OnHold => "onHoldItems",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Progress => "In Progress",
            Self::Complete => "Complete",
            Self::OnHold => "On Hold",
        }
    }

    /// The single item seeded into this column on first run.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog Test entry",
            Self::Progress => "Progress Test entry",
            Self::Complete => "Complete Test entry",
            Self::OnHold => "On Hold Test entry",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::OnHold => "on-hold",
        }
    }

    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl std::str::FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "progress" | "in-progress" => Ok(Self::Progress),
            "complete" => Ok(Self::Complete),
            "on-hold" | "onhold" => Ok(Self::OnHold),
            other => Err(format!(
                "unknown column '{other}': use backlog, progress, complete, on-hold"
            )),
        }
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in a column. `None` is a hole left by a delete that has not
/// been compacted yet.
pub type Slot = Option<String>;

/// The four ordered item sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    columns: [Vec<Slot>; 4],
}

impl Board {
    /// Board with one placeholder item per column.
    pub fn with_placeholders() -> Self {
        let mut board = Self::default();
        for col in ColumnId::ALL {
            board.push(col, col.placeholder());
        }
        board
    }

    /// Build a board from plain item lists, in `ColumnId::ALL` order.
    pub fn from_items(items: [Vec<String>; 4]) -> Self {
        Self {
            columns: items.map(|col| col.into_iter().map(Some).collect()),
        }
    }

    pub(crate) fn from_slots(columns: [Vec<Slot>; 4]) -> Self {
        Self { columns }
    }

    pub fn slots(&self, col: ColumnId) -> &[Slot] {
        &self.columns[col.index()]
    }

    /// Items in a column, skipping holes.
    pub fn items(&self, col: ColumnId) -> Vec<&str> {
        self.columns[col.index()]
            .iter()
            .filter_map(|slot| slot.as_deref())
            .collect()
    }

    pub fn len(&self, col: ColumnId) -> usize {
        self.columns[col.index()].len()
    }

    pub fn get(&self, col: ColumnId, idx: usize) -> Option<&str> {
        self.columns[col.index()].get(idx).and_then(|s| s.as_deref())
    }

    /// Overwrite the slot at `idx`. Returns false if out of range.
    pub fn set(&mut self, col: ColumnId, idx: usize, text: impl Into<String>) -> bool {
        match self.columns[col.index()].get_mut(idx) {
            Some(slot) => {
                *slot = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// Leave a hole at `idx`. Returns false if out of range.
    pub fn delete(&mut self, col: ColumnId, idx: usize) -> bool {
        match self.columns[col.index()].get_mut(idx) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, col: ColumnId, text: impl Into<String>) {
        self.columns[col.index()].push(Some(text.into()));
    }

    /// Replace a column's sequence wholesale.
    pub fn replace(&mut self, col: ColumnId, items: Vec<String>) {
        self.columns[col.index()] = items.into_iter().map(Some).collect();
    }

    /// Drop holes and empty items from every column.
    pub fn compact(&mut self) {
        for col in self.columns.iter_mut() {
            *col = remove_empty(col);
        }
    }

    pub fn total_items(&self) -> usize {
        self.columns
            .iter()
            .map(|col| col.iter().filter(|s| s.is_some()).count())
            .sum()
    }
}

/// Copy of `seq` without holes or empty strings. Survivors keep their order.
pub fn remove_empty(seq: &[Slot]) -> Vec<Slot> {
    seq.iter()
        .filter(|slot| slot.as_deref().is_some_and(|s| !s.is_empty()))
        .cloned()
        .collect()
}
