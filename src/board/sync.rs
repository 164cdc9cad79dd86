//! Two-way reconciliation between the board, the visual tree and the store.
//!
//! Every mutation path ends in [`Synchronizer::render`], which rebuilds the
//! tree from the board and saves a full snapshot.

use log::{debug, info};

use super::storage::{load_board, save_board, KvStore, StorageError};
use super::tree::{NodeId, NodeTree};
use super::{Board, ColumnId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        node: NodeId,
        /// Most recently entered column. Left columns do not clear it.
        target: Option<ColumnId>,
    },
}

/// Owns all board state: the sequences, their rendered nodes, the store,
/// the drag state and the pending add-box text per column.
#[derive(Debug)]
pub struct Synchronizer<S: KvStore> {
    board: Board,
    tree: NodeTree,
    store: S,
    drag: DragState,
    pending: [String; 4],
    input_open: [bool; 4],
}

impl<S: KvStore> Synchronizer<S> {
    /// Load the board from `store` and settle. This is the only place the
    /// store is read.
    pub fn open(store: S) -> Result<Self, StorageError> {
        let board = load_board(&store);
        let mut sync = Self {
            board,
            tree: NodeTree::new(),
            store,
            drag: DragState::Idle,
            pending: Default::default(),
            input_open: [false; 4],
        };
        sync.render()?;
        Ok(sync)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Settle point: compact, rebuild every node with fresh index tags, save.
    pub fn render(&mut self) -> Result<(), StorageError> {
        self.board.compact();
        for col in ColumnId::ALL {
            self.tree.clear_children(col);
            let items: Vec<String> = self.board.items(col).into_iter().map(String::from).collect();
            for (idx, text) in items.into_iter().enumerate() {
                let node = self.tree.create_node(text, col, idx);
                self.tree.append_child(col, node);
            }
        }
        save_board(&mut self.store, &self.board)?;
        debug!(
            "settled: {} / {} / {} / {} ({} node slots)",
            self.board.len(ColumnId::Backlog),
            self.board.len(ColumnId::Progress),
            self.board.len(ColumnId::Complete),
            self.board.len(ColumnId::OnHold),
            self.tree.slot_count(),
        );
        Ok(())
    }

    /// Change a node's text in the tree only, as typing into it would.
    /// The board sees the change on the next [`apply_edit`](Self::apply_edit)
    /// or rebuild.
    pub fn edit_node_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(n) = self.tree.node_mut(node) {
            if n.editable {
                n.text = text.into();
            }
        }
    }

    /// Commit the text of the node at `index` in `column` after it loses focus.
    ///
    /// Empty text deletes the item. Ignored while a drag is in progress.
    /// Returns whether the board was touched.
    pub fn apply_edit(&mut self, column: ColumnId, index: usize) -> Result<bool, StorageError> {
        if self.is_dragging() {
            debug!("edit of {column}[{index}] suppressed during drag");
            return Ok(false);
        }
        let text = match self.tree.child_at(column, index).and_then(|id| self.tree.node(id)) {
            Some(node) => node.text.clone(),
            None => return Ok(false),
        };
        if text.is_empty() {
            self.board.delete(column, index);
            info!("deleted {column}[{index}]");
        } else {
            self.board.set(column, index, text);
            debug!("edited {column}[{index}]");
        }
        self.render()?;
        Ok(true)
    }

    pub fn pending(&self, column: ColumnId) -> &str {
        &self.pending[column.index()]
    }

    pub fn set_pending(&mut self, column: ColumnId, text: impl Into<String>) {
        self.pending[column.index()] = text.into();
    }

    /// Append the column's pending text, clear it, and settle.
    /// Blank text is discarded rather than stored.
    pub fn append_item(&mut self, column: ColumnId) -> Result<(), StorageError> {
        let text = std::mem::take(&mut self.pending[column.index()]);
        if text.trim().is_empty() {
            debug!("discarded blank item for {column}");
        } else {
            self.board.push(column, text);
            info!("added item to {column}");
        }
        self.render()
    }

    pub fn is_input_open(&self, column: ColumnId) -> bool {
        self.input_open[column.index()]
    }

    pub fn show_input_box(&mut self, column: ColumnId) {
        self.input_open[column.index()] = true;
    }

    /// Close the add box and submit whatever is pending.
    pub fn hide_input_box(&mut self, column: ColumnId) -> Result<(), StorageError> {
        self.input_open[column.index()] = false;
        self.append_item(column)
    }

    /// Close the add box without submitting. Pending text is kept.
    pub fn cancel_input_box(&mut self, column: ColumnId) {
        self.input_open[column.index()] = false;
    }

    /// Replace every sequence with its container's current child text, then settle.
    pub fn rebuild_from_visual_order(&mut self) -> Result<(), StorageError> {
        for col in ColumnId::ALL {
            self.board.replace(col, self.tree.children_text(col));
        }
        self.render()
    }

    /// Pick up `node`. A drag already in progress is replaced.
    pub fn drag_start(&mut self, node: NodeId) {
        if self.tree.node(node).is_some_and(|n| n.draggable) {
            self.drag = DragState::Dragging { node, target: None };
        }
    }

    /// The pointer entered `column`: highlight it and make it the drop target.
    pub fn drag_enter(&mut self, column: ColumnId) {
        if let DragState::Dragging { target, .. } = &mut self.drag {
            self.tree.set_candidate(column, true);
            *target = Some(column);
        }
    }

    /// The pointer left `column`. Only the highlight is cleared.
    pub fn drag_leave(&mut self, column: ColumnId) {
        self.tree.set_candidate(column, false);
    }

    /// Drop the dragged node at the end of the last entered column and
    /// rebuild the board from the tree. Returns whether a drop happened.
    pub fn drop_dragged(&mut self) -> Result<bool, StorageError> {
        let (node, target) = match self.drag {
            DragState::Dragging { node, target: Some(target) } => (node, target),
            _ => return Ok(false),
        };
        self.tree.clear_candidates();
        self.tree.append_child(target, node);
        self.drag = DragState::Idle;
        info!("dropped item into {target}");
        self.rebuild_from_visual_order()?;
        Ok(true)
    }

    /// Move an item to the end of another column through the drag pipeline.
    /// Returns false if there is no item at `index`.
    pub fn move_item(&mut self, from: ColumnId, index: usize, to: ColumnId) -> Result<bool, StorageError> {
        let node = match self.tree.child_at(from, index) {
            Some(node) => node,
            None => return Ok(false),
        };
        self.drag_start(node);
        self.drag_enter(from);
        self.drag_leave(from);
        self.drag_enter(to);
        self.drop_dragged()
    }

    /// Wipe the store and reseed the placeholders.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.store.clear()?;
        self.board = Board::with_placeholders();
        self.drag = DragState::Idle;
        self.tree.clear_candidates();
        info!("board reset to placeholders");
        self.render()
    }
}
