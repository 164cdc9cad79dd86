//! In-memory visual tree: the surface the terminal renderer draws.
//!
//! Each column has one container holding an ordered list of item nodes. After
//! a drag, the container order is the ground truth the board is rebuilt from.

use super::ColumnId;

/// Arena handle for a node. Freed slots are reused under a new generation,
/// so a handle held across a render resolves to nothing rather than to a
/// different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: usize,
    generation: u32,
}

/// A single rendered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub text: String,
    /// Column the node was rendered into. Not updated when the node is dragged.
    pub column: ColumnId,
    /// Index the node was rendered at. Not updated when the node is dragged.
    pub index: usize,
    pub editable: bool,
    pub draggable: bool,
}

#[derive(Debug, Clone, Default)]
struct Container {
    children: Vec<NodeId>,
    /// Highlighted as a drop candidate.
    candidate: bool,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    containers: [Container; 4],
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached, editable, draggable node tagged with its column and index.
    pub fn create_node(&mut self, text: impl Into<String>, column: ColumnId, index: usize) -> NodeId {
        let node = Node {
            text: text.into(),
            column,
            index,
            editable: true,
            draggable: true,
        };
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let entry = &mut self.slots[slot];
        entry.node = Some(node);
        NodeId {
            slot,
            generation: entry.generation,
        }
    }

    /// Remove every child of `column` and free the nodes.
    pub fn clear_children(&mut self, column: ColumnId) {
        let children = std::mem::take(&mut self.containers[column.index()].children);
        for id in children {
            self.free_node(id);
        }
    }

    fn free_node(&mut self, id: NodeId) {
        let Some(entry) = self.slots.get_mut(id.slot) else {
            return;
        };
        if entry.generation != id.generation || entry.node.is_none() {
            return;
        }
        entry.node = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
    }

    /// Slots allocated in the arena, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Append `node` as the last child of `column`, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, column: ColumnId, node: NodeId) {
        if self.node(node).is_none() {
            return;
        }
        for container in self.containers.iter_mut() {
            container.children.retain(|&c| c != node);
        }
        self.containers[column.index()].children.push(node);
    }

    pub fn children(&self, column: ColumnId) -> &[NodeId] {
        &self.containers[column.index()].children
    }

    pub fn child_at(&self, column: ColumnId, position: usize) -> Option<NodeId> {
        self.children(column).get(position).copied()
    }

    /// Text of every child of `column`, in child order.
    pub fn children_text(&self, column: ColumnId) -> Vec<String> {
        self.children(column)
            .iter()
            .filter_map(|&id| self.node(id))
            .map(|n| n.text.clone())
            .collect()
    }

    /// Column whose container currently holds `node`.
    pub fn parent_of(&self, node: NodeId) -> Option<ColumnId> {
        ColumnId::ALL
            .into_iter()
            .find(|col| self.children(*col).contains(&node))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.slot)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.slot)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())
    }

    pub fn set_candidate(&mut self, column: ColumnId, candidate: bool) {
        self.containers[column.index()].candidate = candidate;
    }

    pub fn is_candidate(&self, column: ColumnId) -> bool {
        self.containers[column.index()].candidate
    }

    pub fn clear_candidates(&mut self) {
        for container in self.containers.iter_mut() {
            container.candidate = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(backlog: &[&str], progress: &[&str]) -> NodeTree {
        let mut tree = NodeTree::new();
        for (i, text) in backlog.iter().enumerate() {
            let id = tree.create_node(*text, ColumnId::Backlog, i);
            tree.append_child(ColumnId::Backlog, id);
        }
        for (i, text) in progress.iter().enumerate() {
            let id = tree.create_node(*text, ColumnId::Progress, i);
            tree.append_child(ColumnId::Progress, id);
        }
        tree
    }

    #[test]
    fn created_node_carries_tags() {
        let mut tree = NodeTree::new();
        let id = tree.create_node("x", ColumnId::Complete, 3);
        let node = tree.node(id).unwrap();
        assert_eq!(node.column, ColumnId::Complete);
        assert_eq!(node.index, 3);
        assert!(node.editable && node.draggable);
        assert!(ColumnId::ALL.iter().all(|&c| tree.children(c).is_empty()));
    }

    #[test]
    fn append_child_moves_between_containers() {
        let mut tree = tree_with(&["x", "y"], &["z"]);
        let y = tree.child_at(ColumnId::Backlog, 1).unwrap();
        tree.append_child(ColumnId::Progress, y);
        assert_eq!(tree.children_text(ColumnId::Backlog), vec!["x"]);
        assert_eq!(tree.children_text(ColumnId::Progress), vec!["z", "y"]);
        assert_eq!(tree.parent_of(y), Some(ColumnId::Progress));
    }

    #[test]
    fn append_child_to_same_container_moves_to_end() {
        let mut tree = tree_with(&["a", "b", "c"], &[]);
        let a = tree.child_at(ColumnId::Backlog, 0).unwrap();
        tree.append_child(ColumnId::Backlog, a);
        assert_eq!(tree.children_text(ColumnId::Backlog), vec!["b", "c", "a"]);
        assert_eq!(tree.child_at(ColumnId::Backlog, 2), Some(a));
    }

    #[test]
    fn clear_children_frees_nodes() {
        let mut tree = tree_with(&["a"], &["b"]);
        let a = tree.child_at(ColumnId::Backlog, 0).unwrap();
        let b = tree.child_at(ColumnId::Progress, 0).unwrap();
        tree.clear_children(ColumnId::Backlog);
        assert!(tree.children(ColumnId::Backlog).is_empty());
        assert!(tree.node(a).is_none());
        assert_eq!(tree.node(b).unwrap().text, "b");
    }

    #[test]
    fn append_of_freed_node_is_ignored() {
        let mut tree = tree_with(&["a"], &[]);
        let a = tree.child_at(ColumnId::Backlog, 0).unwrap();
        tree.clear_children(ColumnId::Backlog);
        tree.append_child(ColumnId::Progress, a);
        assert!(tree.children(ColumnId::Progress).is_empty());
    }

    #[test]
    fn freed_slots_are_reused_and_stale_handles_miss() {
        let mut tree = tree_with(&["a", "b"], &[]);
        let a = tree.child_at(ColumnId::Backlog, 0).unwrap();
        tree.clear_children(ColumnId::Backlog);

        let c = tree.create_node("c", ColumnId::Backlog, 0);
        let d = tree.create_node("d", ColumnId::Backlog, 1);
        assert_eq!(tree.slot_count(), 2);
        assert_ne!(c, a);
        assert_ne!(d, a);
        assert!(tree.node(a).is_none());
        assert!(tree.node_mut(a).is_none());
        assert_eq!(tree.node(c).unwrap().text, "c");

        tree.append_child(ColumnId::Backlog, a);
        assert!(tree.children(ColumnId::Backlog).is_empty());
    }

    #[test]
    fn candidate_flags_toggle_and_clear() {
        let mut tree = NodeTree::new();
        tree.set_candidate(ColumnId::Complete, true);
        tree.set_candidate(ColumnId::OnHold, true);
        assert!(tree.is_candidate(ColumnId::Complete));
        tree.set_candidate(ColumnId::Complete, false);
        assert!(!tree.is_candidate(ColumnId::Complete));
        tree.clear_candidates();
        assert!(!tree.is_candidate(ColumnId::OnHold));
    }

    #[test]
    fn edited_text_shows_in_children_text() {
        let mut tree = tree_with(&["old"], &[]);
        let id = tree.child_at(ColumnId::Backlog, 0).unwrap();
        tree.node_mut(id).unwrap().text = "new".into();
        assert_eq!(tree.children_text(ColumnId::Backlog), vec!["new"]);
    }
}
