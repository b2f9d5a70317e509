//! Active op selection

use std::collections::BTreeSet;

use crate::id::OpId;

/// Ops currently selected in the feature tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ops: BTreeSet<OpId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: OpId) {
        self.ops.insert(id);
    }

    /// Replace the selection with a single op
    pub fn select_only(&mut self, id: OpId) {
        self.ops.clear();
        self.ops.insert(id);
    }

    pub fn deselect(&mut self, id: OpId) -> bool {
        self.ops.remove(&id)
    }

    pub fn toggle(&mut self, id: OpId) {
        if !self.ops.remove(&id) {
            self.ops.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn contains(&self, id: OpId) -> bool {
        self.ops.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = OpId> + '_ {
        self.ops.iter().copied()
    }

    /// Drop every selected op that `keep` rejects
    pub fn retain(&mut self, mut keep: impl FnMut(OpId) -> bool) {
        self.ops.retain(|id| keep(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_select_only() {
        let (a, b) = (OpId::new(), OpId::new());
        let mut selection = Selection::new();

        selection.select(a);
        selection.toggle(b);
        assert_eq!(selection.len(), 2);

        selection.toggle(a);
        assert!(!selection.contains(a));

        selection.select_only(a);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_retain() {
        let (a, b) = (OpId::new(), OpId::new());
        let mut selection = Selection::new();
        selection.select(a);
        selection.select(b);
        selection.retain(|id| id != b);
        assert!(selection.contains(a));
        assert!(!selection.contains(b));
    }
}
