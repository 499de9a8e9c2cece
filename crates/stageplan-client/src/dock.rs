use stageplan_common::ItemId;

/// Assigns stacking slots to minimized detail panels.
pub trait StackingService {
    /// Dock `id` and return its slot. Docking an already docked panel keeps
    /// its slot.
    fn push(&mut self, id: ItemId) -> usize;

    /// Undock `id`. Returns whether it was docked.
    fn remove(&mut self, id: ItemId) -> bool;

    fn slot_of(&self, id: ItemId) -> Option<usize>;

    /// Docked panels in slot order
    fn entries(&self) -> Vec<ItemId>;
}

/// Slots are kept compact: undocking a panel shifts every later panel down
/// by one.
#[derive(Debug, Default)]
pub struct DockStack {
    slots: Vec<ItemId>,
    capacity: Option<usize>,
}

impl DockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack holding at most `capacity` panels; docking past it evicts the
    /// oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity: Some(capacity.max(1)),
        }
    }
}

impl StackingService for DockStack {
    fn push(&mut self, id: ItemId) -> usize {
        if let Some(slot) = self.slot_of(id) {
            return slot;
        }
        if let Some(capacity) = self.capacity {
            while self.slots.len() >= capacity {
                let evicted = self.slots.remove(0);
                tracing::debug!(item_id = evicted, "dock full, evicted oldest panel");
            }
        }
        self.slots.push(id);
        self.slots.len() - 1
    }

    fn remove(&mut self, id: ItemId) -> bool {
        match self.slot_of(id) {
            Some(slot) => {
                self.slots.remove(slot);
                true
            }
            None => false,
        }
    }

    fn slot_of(&self, id: ItemId) -> Option<usize> {
        self.slots.iter().position(|&docked| docked == id)
    }

    fn entries(&self) -> Vec<ItemId> {
        self.slots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_compact_on_remove() {
        let mut dock = DockStack::new();
        assert_eq!(dock.push(10), 0);
        assert_eq!(dock.push(20), 1);
        assert_eq!(dock.push(30), 2);

        assert!(dock.remove(20));
        assert_eq!(dock.slot_of(30), Some(1));
        assert_eq!(dock.entries(), vec![10, 30]);
        assert!(!dock.remove(20));
    }

    #[test]
    fn test_push_is_idempotent() {
        let mut dock = DockStack::new();
        dock.push(1);
        dock.push(2);
        assert_eq!(dock.push(1), 0);
        assert_eq!(dock.entries().len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut dock = DockStack::with_capacity(2);
        dock.push(1);
        dock.push(2);
        assert_eq!(dock.push(3), 1);
        assert_eq!(dock.entries(), vec![2, 3]);
        assert_eq!(dock.slot_of(1), None);
    }
}
